pub mod api;
pub mod data_sources;
pub mod logging;
pub mod provider_data;

pub use provider_data::ChuckNorrisProviderData;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tfplug::context::Context;
use tfplug::data_source::DataSourceWithConfigure;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, Provider,
    ProviderMetadataRequest, ProviderMetadataResponse, ProviderSchemaRequest,
    ProviderSchemaResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::NumberRangeValidator;

pub const PROVIDER_TYPE_NAME: &str = "chucknorris";

pub const ENDPOINT_ENV: &str = "CHUCKNORRIS_ENDPOINT";
pub const TIMEOUT_ENV: &str = "CHUCKNORRIS_TIMEOUT";
pub const MAX_RESPONSE_BYTES_ENV: &str = "CHUCKNORRIS_MAX_RESPONSE_BYTES";

const MIN_TIMEOUT_SECONDS: f64 = 1.0;

pub struct ChuckNorrisProvider {
    client: Option<api::Client>,
}

impl Default for ChuckNorrisProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ChuckNorrisProvider {
    pub fn new() -> Self {
        Self { client: None }
    }

    /// The shared client, once the provider has been configured
    pub fn client(&self) -> Option<&api::Client> {
        self.client.as_ref()
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Interact with the chucknorris.io joke API")
            .attribute(
                AttributeBuilder::new("endpoint", AttributeType::String)
                    .description(
                        "Base URL of the joke API. May also be set with CHUCKNORRIS_ENDPOINT.",
                    )
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("timeout_seconds", AttributeType::Number)
                    .description(
                        "Request timeout in seconds. May also be set with CHUCKNORRIS_TIMEOUT.",
                    )
                    .optional()
                    .validator(NumberRangeValidator::at_least(MIN_TIMEOUT_SECONDS))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("max_response_bytes", AttributeType::Number)
                    .description("Largest accepted response body. May also be set with CHUCKNORRIS_MAX_RESPONSE_BYTES.")
                    .optional()
                    .validator(NumberRangeValidator::at_least(1.0))
                    .build(),
            )
            .build()
    }

    /// Resolve the client settings: provider config, then environment, then
    /// defaults. Returns `None` when any diagnostic was produced.
    fn resolve_client_config(
        config: &DynamicValue,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<api::ClientConfig> {
        let mut client_config = api::ClientConfig::default();

        match string_setting(config, "endpoint", ENDPOINT_ENV) {
            Ok(Some(endpoint)) => client_config.endpoint = endpoint,
            Ok(None) => {}
            Err(diag) => diagnostics.push(diag),
        }

        match number_setting(config, "timeout_seconds", TIMEOUT_ENV) {
            Ok(Some(seconds)) => match Duration::try_from_secs_f64(seconds) {
                Ok(timeout) if seconds >= MIN_TIMEOUT_SECONDS => client_config.timeout = timeout,
                _ => diagnostics.push(
                    Diagnostic::error(
                        "Invalid timeout_seconds",
                        format!(
                            "timeout_seconds must be at least {}, got {}",
                            MIN_TIMEOUT_SECONDS, seconds
                        ),
                    )
                    .with_attribute(AttributePath::new("timeout_seconds")),
                ),
            },
            Ok(None) => {}
            Err(diag) => diagnostics.push(diag),
        }

        match number_setting(config, "max_response_bytes", MAX_RESPONSE_BYTES_ENV) {
            Ok(Some(bytes)) if bytes >= 1.0 && bytes.fract() == 0.0 && bytes <= usize::MAX as f64 => {
                client_config.max_response_bytes = bytes as usize;
            }
            Ok(Some(bytes)) => diagnostics.push(
                Diagnostic::error(
                    "Invalid max_response_bytes",
                    format!("max_response_bytes must be a positive whole number, got {}", bytes),
                )
                .with_attribute(AttributePath::new("max_response_bytes")),
            ),
            Ok(None) => {}
            Err(diag) => diagnostics.push(diag),
        }

        if diagnostics.is_empty() {
            Some(client_config)
        } else {
            None
        }
    }
}

fn env_setting(env: &str) -> Option<String> {
    std::env::var(env).ok().filter(|v| !v.trim().is_empty())
}

fn string_setting(config: &DynamicValue, name: &str, env: &str) -> Result<Option<String>, Diagnostic> {
    let path = AttributePath::new(name);
    match config.get_optional_string(&path) {
        Ok(Some(value)) => Ok(Some(value)),
        Ok(None) => Ok(env_setting(env)),
        Err(e) => Err(Diagnostic::error(format!("Invalid {}", name), e.to_string()).with_attribute(path)),
    }
}

fn number_setting(config: &DynamicValue, name: &str, env: &str) -> Result<Option<f64>, Diagnostic> {
    let path = AttributePath::new(name);
    match config.get_optional_number(&path) {
        Ok(Some(value)) => Ok(Some(value)),
        Ok(None) => match env_setting(env) {
            Some(raw) => raw.trim().parse::<f64>().map(Some).map_err(|e| {
                Diagnostic::error(
                    format!("Invalid {}", env),
                    format!("{} must be a number, got {:?}: {}", env, raw, e),
                )
                .with_attribute(path)
            }),
            None => Ok(None),
        },
        Err(e) => Err(Diagnostic::error(format!("Invalid {}", name), e.to_string()).with_attribute(path)),
    }
}

#[async_trait]
impl Provider for ChuckNorrisProvider {
    fn type_name(&self) -> &str {
        PROVIDER_TYPE_NAME
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: PROVIDER_TYPE_NAME.to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ProviderSchemaRequest,
    ) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: Self::schema_static(),
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let mut diagnostics = vec![];

        let Some(client_config) = Self::resolve_client_config(&request.config, &mut diagnostics)
        else {
            return ConfigureProviderResponse {
                diagnostics,
                provider_data: None,
            };
        };

        tracing::debug!(
            endpoint = %client_config.endpoint,
            timeout = ?client_config.timeout,
            max_response_bytes = client_config.max_response_bytes,
            terraform_version = %request.terraform_version,
            "configuring chucknorris provider"
        );

        match api::Client::new(&client_config) {
            Ok(client) => {
                self.client = Some(client.clone());
                ConfigureProviderResponse {
                    diagnostics,
                    provider_data: Some(Arc::new(ChuckNorrisProviderData::new(client))),
                }
            }
            Err(e) => {
                diagnostics.push(
                    Diagnostic::error("Failed to create API client", e.to_string())
                        .with_attribute(AttributePath::new("endpoint")),
                );
                ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                }
            }
        }
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        let mut factories: HashMap<String, DataSourceFactory> = HashMap::new();
        factories.insert(
            data_sources::joke::TYPE_NAME.to_string(),
            Box::new(|| {
                Box::new(data_sources::JokeDataSource::new()) as Box<dyn DataSourceWithConfigure>
            }),
        );
        factories
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tfplug::types::{has_errors, Dynamic};

    fn clear_env() {
        std::env::remove_var(ENDPOINT_ENV);
        std::env::remove_var(TIMEOUT_ENV);
        std::env::remove_var(MAX_RESPONSE_BYTES_ENV);
    }

    fn configure_request(config: DynamicValue) -> ConfigureProviderRequest {
        ConfigureProviderRequest {
            terraform_version: "1.9.0".to_string(),
            config,
        }
    }

    #[tokio::test]
    #[serial]
    async fn provider_configures_with_defaults() {
        clear_env();

        let mut provider = ChuckNorrisProvider::new();
        let response = provider
            .configure(Context::new(), configure_request(DynamicValue::object()))
            .await;

        assert!(response.diagnostics.is_empty());
        assert!(response.provider_data.is_some());
        let client = provider.client().unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.chucknorris.io/");
        assert_eq!(client.timeout(), api::DEFAULT_TIMEOUT);
        assert_eq!(client.max_response_bytes(), api::DEFAULT_MAX_RESPONSE_BYTES);
    }

    #[tokio::test]
    #[serial]
    async fn provider_configures_from_env_vars() {
        clear_env();
        std::env::set_var(ENDPOINT_ENV, "http://localhost:8080/");
        std::env::set_var(TIMEOUT_ENV, "5");
        std::env::set_var(MAX_RESPONSE_BYTES_ENV, "2048");

        let mut provider = ChuckNorrisProvider::new();
        let response = provider
            .configure(Context::new(), configure_request(DynamicValue::object()))
            .await;

        assert!(response.diagnostics.is_empty());
        let client = provider.client().unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8080/");
        assert_eq!(client.timeout(), Duration::from_secs(5));
        assert_eq!(client.max_response_bytes(), 2048);

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn provider_config_wins_over_env_vars() {
        clear_env();
        std::env::set_var(ENDPOINT_ENV, "http://from-env:8080/");
        std::env::set_var(TIMEOUT_ENV, "5");
        std::env::set_var(MAX_RESPONSE_BYTES_ENV, "2048");

        let mut config = DynamicValue::object();
        config
            .set_string(&AttributePath::new("endpoint"), "http://from-config:9090/")
            .unwrap();
        config
            .set(&AttributePath::new("timeout_seconds"), Dynamic::Number(12.5))
            .unwrap();
        config
            .set(&AttributePath::new("max_response_bytes"), Dynamic::Number(4096.0))
            .unwrap();

        let mut provider = ChuckNorrisProvider::new();
        let response = provider
            .configure(Context::new(), configure_request(config))
            .await;

        assert!(response.diagnostics.is_empty());
        let client = provider.client().unwrap();
        assert_eq!(client.base_url().as_str(), "http://from-config:9090/");
        assert_eq!(client.timeout(), Duration::from_millis(12_500));
        assert_eq!(client.max_response_bytes(), 4096);

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn provider_configure_rejects_unparsable_env_timeout() {
        clear_env();
        std::env::set_var(TIMEOUT_ENV, "soon");

        let mut provider = ChuckNorrisProvider::new();
        let response = provider
            .configure(Context::new(), configure_request(DynamicValue::object()))
            .await;

        assert!(has_errors(&response.diagnostics));
        assert!(response.diagnostics[0].summary.contains(TIMEOUT_ENV));
        assert!(response.provider_data.is_none());
        assert!(provider.client().is_none());

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn env_timeout_is_bounded_like_config_timeout() {
        clear_env();
        std::env::set_var(TIMEOUT_ENV, "0.5");

        let mut provider = ChuckNorrisProvider::new();
        let from_env = provider
            .configure(Context::new(), configure_request(DynamicValue::object()))
            .await;

        clear_env();
        let mut config = DynamicValue::object();
        config
            .set(&AttributePath::new("timeout_seconds"), Dynamic::Number(0.5))
            .unwrap();
        let schema_diagnostics = ChuckNorrisProvider::schema_static().validate_config(&config);
        let from_config = provider
            .configure(Context::new(), configure_request(config))
            .await;

        assert!(has_errors(&schema_diagnostics));
        for response in [from_env, from_config] {
            assert_eq!(response.diagnostics.len(), 1);
            assert_eq!(response.diagnostics[0].summary, "Invalid timeout_seconds");
            assert!(response.provider_data.is_none());
        }
        assert!(provider.client().is_none());
    }

    #[tokio::test]
    #[serial]
    async fn provider_configure_rejects_bad_values() {
        clear_env();

        let mut config = DynamicValue::object();
        config
            .set(&AttributePath::new("timeout_seconds"), Dynamic::Number(-1.0))
            .unwrap();
        config
            .set(&AttributePath::new("max_response_bytes"), Dynamic::Number(1.5))
            .unwrap();

        let mut provider = ChuckNorrisProvider::new();
        let response = provider
            .configure(Context::new(), configure_request(config))
            .await;

        let summaries: Vec<_> = response
            .diagnostics
            .iter()
            .map(|d| d.summary.as_str())
            .collect();
        assert_eq!(
            summaries,
            vec!["Invalid timeout_seconds", "Invalid max_response_bytes"]
        );
        assert!(response.provider_data.is_none());
    }

    #[tokio::test]
    #[serial]
    async fn provider_configure_rejects_invalid_endpoint() {
        clear_env();

        let mut config = DynamicValue::object();
        config
            .set_string(&AttributePath::new("endpoint"), "not a url")
            .unwrap();

        let mut provider = ChuckNorrisProvider::new();
        let response = provider
            .configure(Context::new(), configure_request(config))
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Failed to create API client");
        assert_eq!(
            response.diagnostics[0].attribute,
            Some(AttributePath::new("endpoint"))
        );
        assert!(provider.client().is_none());
    }

    #[test]
    fn provider_serves_joke_data_source() {
        let provider = ChuckNorrisProvider::new();
        let data_sources = provider.data_sources();

        assert_eq!(data_sources.len(), 1);
        let factory = data_sources.get("chucknorris_joke").unwrap();
        assert_eq!(factory().type_name(), "chucknorris_joke");
    }

    #[test]
    fn provider_schema_attributes_are_optional() {
        let schema = ChuckNorrisProvider::schema_static();
        for name in ["endpoint", "timeout_seconds", "max_response_bytes"] {
            let attr = schema.attribute(name).unwrap();
            assert!(attr.optional && !attr.required && !attr.computed);
        }
    }
}
