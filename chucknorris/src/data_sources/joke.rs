//! Joke data source implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
    ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::StringLengthValidator;

use crate::api::joke::check_joke_id;
use crate::api::{JokeRecord, LookupError};
use crate::ChuckNorrisProviderData;

pub const TYPE_NAME: &str = "chucknorris_joke";

#[derive(Default)]
pub struct JokeDataSource {
    provider_data: Option<ChuckNorrisProviderData>,
}

impl JokeDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider_data(provider_data: ChuckNorrisProviderData) -> Self {
        Self {
            provider_data: Some(provider_data),
        }
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Fetches a single joke from api.chucknorris.io by its ID")
            .attribute(
                AttributeBuilder::new("joke_id", AttributeType::String)
                    .description("ID of the joke to fetch")
                    .required()
                    .validator(StringLengthValidator::at_least(1))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("The joke ID as reported by the API")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("value", AttributeType::String)
                    .description("The joke text")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("url", AttributeType::String)
                    .description("Canonical URL of the joke")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("icon_url", AttributeType::String)
                    .description("URL of the joke's icon")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("created_at", AttributeType::String)
                    .description("Creation timestamp, as provided by the API")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("updated_at", AttributeType::String)
                    .description("Last update timestamp, as provided by the API")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "categories",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .description("Categories the joke is tagged with")
                .optional()
                .computed()
                .build(),
            )
            .build()
    }

    async fn lookup(&self, ctx: &Context, joke_id: &str) -> Result<JokeRecord, LookupError> {
        let provider_data = self.provider_data.as_ref().ok_or_else(|| {
            LookupError::Configuration(
                "the provider must be configured before chucknorris_joke can be read".to_string(),
            )
        })?;

        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(LookupError::Cancelled),
            result = provider_data.client.lookup_joke(joke_id) => result,
        }
    }
}

/// Map a joke onto the data source state, echoing the configured joke_id
pub fn joke_to_state(joke_id: &str, joke: JokeRecord) -> tfplug::Result<DynamicValue> {
    let mut state = DynamicValue::object();
    state.set_string(&AttributePath::new("joke_id"), joke_id)?;
    state.set_string(&AttributePath::new("id"), joke.id)?;
    state.set_string(&AttributePath::new("value"), joke.value)?;
    state.set_string(&AttributePath::new("url"), joke.url)?;
    state.set_string(&AttributePath::new("icon_url"), joke.icon_url)?;
    state.set_string(&AttributePath::new("created_at"), joke.created_at)?;
    state.set_string(&AttributePath::new("updated_at"), joke.updated_at)?;
    state.set(
        &AttributePath::new("categories"),
        Dynamic::from(joke.categories),
    )?;
    Ok(state)
}

#[async_trait]
impl DataSource for JokeDataSource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    async fn metadata(
        &self,
        _ctx: Context,
        request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: format!("{}_joke", request.provider_type_name),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        DataSourceSchemaResponse {
            schema: Self::schema_static(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        let mut diagnostics = vec![];
        let joke_id_path = AttributePath::new("joke_id");

        // Schema checks have already run; only the ID's shape is left.
        if let Ok(Some(joke_id)) = request.config.get_optional_string(&joke_id_path) {
            if let Err(e) = check_joke_id(&joke_id) {
                diagnostics.push(
                    Diagnostic::error(e.summary(), format!("joke_id {:?}: {}", joke_id, e))
                        .with_attribute(joke_id_path),
                );
            }
        }

        ValidateDataSourceConfigResponse { diagnostics }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let joke_id_path = AttributePath::new("joke_id");

        let joke_id = match request.config.get_string(&joke_id_path) {
            Ok(joke_id) => joke_id,
            Err(e) => {
                return ReadDataSourceResponse::failed(vec![Diagnostic::error(
                    "Invalid joke_id",
                    e.to_string(),
                )
                .with_attribute(joke_id_path)]);
            }
        };

        tracing::debug!(joke_id = %joke_id, "reading joke data source");

        let joke = match self.lookup(&ctx, &joke_id).await {
            Ok(joke) => joke,
            Err(e) => {
                tracing::warn!(joke_id = %joke_id, error = %e, "joke lookup failed");
                return ReadDataSourceResponse::failed(vec![Diagnostic::error(
                    e.summary(),
                    format!("joke_id {:?}: {}", joke_id, e),
                )
                .with_attribute(joke_id_path)]);
            }
        };

        match joke_to_state(&joke_id, joke) {
            Ok(state) => {
                tracing::debug!(joke_id = %joke_id, "joke data source read");
                ReadDataSourceResponse {
                    state,
                    diagnostics: vec![],
                }
            }
            Err(e) => ReadDataSourceResponse::failed(vec![Diagnostic::error(
                "Failed to build joke state",
                e.to_string(),
            )]),
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for JokeDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let mut diagnostics = vec![];

        // Terraform may configure data sources before the provider itself;
        // read reports the missing client if that is still the case.
        let Some(data) = request.provider_data else {
            tracing::debug!("no provider data yet for joke data source");
            return ConfigureDataSourceResponse { diagnostics };
        };

        match data.downcast_ref::<ChuckNorrisProviderData>() {
            Some(provider_data) => {
                self.provider_data = Some(provider_data.clone());
            }
            None => {
                tracing::error!("provider data is not ChuckNorrisProviderData");
                diagnostics.push(Diagnostic::error(
                    "Invalid provider data",
                    "Failed to extract ChuckNorrisProviderData from provider data",
                ));
            }
        }

        ConfigureDataSourceResponse { diagnostics }
    }
}
