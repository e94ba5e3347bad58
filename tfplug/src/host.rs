//! In-process provider host
//!
//! [`ProviderHost`] drives a [`Provider`] through the same sequence Terraform
//! core uses for data sources: fetch schemas, configure the provider once,
//! validate data source configuration during plan, and read. Configuration and
//! state cross this boundary msgpack-encoded, exactly as on the wire.

use crate::context::Context;
use crate::data_source::{
    ConfigureDataSourceRequest, DataSourceMetadataRequest, DataSourceSchemaRequest,
    DataSourceWithConfigure, ReadDataSourceRequest, ValidateDataSourceConfigRequest,
};
use crate::provider::{
    ConfigureProviderRequest, Provider, ProviderData, ProviderMetadataRequest,
    ProviderSchemaRequest,
};
use crate::schema::Schema;
use crate::types::{has_errors, Diagnostic, DynamicValue};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Schemas of the provider and every data source it serves
pub struct ProviderSchemas {
    pub provider: Schema,
    pub data_sources: HashMap<String, Schema>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of a data source read; `state` is msgpack, absent on failure
pub struct ReadDataSourceResult {
    pub state: Option<Vec<u8>>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ProviderHost<P: Provider> {
    provider: RwLock<P>,
    provider_data: RwLock<Option<ProviderData>>,
    root: Context,
}

impl<P: Provider> ProviderHost<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider: RwLock::new(provider),
            provider_data: RwLock::new(None),
            root: Context::new(),
        }
    }

    pub async fn get_provider_schema(&self) -> ProviderSchemas {
        let provider = self.provider.read().await;
        let response = provider
            .schema(self.root.clone(), ProviderSchemaRequest)
            .await;
        let mut diagnostics = response.diagnostics;

        let mut data_sources = HashMap::new();
        for (type_name, factory) in provider.data_sources() {
            let data_source = factory();
            if data_source.type_name() != type_name {
                diagnostics.push(Diagnostic::error(
                    "Data source type name mismatch",
                    format!(
                        "factory registered as {} produced {}",
                        type_name,
                        data_source.type_name()
                    ),
                ));
                continue;
            }
            let schema = data_source
                .schema(self.root.clone(), DataSourceSchemaRequest)
                .await;
            diagnostics.extend(schema.diagnostics);
            data_sources.insert(type_name, schema.schema);
        }

        ProviderSchemas {
            provider: response.schema,
            data_sources,
            diagnostics,
        }
    }

    /// Data source type names as reported by their own metadata
    pub async fn data_source_type_names(&self) -> Vec<String> {
        let provider = self.provider.read().await;
        let provider_type_name = provider
            .metadata(self.root.clone(), ProviderMetadataRequest)
            .await
            .type_name;

        let mut names = Vec::new();
        for factory in provider.data_sources().into_values() {
            let metadata = factory()
                .metadata(
                    self.root.clone(),
                    DataSourceMetadataRequest {
                        provider_type_name: provider_type_name.clone(),
                    },
                )
                .await;
            names.push(metadata.type_name);
        }
        names.sort();
        names
    }

    pub async fn configure_provider(&self, terraform_version: &str, config: &[u8]) -> Vec<Diagnostic> {
        let config = match DynamicValue::decode_msgpack(config) {
            Ok(config) => config,
            Err(e) => {
                return vec![Diagnostic::error(
                    "Invalid provider configuration",
                    e.to_string(),
                )]
            }
        };

        let mut provider = self.provider.write().await;
        let schema = provider
            .schema(self.root.clone(), ProviderSchemaRequest)
            .await
            .schema;
        let mut diagnostics = schema.validate_config(&config);
        if has_errors(&diagnostics) {
            return diagnostics;
        }

        tracing::debug!(provider = provider.type_name(), "configuring provider");
        let response = provider
            .configure(
                self.root.clone(),
                ConfigureProviderRequest {
                    terraform_version: terraform_version.to_string(),
                    config,
                },
            )
            .await;
        diagnostics.extend(response.diagnostics);

        if !has_errors(&diagnostics) {
            *self.provider_data.write().await = response.provider_data;
        }

        diagnostics
    }

    pub async fn validate_data_resource_config(
        &self,
        type_name: &str,
        config: &[u8],
    ) -> Vec<Diagnostic> {
        let (data_source, config) = match self.prepare(type_name, config).await {
            Ok(prepared) => prepared,
            Err(diagnostics) => return diagnostics,
        };

        let schema = data_source
            .schema(self.root.clone(), DataSourceSchemaRequest)
            .await
            .schema;
        let mut diagnostics = schema.validate_config(&config);
        if has_errors(&diagnostics) {
            return diagnostics;
        }

        let response = data_source
            .validate(
                self.root.clone(),
                ValidateDataSourceConfigRequest {
                    type_name: type_name.to_string(),
                    config,
                },
            )
            .await;
        diagnostics.extend(response.diagnostics);
        diagnostics
    }

    pub async fn read_data_source(&self, type_name: &str, config: &[u8]) -> ReadDataSourceResult {
        self.read_data_source_with_context(self.root.clone(), type_name, config)
            .await
    }

    /// Read with a caller-supplied context, e.g. one carrying a deadline
    pub async fn read_data_source_with_context(
        &self,
        ctx: Context,
        type_name: &str,
        config: &[u8],
    ) -> ReadDataSourceResult {
        let failed = |diagnostics: Vec<Diagnostic>| ReadDataSourceResult {
            state: None,
            diagnostics,
        };

        let (mut data_source, config) = match self.prepare(type_name, config).await {
            Ok(prepared) => prepared,
            Err(diagnostics) => return failed(diagnostics),
        };

        let schema = data_source
            .schema(ctx.clone(), DataSourceSchemaRequest)
            .await
            .schema;
        let mut diagnostics = schema.validate_config(&config);
        if has_errors(&diagnostics) {
            return failed(diagnostics);
        }

        let provider_data = self.provider_data.read().await.clone();
        let configured = data_source
            .configure(ctx.clone(), ConfigureDataSourceRequest { provider_data })
            .await;
        diagnostics.extend(configured.diagnostics);
        if has_errors(&diagnostics) {
            return failed(diagnostics);
        }

        tracing::debug!(type_name, "reading data source");
        let response = data_source
            .read(
                ctx,
                ReadDataSourceRequest {
                    type_name: type_name.to_string(),
                    config,
                },
            )
            .await;
        diagnostics.extend(response.diagnostics);

        if has_errors(&diagnostics) {
            return failed(diagnostics);
        }

        match response.state.encode_msgpack() {
            Ok(state) => ReadDataSourceResult {
                state: Some(state),
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to encode state", e.to_string()));
                failed(diagnostics)
            }
        }
    }

    /// Terraform asked the provider to stop: cancel every in-flight call
    pub fn stop_provider(&self) {
        tracing::debug!("stopping provider");
        self.root.cancel();
    }

    async fn prepare(
        &self,
        type_name: &str,
        config: &[u8],
    ) -> Result<(Box<dyn DataSourceWithConfigure>, DynamicValue), Vec<Diagnostic>> {
        let factory = self
            .provider
            .read()
            .await
            .data_sources()
            .remove(type_name)
            .ok_or_else(|| {
                vec![Diagnostic::error(
                    "Unknown data source",
                    crate::TfplugError::DataSourceNotFound(type_name.to_string()).to_string(),
                )]
            })?;

        let config = DynamicValue::decode_msgpack(config).map_err(|e| {
            vec![Diagnostic::error(
                "Invalid data source configuration",
                e.to_string(),
            )]
        })?;

        Ok((factory(), config))
    }
}
