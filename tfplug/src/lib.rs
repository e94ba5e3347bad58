//! tfplug - Terraform Plugin Framework for Rust
//!
//! A small framework for building Terraform data-source providers in Rust.
//! Providers implement [`Provider`] and hand out [`DataSourceWithConfigure`]
//! factories; [`ProviderHost`] drives them the way Terraform core does.

// Core modules
pub mod context;
pub mod error;
pub mod schema;
pub mod types;

// Provider API modules
pub mod data_source;
pub mod provider;

// Helper modules
pub mod validator;

// Hosting
pub mod host;

// Re-exports for convenience
pub use context::Context;
pub use data_source::{DataSource, DataSourceWithConfigure};
pub use error::{Result, TfplugError};
pub use host::{ProviderHost, ProviderSchemas, ReadDataSourceResult};
pub use provider::{DataSourceFactory, Provider, ProviderData};
pub use schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
pub use types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
