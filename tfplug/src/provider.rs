//! Provider trait
//!
//! Providers are factories: `configure` runs once with the provider block
//! configuration, after which `create_resource` builds a fresh resource
//! handler per request. This keeps the server free of per-resource locks.

use crate::request::{ConfigureRequest, ConfigureResponse};
use crate::resource::Resource;
use crate::schema::Schema;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Schema of the provider configuration block.
    fn provider_schema(&self) -> Schema;

    /// Configure the provider from its block, typically building an API
    /// client. Called once before any resource operation.
    async fn configure(&mut self, request: ConfigureRequest) -> ConfigureResponse;

    /// Instantiate the handler for a resource type. Fails for unknown type
    /// names and before the provider is configured.
    async fn create_resource(&self, type_name: &str) -> Result<Box<dyn Resource>>;

    /// Schemas of every managed resource type, keyed by type name. Cache
    /// these; the framework asks repeatedly.
    async fn resource_schemas(&self) -> HashMap<String, Schema>;
}
