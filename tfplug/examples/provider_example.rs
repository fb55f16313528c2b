//! Minimal in-memory provider showing the tfplug building blocks: a
//! provider factory, one resource with a requires-replace attribute, and
//! the server entry point.
//!
//! Run with `cargo run --example provider_example`; Terraform would then
//! attach to the address printed in the handshake line.

use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::request::{
    ConfigureRequest, ConfigureResponse, CreateRequest, CreateResponse, DeleteRequest,
    DeleteResponse, ReadRequest, ReadResponse, UpdateRequest, UpdateResponse,
};
use tfplug::{
    AttributeBuilder, Diagnostics, Provider, ProviderServer, Resource, Schema, SchemaBuilder,
    State, TfplugError,
};

struct ExampleProvider;

#[async_trait]
impl Provider for ExampleProvider {
    fn provider_schema(&self) -> Schema {
        SchemaBuilder::new()
            .description("Example in-memory provider")
            .attribute(
                AttributeBuilder::string("prefix")
                    .optional()
                    .description("Prefix applied to every stored value"),
            )
            .build()
    }

    async fn configure(&mut self, _request: ConfigureRequest) -> ConfigureResponse {
        ConfigureResponse {
            diagnostics: Diagnostics::new(),
        }
    }

    async fn create_resource(&self, type_name: &str) -> tfplug::Result<Box<dyn Resource>> {
        match type_name {
            "example_item" => Ok(Box::new(ItemResource)),
            _ => Err(TfplugError::ResourceNotFound(type_name.to_string())),
        }
    }

    async fn resource_schemas(&self) -> HashMap<String, Schema> {
        let mut schemas = HashMap::new();
        schemas.insert(
            "example_item".to_string(),
            SchemaBuilder::new()
                .description("An item held in memory")
                .attribute(
                    AttributeBuilder::string("name")
                        .required()
                        .requires_replace()
                        .description("Item identifier"),
                )
                .attribute(
                    AttributeBuilder::string("value")
                        .optional()
                        .description("Payload"),
                )
                .build(),
        );
        schemas
    }
}

struct ItemResource;

#[async_trait]
impl Resource for ItemResource {
    async fn create(&self, request: CreateRequest) -> CreateResponse {
        CreateResponse {
            state: State {
                values: request.planned_state.values,
            },
            diagnostics: Diagnostics::new(),
        }
    }

    async fn read(&self, request: ReadRequest) -> ReadResponse {
        ReadResponse {
            state: Some(request.current_state),
            diagnostics: Diagnostics::new(),
        }
    }

    async fn update(&self, request: UpdateRequest) -> UpdateResponse {
        UpdateResponse {
            state: request.planned_state,
            diagnostics: Diagnostics::new(),
        }
    }

    async fn delete(&self, _request: DeleteRequest) -> DeleteResponse {
        DeleteResponse {
            diagnostics: Diagnostics::new(),
        }
    }
}

#[tokio::main]
async fn main() -> tfplug::Result<()> {
    ProviderServer::new(ExampleProvider).run().await
}
