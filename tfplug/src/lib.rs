//! tfplug - Terraform Plugin Framework for Rust
//!
//! A framework for building Terraform providers in Rust, implementing the
//! Terraform Plugin Protocol v6 over gRPC.
//!
//! Providers implement [`Provider`] as a factory for [`Resource`] handlers
//! and hand themselves to [`ProviderServer`], which takes care of the wire
//! protocol: schema publication, value encoding, planning (defaults and
//! plan modifiers), and CRUD/import dispatch.

// Core modules
pub mod context;
pub mod error;
pub mod types;

// Schema system
pub mod attribute_type;
pub mod defaults;
pub mod plan_modifier;
pub mod schema;
pub mod validator;

// Provider API
pub mod provider;
pub mod request;
pub mod resource;

// Protocol implementation
pub mod grpc;
pub mod proto;

// Re-exports for convenience
pub use attribute_type::AttributeType;
pub use context::Context;
pub use error::{Result, TfplugError};
pub use grpc::ProviderServer;
pub use provider::Provider;
pub use resource::Resource;
pub use schema::{Attribute, AttributeBuilder, Schema, SchemaBuilder};
pub use types::{Config, Diagnostics, Dynamic, State};
