//! Resource trait
//!
//! Resources are created on demand by the provider factory for every
//! request, so implementations hold only cheaply cloneable handles (API
//! clients behind an Arc).

use crate::request::{
    CreateRequest, CreateResponse, DeleteRequest, DeleteResponse, ImportRequest, ImportResponse,
    ReadRequest, ReadResponse, UpdateRequest, UpdateResponse,
};
use crate::types::Diagnostics;
use async_trait::async_trait;

#[async_trait]
pub trait Resource: Send + Sync {
    /// Create the remote object and return the full new state, including
    /// every computed attribute.
    async fn create(&self, request: CreateRequest) -> CreateResponse;

    /// Refresh state from the remote API. Return `state: None` when the
    /// object no longer exists.
    async fn read(&self, request: ReadRequest) -> ReadResponse;

    /// Apply the planned state to the remote object.
    async fn update(&self, request: UpdateRequest) -> UpdateResponse;

    /// Remove the remote object. A remote "not found" is not an error.
    async fn delete(&self, request: DeleteRequest) -> DeleteResponse;

    /// Handle `terraform import`. The default implementation rejects the
    /// request; resources opt in by seeding their identifying attribute from
    /// the import ID and delegating to `read`.
    async fn import(&self, request: ImportRequest) -> ImportResponse {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add_error(
            "Import is not supported for this resource",
            Some(format!("Cannot import id {:?}", request.id)),
        );
        ImportResponse {
            state: None,
            diagnostics,
        }
    }
}
