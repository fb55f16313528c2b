//! airflow_user_roles resource
//!
//! Manages the role assignment of an existing user as its own resource,
//! via PATCH with `update_mask=roles`. The user itself is owned elsewhere:
//! destroying this resource clears the assignment but leaves the user in
//! place.

use crate::api::{Client, User};
use crate::resources::get_string;
use crate::resources::user::UserResource;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::request::{
    CreateRequest, CreateResponse, DeleteRequest, DeleteResponse, ImportRequest, ImportResponse,
    ReadRequest, ReadResponse, UpdateRequest, UpdateResponse,
};
use tfplug::validator::ListLengthValidator;
use tfplug::{
    AttributeBuilder, AttributeType, Diagnostics, Dynamic, Resource, Schema, SchemaBuilder, State,
};

pub struct UserRolesResource {
    client: Client,
}

impl UserRolesResource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages the role assignment of an existing Airflow user")
            .attribute(
                AttributeBuilder::string("username")
                    .required()
                    .requires_replace()
                    .description("The username whose roles are managed"),
            )
            .attribute(
                AttributeBuilder::set("roles", AttributeType::String)
                    .required()
                    .validator(Arc::new(ListLengthValidator {
                        min: Some(1),
                        max: None,
                    }))
                    .description("Role names assigned to the user"),
            )
            .build()
    }

    /// PATCH body for a roles-only update. The API validates the full user
    /// object even under an update mask, so the identity fields are padded
    /// with the username.
    fn roles_patch_body(username: &str, values: &HashMap<String, Dynamic>) -> User {
        User {
            username: username.to_string(),
            email: username.to_string(),
            first_name: username.to_string(),
            last_name: username.to_string(),
            roles: UserResource::expand_roles(values),
            ..Default::default()
        }
    }

    fn state_from_user(remote: &User) -> State {
        let mut values = HashMap::new();
        values.insert(
            "username".to_string(),
            Dynamic::String(remote.username.clone()),
        );
        values.insert("roles".to_string(), UserResource::flatten_roles(&remote.roles));
        State { values }
    }

    async fn patch_roles(
        &self,
        username: &str,
        body: &User,
        diagnostics: &mut Diagnostics,
        action: &str,
    ) -> bool {
        match self
            .client
            .users()
            .update(username, body, Some(&["roles"]))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                diagnostics.add_error(
                    format!("failed to {} roles for user `{}`", action, username),
                    Some(e.to_string()),
                );
                false
            }
        }
    }
}

#[async_trait]
impl Resource for UserRolesResource {
    async fn create(&self, request: CreateRequest) -> CreateResponse {
        let mut diagnostics = Diagnostics::new();

        let username = match get_string(&request.config.values, "username") {
            Some(username) => username,
            None => {
                diagnostics.add_error("username is required", None::<String>);
                return CreateResponse {
                    state: request.planned_state,
                    diagnostics,
                };
            }
        };

        let body = Self::roles_patch_body(&username, &request.config.values);
        if !self
            .patch_roles(&username, &body, &mut diagnostics, "assign")
            .await
        {
            return CreateResponse {
                state: request.planned_state,
                diagnostics,
            };
        }

        match self.client.users().get(&username).await {
            Ok(remote) => CreateResponse {
                state: Self::state_from_user(&remote),
                diagnostics,
            },
            Err(e) => {
                diagnostics.add_error(
                    format!("failed to read user `{}` after assigning roles", username),
                    Some(e.to_string()),
                );
                CreateResponse {
                    state: request.planned_state,
                    diagnostics,
                }
            }
        }
    }

    async fn read(&self, request: ReadRequest) -> ReadResponse {
        let mut diagnostics = Diagnostics::new();

        let username = match get_string(&request.current_state.values, "username") {
            Some(username) => username,
            None => {
                return ReadResponse {
                    state: None,
                    diagnostics,
                }
            }
        };

        match self.client.users().get(&username).await {
            Ok(remote) => ReadResponse {
                state: Some(Self::state_from_user(&remote)),
                diagnostics,
            },
            Err(e) if e.is_not_found() => ReadResponse {
                state: None,
                diagnostics,
            },
            Err(e) => {
                diagnostics.add_error(
                    format!("failed to read user `{}`", username),
                    Some(e.to_string()),
                );
                ReadResponse {
                    state: Some(request.current_state),
                    diagnostics,
                }
            }
        }
    }

    async fn update(&self, request: UpdateRequest) -> UpdateResponse {
        let mut diagnostics = Diagnostics::new();

        let username = match get_string(&request.current_state.values, "username") {
            Some(username) => username,
            None => {
                diagnostics.add_error("username missing from state", None::<String>);
                return UpdateResponse {
                    state: request.current_state,
                    diagnostics,
                };
            }
        };

        let body = Self::roles_patch_body(&username, &request.config.values);
        if !self
            .patch_roles(&username, &body, &mut diagnostics, "update")
            .await
        {
            return UpdateResponse {
                state: request.current_state,
                diagnostics,
            };
        }

        match self.client.users().get(&username).await {
            Ok(remote) => UpdateResponse {
                state: Self::state_from_user(&remote),
                diagnostics,
            },
            Err(e) => {
                diagnostics.add_error(
                    format!("failed to read user `{}` after updating roles", username),
                    Some(e.to_string()),
                );
                UpdateResponse {
                    state: request.planned_state,
                    diagnostics,
                }
            }
        }
    }

    async fn delete(&self, request: DeleteRequest) -> DeleteResponse {
        let mut diagnostics = Diagnostics::new();

        let username = match get_string(&request.current_state.values, "username") {
            Some(username) => username,
            None => return DeleteResponse { diagnostics },
        };

        // Only the assignment is destroyed; the user stays.
        let body = Self::roles_patch_body(&username, &HashMap::new());
        match self
            .client
            .users()
            .update(&username, &body, Some(&["roles"]))
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.add_error(
                format!("failed to clear roles for user `{}`", username),
                Some(e.to_string()),
            ),
        }

        DeleteResponse { diagnostics }
    }

    async fn import(&self, request: ImportRequest) -> ImportResponse {
        let mut values = HashMap::new();
        values.insert("username".to_string(), Dynamic::String(request.id.clone()));

        let read_response = self
            .read(ReadRequest {
                context: request.context,
                current_state: State { values },
            })
            .await;

        let mut diagnostics = read_response.diagnostics;
        if read_response.state.is_none() && !diagnostics.has_errors() {
            diagnostics.add_error(
                format!("user `{}` does not exist", request.id),
                None::<String>,
            );
        }

        ImportResponse {
            state: read_response.state,
            diagnostics,
        }
    }
}
