//! airflow_user resource

use crate::api::{Client, User, UserRole};
use crate::resources::get_string;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::request::{
    CreateRequest, CreateResponse, DeleteRequest, DeleteResponse, ImportRequest, ImportResponse,
    ReadRequest, ReadResponse, UpdateRequest, UpdateResponse,
};
use tfplug::validator::ListLengthValidator;
use tfplug::{
    AttributeBuilder, AttributeType, Diagnostics, Dynamic, Resource, Schema, SchemaBuilder, State,
};

pub struct UserResource {
    client: Client,
}

impl UserResource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a user in an Airflow deployment")
            .attribute(
                AttributeBuilder::string("username")
                    .required()
                    .requires_replace()
                    .description("The username"),
            )
            .attribute(
                AttributeBuilder::string("email")
                    .required()
                    .requires_replace()
                    .description("The user's email address"),
            )
            .attribute(
                AttributeBuilder::string("first_name")
                    .required()
                    .description("The user's first name"),
            )
            .attribute(
                AttributeBuilder::string("last_name")
                    .required()
                    .description("The user's last name"),
            )
            .attribute(
                AttributeBuilder::string("password")
                    .required()
                    .sensitive()
                    .description("The user's password; the API never returns it"),
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
            .attribute(
                AttributeBuilder::bool("active")
                    .computed()
                    .plan_modifier(Arc::new(UseStateForUnknown))
                    .description("Whether the account is active"),
            )
            .attribute(
                AttributeBuilder::number("login_count")
                    .computed()
                    .plan_modifier(Arc::new(UseStateForUnknown))
                    .description("Number of logins"),
            )
            .attribute(
                AttributeBuilder::number("failed_login_count")
                    .computed()
                    .plan_modifier(Arc::new(UseStateForUnknown))
                    .description("Number of failed login attempts"),
            )
            .build()
    }

    pub(crate) fn expand_roles(values: &HashMap<String, Dynamic>) -> Vec<UserRole> {
        values
            .get("roles")
            .and_then(|v| v.as_list())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_string())
                    .map(|name| UserRole {
                        name: name.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn flatten_roles(roles: &[UserRole]) -> Dynamic {
        Dynamic::List(
            roles
                .iter()
                .map(|role| Dynamic::String(role.name.clone()))
                .collect(),
        )
    }

    fn user_from_values(values: &HashMap<String, Dynamic>, username: &str) -> User {
        User {
            username: username.to_string(),
            email: get_string(values, "email").unwrap_or_default(),
            first_name: get_string(values, "first_name").unwrap_or_default(),
            last_name: get_string(values, "last_name").unwrap_or_default(),
            password: get_string(values, "password"),
            roles: Self::expand_roles(values),
            ..Default::default()
        }
    }

    fn state_from_user(remote: &User, prior: &HashMap<String, Dynamic>) -> State {
        let mut values = HashMap::new();
        values.insert(
            "username".to_string(),
            Dynamic::String(remote.username.clone()),
        );
        values.insert("email".to_string(), Dynamic::String(remote.email.clone()));
        values.insert(
            "first_name".to_string(),
            Dynamic::String(remote.first_name.clone()),
        );
        values.insert(
            "last_name".to_string(),
            Dynamic::String(remote.last_name.clone()),
        );
        values.insert("roles".to_string(), Self::flatten_roles(&remote.roles));

        // The password is write-only; the configured value stays in state.
        if let Some(password) = prior.get("password") {
            if !password.is_null() {
                values.insert("password".to_string(), password.clone());
            }
        }

        if let Some(active) = remote.active {
            values.insert("active".to_string(), Dynamic::Bool(active));
        }
        if let Some(login_count) = remote.login_count {
            values.insert(
                "login_count".to_string(),
                Dynamic::Number(login_count as f64),
            );
        }
        if let Some(failed_login_count) = remote.failed_login_count {
            values.insert(
                "failed_login_count".to_string(),
                Dynamic::Number(failed_login_count as f64),
            );
        }

        State { values }
    }
}

#[async_trait]
impl Resource for UserResource {
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

        let user = Self::user_from_values(&request.config.values, &username);

        if let Err(e) = self.client.users().create(&user).await {
            diagnostics.add_error(
                format!("failed to create user `{}`", username),
                Some(e.to_string()),
            );
            return CreateResponse {
                state: request.planned_state,
                diagnostics,
            };
        }

        match self.client.users().get(&username).await {
            Ok(remote) => CreateResponse {
                state: Self::state_from_user(&remote, &request.config.values),
                diagnostics,
            },
            Err(e) => {
                diagnostics.add_error(
                    format!("failed to read user `{}` after create", username),
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
                state: Some(Self::state_from_user(
                    &remote,
                    &request.current_state.values,
                )),
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

        let user = Self::user_from_values(&request.config.values, &username);

        if let Err(e) = self.client.users().update(&username, &user, None).await {
            diagnostics.add_error(
                format!("failed to update user `{}`", username),
                Some(e.to_string()),
            );
            return UpdateResponse {
                state: request.current_state,
                diagnostics,
            };
        }

        match self.client.users().get(&username).await {
            Ok(remote) => UpdateResponse {
                state: Self::state_from_user(&remote, &request.config.values),
                diagnostics,
            },
            Err(e) => {
                diagnostics.add_error(
                    format!("failed to read user `{}` after update", username),
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

        match self.client.users().delete(&username).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.add_error(
                format!("failed to delete user `{}`", username),
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
