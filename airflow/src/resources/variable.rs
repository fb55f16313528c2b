//! airflow_variable resource

use crate::api::{Client, Variable};
use crate::resources::get_string;
use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::request::{
    CreateRequest, CreateResponse, DeleteRequest, DeleteResponse, ImportRequest, ImportResponse,
    ReadRequest, ReadResponse, UpdateRequest, UpdateResponse,
};
use tfplug::{AttributeBuilder, Diagnostics, Dynamic, Resource, Schema, SchemaBuilder, State};

pub struct VariableResource {
    client: Client,
}

impl VariableResource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a variable in an Airflow deployment")
            .attribute(
                AttributeBuilder::string("key")
                    .required()
                    .requires_replace()
                    .description("The variable key"),
            )
            .attribute(
                AttributeBuilder::string("value")
                    .required()
                    .description("The variable value"),
            )
            .attribute(
                AttributeBuilder::string("description")
                    .optional()
                    .description("Description of the variable"),
            )
            .build()
    }

    fn state_from_variable(remote: &Variable) -> State {
        let mut values = HashMap::new();
        values.insert("key".to_string(), Dynamic::String(remote.key.clone()));
        values.insert("value".to_string(), Dynamic::String(remote.value.clone()));
        if let Some(description) = &remote.description {
            if !description.is_empty() {
                values.insert(
                    "description".to_string(),
                    Dynamic::String(description.clone()),
                );
            }
        }
        State { values }
    }
}

#[async_trait]
impl Resource for VariableResource {
    async fn create(&self, request: CreateRequest) -> CreateResponse {
        let mut diagnostics = Diagnostics::new();

        let (key, value) = match (
            get_string(&request.config.values, "key"),
            get_string(&request.config.values, "value"),
        ) {
            (Some(key), Some(value)) => (key, value),
            _ => {
                diagnostics.add_error("key and value are required", None::<String>);
                return CreateResponse {
                    state: request.planned_state,
                    diagnostics,
                };
            }
        };

        let variable = Variable {
            key: key.clone(),
            value,
            description: get_string(&request.config.values, "description"),
        };

        if let Err(e) = self.client.variables().create(&variable).await {
            diagnostics.add_error(
                format!("failed to create variable `{}`", key),
                Some(e.to_string()),
            );
            return CreateResponse {
                state: request.planned_state,
                diagnostics,
            };
        }

        match self.client.variables().get(&key).await {
            Ok(remote) => CreateResponse {
                state: Self::state_from_variable(&remote),
                diagnostics,
            },
            Err(e) => {
                diagnostics.add_error(
                    format!("failed to read variable `{}` after create", key),
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

        let key = match get_string(&request.current_state.values, "key") {
            Some(key) => key,
            None => {
                return ReadResponse {
                    state: None,
                    diagnostics,
                }
            }
        };

        match self.client.variables().get(&key).await {
            Ok(remote) => ReadResponse {
                state: Some(Self::state_from_variable(&remote)),
                diagnostics,
            },
            Err(e) if e.is_not_found() => ReadResponse {
                state: None,
                diagnostics,
            },
            Err(e) => {
                diagnostics.add_error(
                    format!("failed to read variable `{}`", key),
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

        let key = match get_string(&request.current_state.values, "key") {
            Some(key) => key,
            None => {
                diagnostics.add_error("key missing from state", None::<String>);
                return UpdateResponse {
                    state: request.current_state,
                    diagnostics,
                };
            }
        };

        let variable = Variable {
            key: key.clone(),
            value: get_string(&request.config.values, "value").unwrap_or_default(),
            // A removed description is cleared with an explicit empty string.
            description: Some(
                get_string(&request.config.values, "description").unwrap_or_default(),
            ),
        };

        if let Err(e) = self.client.variables().update(&key, &variable).await {
            diagnostics.add_error(
                format!("failed to update variable `{}`", key),
                Some(e.to_string()),
            );
            return UpdateResponse {
                state: request.current_state,
                diagnostics,
            };
        }

        match self.client.variables().get(&key).await {
            Ok(remote) => UpdateResponse {
                state: Self::state_from_variable(&remote),
                diagnostics,
            },
            Err(e) => {
                diagnostics.add_error(
                    format!("failed to read variable `{}` after update", key),
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

        let key = match get_string(&request.current_state.values, "key") {
            Some(key) => key,
            None => return DeleteResponse { diagnostics },
        };

        match self.client.variables().delete(&key).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.add_error(
                format!("failed to delete variable `{}`", key),
                Some(e.to_string()),
            ),
        }

        DeleteResponse { diagnostics }
    }

    async fn import(&self, request: ImportRequest) -> ImportResponse {
        let mut values = HashMap::new();
        values.insert("key".to_string(), Dynamic::String(request.id.clone()));

        let read_response = self
            .read(ReadRequest {
                context: request.context,
                current_state: State { values },
            })
            .await;

        let mut diagnostics = read_response.diagnostics;
        if read_response.state.is_none() && !diagnostics.has_errors() {
            diagnostics.add_error(
                format!("variable `{}` does not exist", request.id),
                None::<String>,
            );
        }

        ImportResponse {
            state: read_response.state,
            diagnostics,
        }
    }
}
