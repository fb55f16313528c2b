//! airflow_pool resource

use crate::api::{Client, Pool};
use crate::resources::get_string;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::request::{
    CreateRequest, CreateResponse, DeleteRequest, DeleteResponse, ImportRequest, ImportResponse,
    ReadRequest, ReadResponse, UpdateRequest, UpdateResponse,
};
use tfplug::{AttributeBuilder, Diagnostics, Dynamic, Resource, Schema, SchemaBuilder, State};

pub struct PoolResource {
    client: Client,
}

impl PoolResource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn schema_static() -> Schema {
        let gauge = |name: &str, desc: &str| {
            AttributeBuilder::number(name)
                .computed()
                .plan_modifier(Arc::new(UseStateForUnknown))
                .description(desc)
        };

        SchemaBuilder::new()
            .version(0)
            .description("Manages a task pool in an Airflow deployment")
            .attribute(
                AttributeBuilder::string("name")
                    .required()
                    .requires_replace()
                    .description("The pool name"),
            )
            .attribute(
                AttributeBuilder::number("slots")
                    .required()
                    .description("Number of slots in the pool"),
            )
            .attribute(
                AttributeBuilder::string("description")
                    .optional()
                    .description("Description of the pool"),
            )
            .attribute(
                AttributeBuilder::bool("include_deferred")
                    .optional()
                    .computed()
                    .default(StaticDefault::bool(false))
                    .description("Whether deferred tasks count towards open slots"),
            )
            .attribute(gauge("occupied_slots", "Slots currently occupied"))
            .attribute(gauge("queued_slots", "Slots taken by queued tasks"))
            .attribute(gauge("open_slots", "Slots still available"))
            .attribute(gauge("running_slots", "Slots taken by running tasks"))
            .attribute(gauge("deferred_slots", "Slots taken by deferred tasks"))
            .attribute(gauge("scheduled_slots", "Slots taken by scheduled tasks"))
            .build()
    }

    fn pool_from_values(values: &HashMap<String, Dynamic>, name: &str) -> Pool {
        Pool {
            name: name.to_string(),
            slots: values
                .get("slots")
                .and_then(|v| v.as_number())
                .unwrap_or_default() as i64,
            description: get_string(values, "description"),
            include_deferred: values
                .get("include_deferred")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            ..Default::default()
        }
    }

    fn state_from_pool(remote: &Pool) -> State {
        let mut values = HashMap::new();
        values.insert("name".to_string(), Dynamic::String(remote.name.clone()));
        values.insert("slots".to_string(), Dynamic::Number(remote.slots as f64));
        if let Some(description) = &remote.description {
            values.insert(
                "description".to_string(),
                Dynamic::String(description.clone()),
            );
        }
        values.insert(
            "include_deferred".to_string(),
            Dynamic::Bool(remote.include_deferred),
        );

        let gauges = [
            ("occupied_slots", remote.occupied_slots),
            ("queued_slots", remote.queued_slots),
            ("open_slots", remote.open_slots),
            ("running_slots", remote.running_slots),
            ("deferred_slots", remote.deferred_slots),
            ("scheduled_slots", remote.scheduled_slots),
        ];
        for (attr, value) in gauges {
            if let Some(value) = value {
                values.insert(attr.to_string(), Dynamic::Number(value as f64));
            }
        }

        State { values }
    }
}

#[async_trait]
impl Resource for PoolResource {
    async fn create(&self, request: CreateRequest) -> CreateResponse {
        let mut diagnostics = Diagnostics::new();

        let name = match get_string(&request.config.values, "name") {
            Some(name) => name,
            None => {
                diagnostics.add_error("name is required", None::<String>);
                return CreateResponse {
                    state: request.planned_state,
                    diagnostics,
                };
            }
        };

        // include_deferred may come from the plan (default) rather than the
        // raw config.
        let mut source = request.config.values.clone();
        if !source.contains_key("include_deferred") {
            if let Some(value) = request.planned_state.values.get("include_deferred") {
                source.insert("include_deferred".to_string(), value.clone());
            }
        }
        let pool = Self::pool_from_values(&source, &name);

        if let Err(e) = self.client.pools().create(&pool).await {
            diagnostics.add_error(
                format!("failed to create pool `{}`", name),
                Some(e.to_string()),
            );
            return CreateResponse {
                state: request.planned_state,
                diagnostics,
            };
        }

        match self.client.pools().get(&name).await {
            Ok(remote) => CreateResponse {
                state: Self::state_from_pool(&remote),
                diagnostics,
            },
            Err(e) => {
                diagnostics.add_error(
                    format!("failed to read pool `{}` after create", name),
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

        let name = match get_string(&request.current_state.values, "name") {
            Some(name) => name,
            None => {
                return ReadResponse {
                    state: None,
                    diagnostics,
                }
            }
        };

        match self.client.pools().get(&name).await {
            Ok(remote) => ReadResponse {
                state: Some(Self::state_from_pool(&remote)),
                diagnostics,
            },
            Err(e) if e.is_not_found() => ReadResponse {
                state: None,
                diagnostics,
            },
            Err(e) => {
                diagnostics.add_error(
                    format!("failed to read pool `{}`", name),
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

        let name = match get_string(&request.current_state.values, "name") {
            Some(name) => name,
            None => {
                diagnostics.add_error("name missing from state", None::<String>);
                return UpdateResponse {
                    state: request.current_state,
                    diagnostics,
                };
            }
        };

        let mut source = request.config.values.clone();
        if !source.contains_key("include_deferred") {
            if let Some(value) = request.planned_state.values.get("include_deferred") {
                source.insert("include_deferred".to_string(), value.clone());
            }
        }
        let pool = Self::pool_from_values(&source, &name);

        if let Err(e) = self.client.pools().update(&name, &pool).await {
            diagnostics.add_error(
                format!("failed to update pool `{}`", name),
                Some(e.to_string()),
            );
            return UpdateResponse {
                state: request.current_state,
                diagnostics,
            };
        }

        match self.client.pools().get(&name).await {
            Ok(remote) => UpdateResponse {
                state: Self::state_from_pool(&remote),
                diagnostics,
            },
            Err(e) => {
                diagnostics.add_error(
                    format!("failed to read pool `{}` after update", name),
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

        let name = match get_string(&request.current_state.values, "name") {
            Some(name) => name,
            None => return DeleteResponse { diagnostics },
        };

        match self.client.pools().delete(&name).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.add_error(
                format!("failed to delete pool `{}`", name),
                Some(e.to_string()),
            ),
        }

        DeleteResponse { diagnostics }
    }

    async fn import(&self, request: ImportRequest) -> ImportResponse {
        let mut values = HashMap::new();
        values.insert("name".to_string(), Dynamic::String(request.id.clone()));

        let read_response = self
            .read(ReadRequest {
                context: request.context,
                current_state: State { values },
            })
            .await;

        let mut diagnostics = read_response.diagnostics;
        if read_response.state.is_none() && !diagnostics.has_errors() {
            diagnostics.add_error(
                format!("pool `{}` does not exist", request.id),
                None::<String>,
            );
        }

        ImportResponse {
            state: read_response.state,
            diagnostics,
        }
    }
}
