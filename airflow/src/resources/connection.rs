//! airflow_connection resource

use crate::api::{ApiError, Client, Connection};
use crate::json_diff::SuppressEquivalentJson;
use crate::resources::get_string;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::request::{
    CreateRequest, CreateResponse, DeleteRequest, DeleteResponse, ImportRequest, ImportResponse,
    ReadRequest, ReadResponse, UpdateRequest, UpdateResponse,
};
use tfplug::validator::{NumberRangeValidator, StringIsJsonValidator};
use tfplug::{AttributeBuilder, Diagnostics, Dynamic, Resource, Schema, SchemaBuilder, State};

pub struct ConnectionResource {
    client: Client,
}

impl ConnectionResource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a connection in an Airflow deployment")
            .attribute(
                AttributeBuilder::string("connection_id")
                    .required()
                    .requires_replace()
                    .description("The connection ID"),
            )
            .attribute(
                AttributeBuilder::string("conn_type")
                    .required()
                    .description("The connection type (e.g. 'postgres', 'http')"),
            )
            .attribute(
                AttributeBuilder::string("description")
                    .optional()
                    .description("Description of the connection"),
            )
            .attribute(
                AttributeBuilder::string("host")
                    .optional()
                    .description("Hostname of the connection target"),
            )
            .attribute(
                AttributeBuilder::string("login")
                    .optional()
                    .description("Login for the connection"),
            )
            .attribute(
                AttributeBuilder::string("schema")
                    .optional()
                    .description("Schema of the connection target"),
            )
            .attribute(
                AttributeBuilder::number("port")
                    .optional()
                    .validator(Arc::new(NumberRangeValidator {
                        min: Some(0.0),
                        max: Some(65535.0),
                    }))
                    .description("Port of the connection target"),
            )
            .attribute(
                AttributeBuilder::string("password")
                    .optional()
                    .sensitive()
                    .plan_modifier(Arc::new(SuppressEquivalentJson))
                    .description("Password for the connection; the API may mask it as '***'"),
            )
            .attribute(
                AttributeBuilder::string("extra")
                    .optional()
                    .sensitive()
                    .validator(Arc::new(StringIsJsonValidator))
                    .plan_modifier(Arc::new(SuppressEquivalentJson))
                    .description("Extra connection parameters as a JSON object"),
            )
            .build()
    }

    fn connection_from_values(
        values: &HashMap<String, Dynamic>,
        connection_id: &str,
    ) -> Connection {
        Connection {
            connection_id: connection_id.to_string(),
            conn_type: get_string(values, "conn_type").unwrap_or_default(),
            description: get_string(values, "description"),
            host: get_string(values, "host"),
            login: get_string(values, "login"),
            schema: get_string(values, "schema"),
            port: values
                .get("port")
                .and_then(|v| v.as_number())
                .map(|n| n as i64),
            // An empty password must never overwrite a stored one.
            password: get_string(values, "password").filter(|p| !p.is_empty()),
            extra: get_string(values, "extra"),
        }
    }

    fn state_from_connection(remote: &Connection, prior: &HashMap<String, Dynamic>) -> State {
        let mut values = HashMap::new();
        values.insert(
            "connection_id".to_string(),
            Dynamic::String(remote.connection_id.clone()),
        );
        values.insert(
            "conn_type".to_string(),
            Dynamic::String(remote.conn_type.clone()),
        );

        if let Some(description) = &remote.description {
            values.insert(
                "description".to_string(),
                Dynamic::String(description.clone()),
            );
        }
        if let Some(host) = &remote.host {
            values.insert("host".to_string(), Dynamic::String(host.clone()));
        }
        if let Some(login) = &remote.login {
            values.insert("login".to_string(), Dynamic::String(login.clone()));
        }
        if let Some(schema) = &remote.schema {
            values.insert("schema".to_string(), Dynamic::String(schema.clone()));
        }
        if let Some(port) = remote.port {
            values.insert("port".to_string(), Dynamic::Number(port as f64));
        }
        if let Some(extra) = &remote.extra {
            values.insert("extra".to_string(), Dynamic::String(extra.clone()));
        }

        // The API only returns the password when the deployment exposes
        // secrets; otherwise the last known value stays in state.
        match &remote.password {
            Some(password) => {
                values.insert("password".to_string(), Dynamic::String(password.clone()));
            }
            None => {
                if let Some(password) = prior.get("password") {
                    if !password.is_null() {
                        values.insert("password".to_string(), password.clone());
                    }
                }
            }
        }

        State { values }
    }

    async fn refreshed_state(
        &self,
        connection_id: &str,
        prior: &HashMap<String, Dynamic>,
    ) -> Result<State, ApiError> {
        let remote = self.client.connections().get(connection_id).await?;
        Ok(Self::state_from_connection(&remote, prior))
    }
}

#[async_trait]
impl Resource for ConnectionResource {
    async fn create(&self, request: CreateRequest) -> CreateResponse {
        let mut diagnostics = Diagnostics::new();

        let connection_id = match get_string(&request.config.values, "connection_id") {
            Some(id) => id,
            None => {
                diagnostics.add_error("connection_id is required", None::<String>);
                return CreateResponse {
                    state: request.planned_state,
                    diagnostics,
                };
            }
        };

        let connection = Self::connection_from_values(&request.config.values, &connection_id);

        if let Err(e) = self.client.connections().create(&connection).await {
            diagnostics.add_error(
                format!("failed to create connection `{}`", connection_id),
                Some(e.to_string()),
            );
            return CreateResponse {
                state: request.planned_state,
                diagnostics,
            };
        }

        match self
            .refreshed_state(&connection_id, &request.config.values)
            .await
        {
            Ok(state) => CreateResponse { state, diagnostics },
            Err(e) => {
                diagnostics.add_error(
                    format!("failed to read connection `{}` after create", connection_id),
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

        let connection_id = match get_string(&request.current_state.values, "connection_id") {
            Some(id) => id,
            // Without an identifier the entry is unrecoverable; let
            // Terraform plan a fresh create.
            None => {
                return ReadResponse {
                    state: None,
                    diagnostics,
                }
            }
        };

        match self
            .refreshed_state(&connection_id, &request.current_state.values)
            .await
        {
            Ok(state) => ReadResponse {
                state: Some(state),
                diagnostics,
            },
            Err(e) if e.is_not_found() => ReadResponse {
                state: None,
                diagnostics,
            },
            Err(e) => {
                diagnostics.add_error(
                    format!("failed to read connection `{}`", connection_id),
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

        let connection_id = match get_string(&request.current_state.values, "connection_id") {
            Some(id) => id,
            None => {
                diagnostics.add_error("connection_id missing from state", None::<String>);
                return UpdateResponse {
                    state: request.current_state,
                    diagnostics,
                };
            }
        };

        let connection = Self::connection_from_values(&request.config.values, &connection_id);

        if let Err(e) = self
            .client
            .connections()
            .update(&connection_id, &connection)
            .await
        {
            diagnostics.add_error(
                format!("failed to update connection `{}`", connection_id),
                Some(e.to_string()),
            );
            return UpdateResponse {
                state: request.current_state,
                diagnostics,
            };
        }

        match self
            .refreshed_state(&connection_id, &request.config.values)
            .await
        {
            Ok(state) => UpdateResponse { state, diagnostics },
            Err(e) => {
                diagnostics.add_error(
                    format!("failed to read connection `{}` after update", connection_id),
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

        let connection_id = match get_string(&request.current_state.values, "connection_id") {
            Some(id) => id,
            None => return DeleteResponse { diagnostics },
        };

        match self.client.connections().delete(&connection_id).await {
            Ok(()) => {}
            // Already gone is the desired outcome.
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.add_error(
                format!("failed to delete connection `{}`", connection_id),
                Some(e.to_string()),
            ),
        }

        DeleteResponse { diagnostics }
    }

    async fn import(&self, request: ImportRequest) -> ImportResponse {
        let mut values = HashMap::new();
        values.insert(
            "connection_id".to_string(),
            Dynamic::String(request.id.clone()),
        );

        let read_response = self
            .read(ReadRequest {
                context: request.context,
                current_state: State { values },
            })
            .await;

        let mut diagnostics = read_response.diagnostics;
        if read_response.state.is_none() && !diagnostics.has_errors() {
            diagnostics.add_error(
                format!("connection `{}` does not exist", request.id),
                None::<String>,
            );
        }

        ImportResponse {
            state: read_response.state,
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Auth;
    use mockito::Server;
    use tfplug::Config;

    fn test_client(server_url: &str) -> Client {
        Client::new(
            server_url,
            Auth::Basic {
                username: "admin".to_string(),
                password: "secret".to_string(),
            },
            false,
        )
        .unwrap()
    }

    fn test_config() -> Config {
        let mut values = HashMap::new();
        values.insert(
            "connection_id".to_string(),
            Dynamic::String("pg".to_string()),
        );
        values.insert(
            "conn_type".to_string(),
            Dynamic::String("postgres".to_string()),
        );
        values.insert(
            "host".to_string(),
            Dynamic::String("db.example.com".to_string()),
        );
        values.insert("port".to_string(), Dynamic::Number(5432.0));
        values.insert(
            "password".to_string(),
            Dynamic::String("hunter2".to_string()),
        );
        values.insert(
            "extra".to_string(),
            Dynamic::String(r#"{"sslmode":"require"}"#.to_string()),
        );
        Config { values }
    }

    #[test]
    fn schema_marks_secrets_sensitive_and_id_replaceable() {
        let schema = ConnectionResource::schema_static();

        assert!(schema.attributes["connection_id"].required);
        assert_eq!(schema.attributes["connection_id"].plan_modifiers.len(), 1);
        assert!(schema.attributes["password"].sensitive);
        assert!(schema.attributes["extra"].sensitive);
        assert_eq!(schema.attributes["extra"].validators.len(), 1);
        assert_eq!(schema.attributes["extra"].plan_modifiers.len(), 1);
        assert!(schema.attributes["port"].optional);
    }

    #[tokio::test]
    async fn create_posts_connection_and_refreshes_state() {
        let mut server = Server::new_async().await;
        let post_mock = server
            .mock("POST", "/api/v1/connections")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"connection_id":"pg","conn_type":"postgres","port":5432,"password":"hunter2"}"#
                    .to_string(),
            ))
            .with_body(r#"{"connection_id":"pg","conn_type":"postgres"}"#)
            .create_async()
            .await;
        let get_mock = server
            .mock("GET", "/api/v1/connections/pg")
            .with_body(
                r#"{"connection_id":"pg","conn_type":"postgres","host":"db.example.com","port":5432,"extra":"{\"sslmode\": \"require\"}"}"#,
            )
            .create_async()
            .await;

        let resource = ConnectionResource::new(test_client(&server.url()));
        let config = test_config();

        let response = resource
            .create(CreateRequest {
                context: tfplug::Context::new(),
                config: config.clone(),
                planned_state: State {
                    values: config.values.clone(),
                },
            })
            .await;

        assert!(!response.diagnostics.has_errors());
        assert_eq!(
            response.state.values.get("host").and_then(|v| v.as_string()),
            Some("db.example.com")
        );
        // The API did not return the password; the configured one stays.
        assert_eq!(
            response
                .state
                .values
                .get("password")
                .and_then(|v| v.as_string()),
            Some("hunter2")
        );
        post_mock.assert_async().await;
        get_mock.assert_async().await;
    }

    #[tokio::test]
    async fn create_reports_api_failure() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v1/connections")
            .with_status(409)
            .with_body(r#"{"title":"Conflict","status":409,"detail":"already exists"}"#)
            .create_async()
            .await;

        let resource = ConnectionResource::new(test_client(&server.url()));
        let config = test_config();

        let response = resource
            .create(CreateRequest {
                context: tfplug::Context::new(),
                config: config.clone(),
                planned_state: State {
                    values: config.values,
                },
            })
            .await;

        assert!(response.diagnostics.has_errors());
        assert!(response.diagnostics.errors[0]
            .summary
            .contains("failed to create connection `pg`"));
    }

    #[tokio::test]
    async fn read_maps_not_found_to_absent_state() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/connections/pg")
            .with_status(404)
            .with_body(r#"{"title":"Connection not found","status":404}"#)
            .create_async()
            .await;

        let resource = ConnectionResource::new(test_client(&server.url()));

        let mut values = HashMap::new();
        values.insert(
            "connection_id".to_string(),
            Dynamic::String("pg".to_string()),
        );

        let response = resource
            .read(ReadRequest {
                context: tfplug::Context::new(),
                current_state: State { values },
            })
            .await;

        assert!(!response.diagnostics.has_errors());
        assert!(response.state.is_none());
    }

    #[tokio::test]
    async fn update_patches_and_returns_refreshed_state() {
        let mut server = Server::new_async().await;
        let patch_mock = server
            .mock("PATCH", "/api/v1/connections/pg")
            .with_body(r#"{"connection_id":"pg","conn_type":"postgres"}"#)
            .create_async()
            .await;
        let _get_mock = server
            .mock("GET", "/api/v1/connections/pg")
            .with_body(
                r#"{"connection_id":"pg","conn_type":"postgres","host":"db2.example.com"}"#,
            )
            .create_async()
            .await;

        let resource = ConnectionResource::new(test_client(&server.url()));
        let mut config = test_config();
        config.values.insert(
            "host".to_string(),
            Dynamic::String("db2.example.com".to_string()),
        );

        let mut state_values = HashMap::new();
        state_values.insert(
            "connection_id".to_string(),
            Dynamic::String("pg".to_string()),
        );

        let response = resource
            .update(UpdateRequest {
                context: tfplug::Context::new(),
                config: config.clone(),
                planned_state: State {
                    values: config.values,
                },
                current_state: State {
                    values: state_values,
                },
            })
            .await;

        assert!(!response.diagnostics.has_errors());
        assert_eq!(
            response.state.values.get("host").and_then(|v| v.as_string()),
            Some("db2.example.com")
        );
        patch_mock.assert_async().await;
    }

    #[tokio::test]
    async fn delete_tolerates_missing_connection() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/api/v1/connections/pg")
            .with_status(404)
            .create_async()
            .await;

        let resource = ConnectionResource::new(test_client(&server.url()));

        let mut values = HashMap::new();
        values.insert(
            "connection_id".to_string(),
            Dynamic::String("pg".to_string()),
        );

        let response = resource
            .delete(DeleteRequest {
                context: tfplug::Context::new(),
                current_state: State { values },
            })
            .await;

        assert!(!response.diagnostics.has_errors());
    }

    #[tokio::test]
    async fn import_seeds_id_and_reads() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/connections/imported")
            .with_body(r#"{"connection_id":"imported","conn_type":"http"}"#)
            .create_async()
            .await;

        let resource = ConnectionResource::new(test_client(&server.url()));

        let response = resource
            .import(ImportRequest {
                context: tfplug::Context::new(),
                id: "imported".to_string(),
            })
            .await;

        assert!(!response.diagnostics.has_errors());
        let state = response.state.unwrap();
        assert_eq!(
            state.values.get("conn_type").and_then(|v| v.as_string()),
            Some("http")
        );
    }
}
