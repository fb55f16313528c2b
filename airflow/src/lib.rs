pub mod api;
pub mod json_diff;
pub mod resources;

use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::request::{ConfigureRequest, ConfigureResponse};
use tfplug::{AttributeBuilder, Diagnostics, Provider, Resource, Schema, SchemaBuilder};

use api::{Auth, Client};

pub struct AirflowProvider {
    client: Option<Client>,
}

impl Default for AirflowProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AirflowProvider {
    pub fn new() -> Self {
        Self { client: None }
    }
}

fn config_string(request: &ConfigureRequest, key: &str, env_var: &str) -> Option<String> {
    request
        .config
        .values
        .get(key)
        .and_then(|v| v.as_string())
        .map(str::to_string)
        .or_else(|| std::env::var(env_var).ok())
}

#[async_trait]
impl Provider for AirflowProvider {
    fn provider_schema(&self) -> Schema {
        SchemaBuilder::new()
            .description("Interact with an Apache Airflow deployment")
            .attribute(
                AttributeBuilder::string("base_endpoint")
                    .optional()
                    .description(
                        "Airflow deployment URL (can also be set via AIRFLOW_BASE_ENDPOINT env var)",
                    ),
            )
            .attribute(
                AttributeBuilder::string("username")
                    .optional()
                    .description(
                        "Username for basic auth (can also be set via AIRFLOW_API_USERNAME env var)",
                    ),
            )
            .attribute(
                AttributeBuilder::string("password")
                    .optional()
                    .sensitive()
                    .description(
                        "Password for basic auth (can also be set via AIRFLOW_API_PASSWORD env var)",
                    ),
            )
            .attribute(
                AttributeBuilder::string("oauth2_token")
                    .optional()
                    .sensitive()
                    .description(
                        "Bearer token, takes precedence over basic auth (can also be set via AIRFLOW_OAUTH2_TOKEN env var)",
                    ),
            )
            .attribute(
                AttributeBuilder::bool("insecure")
                    .optional()
                    .description("Skip TLS certificate verification"),
            )
            .build()
    }

    async fn configure(&mut self, request: ConfigureRequest) -> ConfigureResponse {
        let base_endpoint = config_string(&request, "base_endpoint", "AIRFLOW_BASE_ENDPOINT");
        let username = config_string(&request, "username", "AIRFLOW_API_USERNAME");
        let password = config_string(&request, "password", "AIRFLOW_API_PASSWORD");
        let oauth2_token = config_string(&request, "oauth2_token", "AIRFLOW_OAUTH2_TOKEN");

        let insecure = request
            .config
            .values
            .get("insecure")
            .and_then(|v| v.as_bool())
            .or_else(|| {
                std::env::var("AIRFLOW_INSECURE")
                    .ok()
                    .and_then(|v| v.parse::<bool>().ok())
            })
            .unwrap_or(false);

        let mut diags = Diagnostics::new();

        let Some(base_endpoint) = base_endpoint else {
            diags.add_error(
                "base_endpoint is required (set in provider config or AIRFLOW_BASE_ENDPOINT env var)",
                None::<String>,
            );
            return ConfigureResponse { diagnostics: diags };
        };

        let auth = match (oauth2_token, username, password) {
            (Some(token), _, _) => Auth::Bearer(token),
            (None, Some(username), Some(password)) => Auth::Basic { username, password },
            _ => {
                diags.add_error(
                    "credentials are required (set oauth2_token or username/password in provider \
                     config, or the AIRFLOW_OAUTH2_TOKEN / AIRFLOW_API_USERNAME / \
                     AIRFLOW_API_PASSWORD env vars)",
                    None::<String>,
                );
                return ConfigureResponse { diagnostics: diags };
            }
        };

        match Client::new(&base_endpoint, auth, insecure) {
            Ok(client) => {
                self.client = Some(client);
            }
            Err(e) => {
                diags.add_error(format!("Failed to create API client: {}", e), None::<String>);
            }
        }

        ConfigureResponse { diagnostics: diags }
    }

    async fn create_resource(&self, type_name: &str) -> tfplug::Result<Box<dyn Resource>> {
        let client = self
            .client
            .as_ref()
            .ok_or("Provider not configured")?
            .clone();

        match type_name {
            "airflow_connection" => Ok(Box::new(resources::ConnectionResource::new(client))),
            "airflow_pool" => Ok(Box::new(resources::PoolResource::new(client))),
            "airflow_variable" => Ok(Box::new(resources::VariableResource::new(client))),
            "airflow_user" => Ok(Box::new(resources::UserResource::new(client))),
            "airflow_user_roles" => Ok(Box::new(resources::UserRolesResource::new(client))),
            _ => Err(format!("Unknown resource: {}", type_name).into()),
        }
    }

    async fn resource_schemas(&self) -> HashMap<String, Schema> {
        static SCHEMAS: std::sync::OnceLock<HashMap<String, Schema>> = std::sync::OnceLock::new();

        SCHEMAS
            .get_or_init(|| {
                let mut schemas = HashMap::new();
                schemas.insert(
                    "airflow_connection".to_string(),
                    resources::ConnectionResource::schema_static(),
                );
                schemas.insert(
                    "airflow_pool".to_string(),
                    resources::PoolResource::schema_static(),
                );
                schemas.insert(
                    "airflow_variable".to_string(),
                    resources::VariableResource::schema_static(),
                );
                schemas.insert(
                    "airflow_user".to_string(),
                    resources::UserResource::schema_static(),
                );
                schemas.insert(
                    "airflow_user_roles".to_string(),
                    resources::UserRolesResource::schema_static(),
                );
                schemas
            })
            .clone()
    }
}
