//! Connection API models and endpoints

use serde::{Deserialize, Serialize};

use super::client::Client;
use super::error::ApiError;

/// Connection as exchanged with `/connections`. Optional fields serialize
/// as explicit nulls so a PATCH can clear them; the password is the
/// exception and is only sent when set, never cleared implicitly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Connection {
    pub connection_id: String,
    pub conn_type: String,
    pub description: Option<String>,
    pub host: Option<String>,
    pub login: Option<String>,
    pub schema: Option<String>,
    pub port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub extra: Option<String>,
}

pub struct ConnectionsApi<'a> {
    client: &'a Client,
}

impl<'a> ConnectionsApi<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn create(&self, connection: &Connection) -> Result<Connection, ApiError> {
        self.client.post("/connections", connection).await
    }

    pub async fn get(&self, connection_id: &str) -> Result<Connection, ApiError> {
        self.client
            .get(&format!(
                "/connections/{}",
                urlencoding::encode(connection_id)
            ))
            .await
    }

    pub async fn update(
        &self,
        connection_id: &str,
        connection: &Connection,
    ) -> Result<Connection, ApiError> {
        self.client
            .patch(
                &format!("/connections/{}", urlencoding::encode(connection_id)),
                connection,
            )
            .await
    }

    pub async fn delete(&self, connection_id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!(
                "/connections/{}",
                urlencoding::encode(connection_id)
            ))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleared_fields_serialize_as_null_but_password_is_omitted() {
        let connection = Connection {
            connection_id: "db".to_string(),
            conn_type: "postgres".to_string(),
            ..Default::default()
        };

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&connection).unwrap()).unwrap();

        assert!(json.get("host").unwrap().is_null());
        assert!(json.get("password").is_none());
    }

    #[test]
    fn deserializes_with_missing_optional_fields() {
        let connection: Connection =
            serde_json::from_str(r#"{"connection_id":"db","conn_type":"postgres"}"#).unwrap();

        assert_eq!(connection.connection_id, "db");
        assert!(connection.host.is_none());
        assert!(connection.password.is_none());
    }
}
