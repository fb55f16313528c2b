//! Variable API models and endpoints

use serde::{Deserialize, Serialize};

use super::client::Client;
use super::error::ApiError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Variable {
    pub key: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

pub struct VariablesApi<'a> {
    client: &'a Client,
}

impl<'a> VariablesApi<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn create(&self, variable: &Variable) -> Result<Variable, ApiError> {
        self.client.post("/variables", variable).await
    }

    pub async fn get(&self, key: &str) -> Result<Variable, ApiError> {
        self.client
            .get(&format!("/variables/{}", urlencoding::encode(key)))
            .await
    }

    pub async fn update(&self, key: &str, variable: &Variable) -> Result<Variable, ApiError> {
        self.client
            .patch(&format!("/variables/{}", urlencoding::encode(key)), variable)
            .await
    }

    pub async fn delete(&self, key: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/variables/{}", urlencoding::encode(key)))
            .await
    }
}
