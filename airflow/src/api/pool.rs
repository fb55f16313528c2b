//! Pool API models and endpoints

use serde::{Deserialize, Serialize};

use super::client::Client;
use super::error::ApiError;

/// Pool as exchanged with `/pools`. The slot gauges are reported by the
/// scheduler and never written back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pool {
    pub name: String,
    pub slots: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub include_deferred: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupied_slots: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queued_slots: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_slots: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running_slots: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deferred_slots: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_slots: Option<i64>,
}

pub struct PoolsApi<'a> {
    client: &'a Client,
}

impl<'a> PoolsApi<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn create(&self, pool: &Pool) -> Result<Pool, ApiError> {
        self.client.post("/pools", pool).await
    }

    pub async fn get(&self, name: &str) -> Result<Pool, ApiError> {
        self.client
            .get(&format!("/pools/{}", urlencoding::encode(name)))
            .await
    }

    pub async fn update(&self, name: &str, pool: &Pool) -> Result<Pool, ApiError> {
        self.client
            .patch(&format!("/pools/{}", urlencoding::encode(name)), pool)
            .await
    }

    pub async fn delete(&self, name: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/pools/{}", urlencoding::encode(name)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_model_omits_scheduler_gauges() {
        let pool = Pool {
            name: "workers".to_string(),
            slots: 16,
            include_deferred: true,
            ..Default::default()
        };

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&pool).unwrap()).unwrap();

        assert_eq!(json.get("slots").unwrap(), 16);
        assert_eq!(json.get("include_deferred").unwrap(), true);
        assert!(json.get("occupied_slots").is_none());
    }

    #[test]
    fn read_model_accepts_gauges() {
        let pool: Pool = serde_json::from_str(
            r#"{"name":"workers","slots":16,"occupied_slots":3,"open_slots":13,"include_deferred":false}"#,
        )
        .unwrap();

        assert_eq!(pool.occupied_slots, Some(3));
        assert_eq!(pool.open_slots, Some(13));
        assert!(!pool.include_deferred);
    }
}
