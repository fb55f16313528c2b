//! Common types and utilities for the Airflow REST API

use serde::Deserialize;
use std::fmt;

/// Error body returned by the Airflow API, following RFC 7807 problem
/// details. Every field is optional in practice.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub title: Option<String>,
    pub status: Option<u16>,
    pub detail: Option<String>,
}

impl fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title.as_deref().unwrap_or("unknown error"))?;
        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiErrorBody {}

/// Query string builder for endpoints taking parameters such as
/// `update_mask`.
#[derive(Debug, Clone, Default)]
pub struct ApiQueryParams {
    params: Vec<(String, String)>,
}

impl ApiQueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn add_optional<K: Into<String>, V: ToString>(mut self, key: K, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.params.push((key.into(), v.to_string()));
        }
        self
    }

    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            String::new()
        } else {
            format!(
                "?{}",
                self.params
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                    .collect::<Vec<_>>()
                    .join("&")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_params_produce_no_query_string() {
        assert_eq!(ApiQueryParams::new().to_query_string(), "");
    }

    #[test]
    fn params_are_encoded() {
        let params = ApiQueryParams::new()
            .add("update_mask", "roles")
            .add("limit", 25);
        assert_eq!(params.to_query_string(), "?update_mask=roles&limit=25");

        let params = ApiQueryParams::new().add("key", "a b&c");
        assert_eq!(params.to_query_string(), "?key=a%20b%26c");
    }

    #[test]
    fn add_optional_skips_none() {
        let params = ApiQueryParams::new().add_optional("update_mask", None::<&str>);
        assert_eq!(params.to_query_string(), "");
    }

    #[test]
    fn error_body_parses_problem_details() {
        let body: ApiErrorBody = serde_json::from_str(
            r#"{"type":"about:blank","title":"Conflict","status":409,"detail":"Connection already exists"}"#,
        )
        .unwrap();

        assert_eq!(body.status, Some(409));
        assert_eq!(body.to_string(), "Conflict: Connection already exists");
    }
}
