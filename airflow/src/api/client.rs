//! Airflow REST API client
//!
//! Thin reqwest wrapper targeting `{endpoint}/api/v1`. Transient failures
//! (429, 5xx, timeouts, connection resets) are retried with exponential
//! backoff; 401 and 404 map to dedicated error variants so callers can give
//! them lifecycle meaning.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::common::{ApiErrorBody, ApiQueryParams};
use super::error::ApiError;

/// Credentials for the Airflow API.
#[derive(Clone)]
pub enum Auth {
    Basic { username: String, password: String },
    Bearer(String),
}

#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    auth: Auth,
    retry_config: RetryConfig,
}

#[derive(Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            timeout_seconds: 30,
        }
    }
}

impl Client {
    /// Create a new API client with default retry configuration.
    pub fn new(endpoint: &str, auth: Auth, insecure: bool) -> Result<Self, ApiError> {
        Self::with_config(endpoint, auth, insecure, RetryConfig::default())
    }

    /// Create a new API client with custom retry configuration.
    pub fn with_config(
        endpoint: &str,
        auth: Auth,
        insecure: bool,
        retry_config: RetryConfig,
    ) -> Result<Self, ApiError> {
        url::Url::parse(endpoint).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", endpoint, e)))?;

        let http_client = reqwest::Client::builder()
            .danger_accept_invalid_certs(insecure)
            .timeout(Duration::from_secs(retry_config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        let base_url = format!("{}/api/v1", endpoint.trim_end_matches('/'));

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                auth,
                retry_config,
            }),
        })
    }

    /// Connection API operations
    pub fn connections(&self) -> super::connection::ConnectionsApi<'_> {
        super::connection::ConnectionsApi::new(self)
    }

    /// Pool API operations
    pub fn pools(&self) -> super::pool::PoolsApi<'_> {
        super::pool::PoolsApi::new(self)
    }

    /// Variable API operations
    pub fn variables(&self) -> super::variable::VariablesApi<'_> {
        super::variable::VariablesApi::new(self)
    }

    /// User API operations
    pub fn users(&self) -> super::user::UsersApi<'_> {
        super::user::UsersApi::new(self)
    }

    /// Execute a GET request and deserialize the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .execute_with_retry(
                || async {
                    let url = format!("{}{}", self.inner.base_url, path);
                    tracing::debug!("GET {}", url);
                    self.authorized(self.inner.http_client.get(&url)).send().await
                },
                path,
            )
            .await?;

        self.parse_response(response).await
    }

    /// Execute a POST request with a JSON body.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .execute_with_retry(
                || async {
                    let url = format!("{}{}", self.inner.base_url, path);
                    tracing::debug!("POST {}", url);
                    self.authorized(self.inner.http_client.post(&url))
                        .json(body)
                        .send()
                        .await
                },
                path,
            )
            .await?;

        self.parse_response(response).await
    }

    /// Execute a PATCH request with a JSON body.
    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .execute_with_retry(
                || async {
                    let url = format!("{}{}", self.inner.base_url, path);
                    tracing::debug!("PATCH {}", url);
                    self.authorized(self.inner.http_client.patch(&url))
                        .json(body)
                        .send()
                        .await
                },
                path,
            )
            .await?;

        self.parse_response(response).await
    }

    /// Execute a PATCH request with query parameters (`update_mask`).
    pub async fn patch_with_params<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        params: &ApiQueryParams,
        body: &B,
    ) -> Result<T, ApiError> {
        let full_path = format!("{}{}", path, params.to_query_string());
        self.patch(&full_path, body).await
    }

    /// Execute a DELETE request; the Airflow API answers 204 on success.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute_with_retry(
            || async {
                let url = format!("{}{}", self.inner.base_url, path);
                tracing::debug!("DELETE {}", url);
                self.authorized(self.inner.http_client.delete(&url))
                    .send()
                    .await
            },
            path,
        )
        .await?;

        Ok(())
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.inner.auth {
            Auth::Basic { username, password } => builder.basic_auth(username, Some(password)),
            Auth::Bearer(token) => builder.bearer_auth(token),
        }
    }

    async fn execute_with_retry<F, Fut>(
        &self,
        request_fn: F,
        path: &str,
    ) -> Result<reqwest::Response, ApiError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.inner.retry_config.max_retries {
            if attempt > 0 {
                let backoff = std::cmp::min(
                    self.inner.retry_config.initial_backoff_ms * (2_u64.pow(attempt - 1)),
                    self.inner.retry_config.max_backoff_ms,
                );
                tracing::debug!(
                    "retrying request to {} after {}ms (attempt {})",
                    path,
                    backoff,
                    attempt
                );
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            match request_fn().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response);
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        return Err(ApiError::AuthError);
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(ApiError::NotFound);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(ApiError::RateLimited);
                    } else if status.is_server_error() {
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else {
                        return Err(Self::error_from_response(response).await);
                    }
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error =
                            Some(ApiError::Timeout(self.inner.retry_config.timeout_seconds));
                    } else if e.is_connect() || e.is_request() {
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else {
                        return Err(ApiError::RequestError(e));
                    }
                }
            }

            attempt += 1;
        }

        Err(last_error.unwrap_or(ApiError::ServiceUnavailable))
    }

    async fn error_from_response(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let body = serde_json::from_str::<ApiErrorBody>(&message)
            .ok()
            .map(Box::new);

        ApiError::ApiError {
            status,
            message,
            body,
        }
    }

    async fn parse_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        tracing::trace!(body = %text, "api response");

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!("failed to deserialize response: {}, body: {}", e, text);
            ApiError::ParseError(format!("failed to parse response: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::variable::Variable;
    use mockito::Server;

    fn basic_auth() -> Auth {
        Auth::Basic {
            username: "admin".to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn client_rejects_invalid_endpoint() {
        let result = Client::new("not a url", basic_auth(), false);
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn client_sends_basic_auth_and_parses_response() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/variables/foo")
            .match_header("authorization", "Basic YWRtaW46c2VjcmV0")
            .with_body(r#"{"key":"foo","value":"bar"}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), basic_auth(), false).unwrap();
        let variable: Variable = client.get("/variables/foo").await.unwrap();

        assert_eq!(variable.key, "foo");
        assert_eq!(variable.value, "bar");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_sends_bearer_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/variables/foo")
            .match_header("authorization", "Bearer tok123")
            .with_body(r#"{"key":"foo","value":"bar"}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), Auth::Bearer("tok123".to_string()), false).unwrap();
        let _: Variable = client.get("/variables/foo").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_maps_401_to_auth_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/variables/foo")
            .with_status(401)
            .create_async()
            .await;

        let client = Client::new(&server.url(), basic_auth(), false).unwrap();
        let result: Result<Variable, ApiError> = client.get("/variables/foo").await;

        assert!(matches!(result, Err(ApiError::AuthError)));
    }

    #[tokio::test]
    async fn client_maps_404_to_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/variables/missing")
            .with_status(404)
            .with_body(r#"{"title":"Variable not found","status":404}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), basic_auth(), false).unwrap();
        let result: Result<Variable, ApiError> = client.get("/variables/missing").await;

        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn client_surfaces_airflow_error_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/variables/foo")
            .with_status(409)
            .with_body(r#"{"title":"Conflict","status":409,"detail":"already exists"}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), basic_auth(), false).unwrap();
        let result: Result<Variable, ApiError> = client.get("/variables/foo").await;

        match result {
            Err(ApiError::ApiError { status, body, .. }) => {
                assert_eq!(status, 409);
                assert_eq!(body.unwrap().title.as_deref(), Some("Conflict"));
            }
            other => panic!("expected ApiError, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn client_retries_server_errors() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/variables/foo")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let retry_config = RetryConfig {
            max_retries: 1,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
            timeout_seconds: 5,
        };
        let client =
            Client::with_config(&server.url(), basic_auth(), false, retry_config).unwrap();
        let result: Result<Variable, ApiError> = client.get("/variables/foo").await;

        assert!(matches!(result, Err(ApiError::ServiceUnavailable)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_strips_trailing_slash_from_endpoint() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/variables/foo")
            .with_body(r#"{"key":"foo","value":"bar"}"#)
            .create_async()
            .await;

        let client = Client::new(&format!("{}/", server.url()), basic_auth(), false).unwrap();
        let _: Variable = client.get("/variables/foo").await.unwrap();

        mock.assert_async().await;
    }
}
