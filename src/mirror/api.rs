//! HTTP transport for the mirror.
//!
//! `Backend` is the seam the collections talk through; `ApiClient` is the
//! reqwest implementation against this crate's own `/api` routes. Rows move
//! as untyped JSON so one transport serves every entity.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::models::UserProfile;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    #[error("http client build failed: {0}")]
    ClientBuild(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response parse failed: {0}")]
    Parse(String),
}

/// Row-level operations on a resource path such as `invoices` or
/// `components?clientId=...`. Enables mocking in tests.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Fetch every row at `path`.
    async fn list(&self, path: &str) -> Result<Vec<Value>, MirrorError>;

    /// Create a row; returns the stored row.
    async fn create(&self, path: &str, body: Value) -> Result<Value, MirrorError>;

    /// Patch the row `id` under `path`; returns the stored row.
    async fn update(&self, path: &str, id: Uuid, patch: Value) -> Result<Value, MirrorError>;

    /// Delete the row `id` under `path`.
    async fn delete(&self, path: &str, id: Uuid) -> Result<(), MirrorError>;
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
    user: UserProfile,
}

impl ApiClient {
    /// Client for the service at `base_url` (e.g. `http://localhost:3000`).
    ///
    /// # Errors
    ///
    /// Returns `ClientBuild` if the HTTP client cannot be constructed.
    pub fn new(base_url: &str) -> Result<Self, MirrorError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| MirrorError::ClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned(), token: None })
    }

    /// Use an existing session token for every request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Sign in with a password and keep the returned session token.
    ///
    /// # Errors
    ///
    /// Returns `Status` with 401 for bad credentials.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<UserProfile, MirrorError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let response = self
            .http
            .post(self.url("auth/login"))
            .json(&body)
            .send()
            .await
            .map_err(|e| MirrorError::Request(e.to_string()))?;
        let value = read_json(response).await?;
        let login: LoginResponse = serde_json::from_value(value).map_err(|e| MirrorError::Parse(e.to_string()))?;
        self.token = Some(login.token);
        Ok(login.user)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn item_url(&self, path: &str, id: Uuid) -> String {
        format!("{}/{id}", self.url(path))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, MirrorError> {
        self.authorized(request)
            .send()
            .await
            .map_err(|e| MirrorError::Request(e.to_string()))
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value, MirrorError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| MirrorError::Request(e.to_string()))?;
    if !status.is_success() {
        return Err(MirrorError::Status { status: status.as_u16(), body: text });
    }
    serde_json::from_str(&text).map_err(|e| MirrorError::Parse(e.to_string()))
}

#[async_trait::async_trait]
impl Backend for ApiClient {
    async fn list(&self, path: &str) -> Result<Vec<Value>, MirrorError> {
        let response = self.send(self.http.get(self.url(path))).await?;
        match read_json(response).await? {
            Value::Array(rows) => Ok(rows),
            other => Err(MirrorError::Parse(format!("expected array, got {other}"))),
        }
    }

    async fn create(&self, path: &str, body: Value) -> Result<Value, MirrorError> {
        let response = self.send(self.http.post(self.url(path)).json(&body)).await?;
        read_json(response).await
    }

    async fn update(&self, path: &str, id: Uuid, patch: Value) -> Result<Value, MirrorError> {
        let response = self
            .send(self.http.patch(self.item_url(path, id)).json(&patch))
            .await?;
        read_json(response).await
    }

    async fn delete(&self, path: &str, id: Uuid) -> Result<(), MirrorError> {
        let response = self.send(self.http.delete(self.item_url(path, id))).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(MirrorError::Status { status: status.as_u16(), body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_base_and_path() {
        let client = ApiClient::new("http://localhost:3000/").unwrap();
        assert_eq!(client.url("invoices"), "http://localhost:3000/api/invoices");
        assert_eq!(client.url("/tags"), "http://localhost:3000/api/tags");
        assert_eq!(
            client.item_url("payments", Uuid::nil()),
            "http://localhost:3000/api/payments/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn with_token_sets_bearer() {
        let client = ApiClient::new("http://x").unwrap().with_token("abc");
        assert_eq!(client.token(), Some("abc"));
    }

    #[tokio::test]
    async fn unreachable_server_is_request_error() {
        let client = ApiClient::new("http://127.0.0.1:1").unwrap();
        let err = client.list("clients").await.unwrap_err();
        assert!(matches!(err, MirrorError::Request(_)));
    }
}
