//! Client for the companion backend.
//!
//! The companion backend hosts accounts, API keys and a remote batch
//! endpoint. Authenticated calls send the key pair as `X-API-KEY` and
//! `X-SECRET-KEY` headers.

use std::fmt;

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::batch::BatchRequest;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-API-KEY";
/// Header carrying the secret key.
pub const SECRET_KEY_HEADER: &str = "X-SECRET-KEY";

/// Errors from the companion backend.
#[derive(Debug, thiserror::Error)]
pub enum CompanionError {
    /// Transport failure or undecodable body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an error.
    #[error("rejected ({status}): {error}")]
    Rejected { status: u16, error: String },

    /// An authenticated call was made without credentials.
    #[error("no API credentials configured")]
    MissingCredentials,

    /// The response did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result type for companion calls.
pub type CompanionResult<T> = Result<T, CompanionError>;

/// API key pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCredentials {
    pub api_key: String,
    pub secret_key: String,
}

/// Liveness answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingResponse {
    pub status: String,
    #[serde(default)]
    pub cells: Vec<String>,
}

/// Account details returned on login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub email: String,
}

/// Login answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub api_key: String,
    pub secret_key: String,
    pub user: UserInfo,
}

impl LoginResponse {
    /// The key pair for subsequent calls.
    pub fn credentials(&self) -> ApiCredentials {
        ApiCredentials {
            api_key: self.api_key.clone(),
            secret_key: self.secret_key.clone(),
        }
    }
}

/// Key id; the backend may use numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyId {
    Int(i64),
    Text(String),
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyId::Int(id) => write!(f, "{}", id),
            KeyId::Text(id) => write!(f, "{}", id),
        }
    }
}

/// One API key as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyInfo {
    pub id: KeyId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_used: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Deserialize)]
struct KeyList {
    #[serde(default)]
    keys: Vec<ApiKeyInfo>,
}

/// Parameters for a new API key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewApiKey {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Cells the key may run; empty means all.
    #[serde(default)]
    pub allowed_cells: Vec<String>,
}

#[derive(Deserialize)]
struct BatchResults {
    #[serde(default)]
    results: Map<String, Value>,
}

/// Companion backend client.
#[derive(Debug, Clone)]
pub struct CompanionClient {
    http: reqwest::Client,
    base: String,
    credentials: Option<ApiCredentials>,
}

impl CompanionClient {
    /// Create a client for a backend base URL.
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base)
    }

    /// Create a client sharing an existing HTTP client.
    pub fn with_client(http: reqwest::Client, base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            http,
            base: base.trim_end_matches('/').to_string(),
            credentials: None,
        }
    }

    /// Attach credentials for authenticated calls.
    pub fn with_credentials(mut self, credentials: ApiCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Backend base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base, path))
    }

    fn authed(&self, method: Method, path: &str) -> CompanionResult<RequestBuilder> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(CompanionError::MissingCredentials)?;
        Ok(self
            .request(method, path)
            .header(API_KEY_HEADER, &credentials.api_key)
            .header(SECRET_KEY_HEADER, &credentials.secret_key))
    }

    /// `GET /ping`.
    pub async fn ping(&self) -> CompanionResult<PingResponse> {
        let response = self.request(Method::GET, "/ping").send().await?;
        read(response).await
    }

    /// `POST /ai-api`: run a batch remotely.
    pub async fn run_batch(&self, batch: &BatchRequest) -> CompanionResult<Map<String, Value>> {
        let mut request = self.request(Method::POST, "/ai-api").json(batch);
        if let Some(credentials) = &self.credentials {
            request = request
                .header(API_KEY_HEADER, &credentials.api_key)
                .header(SECRET_KEY_HEADER, &credentials.secret_key);
        }
        let response = request.send().await?;
        let body: BatchResults = read(response).await?;
        Ok(body.results)
    }

    /// `POST /api/login`.
    pub async fn login(&self, email: &str, password: &str) -> CompanionResult<LoginResponse> {
        let response = self
            .request(Method::POST, "/api/login")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        read(response).await
    }

    /// `POST /api/register`.
    pub async fn register(&self, email: &str, password: &str) -> CompanionResult<Value> {
        let response = self
            .request(Method::POST, "/api/register")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        read(response).await
    }

    /// `GET /api/list-keys`.
    pub async fn list_keys(&self) -> CompanionResult<Vec<ApiKeyInfo>> {
        let response = self.authed(Method::GET, "/api/list-keys")?.send().await?;
        let list: KeyList = read(response).await?;
        Ok(list.keys)
    }

    /// `POST /api/create-api-key`.
    pub async fn create_api_key(&self, key: &NewApiKey) -> CompanionResult<ApiCredentials> {
        let response = self
            .authed(Method::POST, "/api/create-api-key")?
            .json(key)
            .send()
            .await?;
        read(response).await
    }

    /// `POST /api/revoke-key/<id>`.
    pub async fn revoke_key(&self, id: &KeyId) -> CompanionResult<()> {
        let path = format!("/api/revoke-key/{}", id);
        let response = self.authed(Method::POST, &path)?.send().await?;
        let _: Value = read(response).await?;
        Ok(())
    }
}

/// Decode a backend response, surfacing its `error` field on failure.
async fn read<T: DeserializeOwned>(response: Response) -> CompanionResult<T> {
    let status = response.status();
    let text = response.text().await?;
    let body: Value = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };

    let flagged_failure = [body.get("success"), body.get("ok")]
        .into_iter()
        .flatten()
        .any(|flag| flag == &Value::Bool(false));

    if !status.is_success() || flagged_failure {
        let error = body
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
        return Err(CompanionError::Rejected {
            status: status.as_u16(),
            error,
        });
    }

    Ok(serde_json::from_value(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = CompanionClient::new("http://localhost:5000/");
        assert_eq!(client.base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_key_id_display() {
        let ids: Vec<KeyId> = serde_json::from_str(r#"[7, "k-7"]"#).unwrap();
        assert_eq!(ids[0].to_string(), "7");
        assert_eq!(ids[1].to_string(), "k-7");
    }

    #[tokio::test]
    async fn test_authenticated_call_needs_credentials() {
        let client = CompanionClient::new("http://127.0.0.1:9");
        assert!(matches!(
            client.list_keys().await,
            Err(CompanionError::MissingCredentials)
        ));
    }
}
