use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::RwLock;
use std::time::Duration;

use super::keys::ResourceKey;

/// Why a request to the API did not produce data. Stored in cache entries,
/// so every subscriber of a key sees the same error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Reads the current value of a resource. The cache only ever talks to
/// the network through this trait.
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    async fn fetch(&self, key: &ResourceKey) -> Result<Value, TransportError>;
}

/// reqwest-backed client for the API. Unwraps the `{"success", "data"}`
/// envelope and turns error bodies into [`TransportError::Http`].
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    pub fn with_token(self, token: Option<String>) -> Self {
        self.set_token(token);
        self
    }

    pub fn set_token(&self, token: Option<String>) {
        let mut guard = self.token.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        decode(self.send(Method::GET, path, None::<&()>).await?)
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, TransportError> {
        decode(self.send(Method::POST, path, Some(body)).await?)
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, TransportError> {
        decode(self.send(Method::PUT, path, Some(body)).await?)
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        decode(self.send(Method::DELETE, path, None::<&()>).await?)
    }

    async fn send<B: Serialize + ?Sized>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Value, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(token) = self.token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        unwrap_envelope(status, &text)
    }
}

#[async_trait]
impl Fetcher for HttpTransport {
    async fn fetch(&self, key: &ResourceKey) -> Result<Value, TransportError> {
        self.send(Method::GET, &key.to_string(), None::<&()>).await
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, TransportError> {
    serde_json::from_value(value).map_err(|e| TransportError::Decode(e.to_string()))
}

/// Success bodies yield their `data` member; anything else becomes an
/// HTTP error carrying the server's `message` when there is one.
fn unwrap_envelope(status: StatusCode, body: &str) -> Result<Value, TransportError> {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    if status.is_success() {
        let mut value = parsed.ok_or_else(|| TransportError::Decode(format!("Response from server is not JSON: {}", body)))?;
        return Ok(match value.get_mut("data") {
            Some(data) => data.take(),
            None => value,
        });
    }

    let message = parsed
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

    Err(TransportError::Http {
        status: status.as_u16(),
        message,
    })
}
