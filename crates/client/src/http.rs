//! Shared HTTP client for the CampEase REST API.
//!
//! The only cross-cutting behaviour is bearer injection: when a token is
//! available it is attached to every outgoing request. Everything else is a
//! pass-through over `reqwest`.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Supplies the bearer token for outgoing requests, if any.
pub trait BearerSource: Send + Sync {
    fn bearer(&self) -> Option<String>;
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    bearer: Option<Arc<dyn BearerSource>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.bearer.is_some())
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(base_url, reqwest::Client::new())
    }

    pub fn with_http(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            bearer: None,
        }
    }

    /// Attach a bearer source consulted on every request.
    pub fn with_bearer(mut self, source: Arc<dyn BearerSource>) -> Self {
        self.bearer = Some(source);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        send_json(self.request(Method::GET, path)).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        send_json(self.request(Method::POST, path).json(body)).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        send_json(self.request(Method::PUT, path).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        send(self.request(Method::DELETE, path)).await.map(|_| ())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let req = self.http.request(method, url);

        match self.bearer.as_ref().and_then(|source| source.bearer()) {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

async fn send(req: RequestBuilder) -> Result<String, ApiError> {
    let resp = req.send().await.map_err(|e| ApiError::Network(e.to_string()))?;

    let status = resp.status();
    let body = resp.text().await.map_err(|e| ApiError::Network(e.to_string()))?;

    if !status.is_success() {
        tracing::debug!(status = status.as_u16(), "API request failed");
        return Err(ApiError::Api(status.as_u16(), body));
    }

    Ok(body)
}

/// Empty bodies (204, bare 200) deserialize as JSON `null`.
async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ApiError> {
    let body = send(req).await?;
    let body = if body.trim().is_empty() { "null" } else { body.as_str() };
    serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({0}): {1}")]
    Api(u16, String),
    #[error("parse error: {0}")]
    Parse(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api(status, _) => Some(*status),
            _ => None,
        }
    }
}
