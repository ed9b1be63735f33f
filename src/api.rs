//! HTTP access to the remote todo service.
//!
//! Every response is wrapped in an [`Envelope`]. The client hands the envelope back
//! untouched; deciding whether `meta.status` means success is the synchronizer's job.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Status and timestamp carried alongside every payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub status: u16,
    #[serde(default)]
    pub timestamp: String,
}

/// The `{ meta, data }` wrapper every response uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub meta: Meta,
    #[serde(default)]
    pub data: T,
}

impl Envelope<Value> {
    /// Server-provided failure text, or a generic line naming the status.
    pub fn error_message(&self) -> String {
        serde_json::from_value::<ErrorBody>(self.data.clone())
            .map(|body| body.message)
            .unwrap_or_else(|_| format!("request failed with status {}", self.meta.status))
    }
}

/// Shape of `data` on a failed mutation.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("response from {path} is not a valid envelope: {source}")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

pub type ApiResult = Result<Envelope<Value>, ApiError>;

/// Remote operations the view needs. One call per method, no retries.
#[async_trait]
pub trait TodoApi: Send + Sync {
    async fn list(&self) -> ApiResult;
    async fn create(&self, title: &str) -> ApiResult;
    async fn complete(&self, id: &str) -> ApiResult;
    async fn delete(&self, id: &str) -> ApiResult;
    async fn complete_all(&self) -> ApiResult;
    async fn clear_completed(&self) -> ApiResult;
}

/// [`TodoApi`] over HTTP JSON.
#[derive(Debug, Clone)]
pub struct HttpTodoApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTodoApi {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, method: Method, path: String, body: Option<Value>) -> ApiResult {
        debug!(%method, %path, "sending request");
        let mut request = self
            .client
            .request(method.clone(), format!("{}{}", self.base_url, path));
        if let Some(body) = body {
            // .json() also sets Content-Type: application/json
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|source| {
            warn!(%method, %path, error = %source, "request failed");
            ApiError::Transport { path: path.clone(), source }
        })?;

        let http_status = response.status();
        let envelope = response
            .json::<Envelope<Value>>()
            .await
            .map_err(|source| {
                warn!(%method, %path, %http_status, error = %source, "undecodable response");
                ApiError::Decode { path: path.clone(), source }
            })?;
        debug!(%method, %path, status = envelope.meta.status, "response received");
        Ok(envelope)
    }
}

fn item_path(id: &str) -> String {
    format!("/todos/{}", urlencoding::encode(id))
}

#[async_trait]
impl TodoApi for HttpTodoApi {
    async fn list(&self) -> ApiResult {
        self.send(Method::GET, "/todos".into(), None).await
    }

    async fn create(&self, title: &str) -> ApiResult {
        self.send(Method::POST, "/todos".into(), Some(json!({ "title": title })))
            .await
    }

    async fn complete(&self, id: &str) -> ApiResult {
        self.send(Method::PATCH, item_path(id), Some(json!({ "completed": true })))
            .await
    }

    async fn delete(&self, id: &str) -> ApiResult {
        self.send(Method::DELETE, item_path(id), None).await
    }

    async fn complete_all(&self) -> ApiResult {
        self.send(Method::PATCH, "/todos/complete-batches".into(), None)
            .await
    }

    async fn clear_completed(&self) -> ApiResult {
        self.send(Method::DELETE, "/todos/completed".into(), None).await
    }
}
