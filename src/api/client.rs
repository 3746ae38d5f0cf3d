//! HTTP client for the collections backend

use super::error::ApiError;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

/// Maximum length of response body to log
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Truncate a response body and strip control characters before logging it
pub(crate) fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.chars().count() > MAX_LOG_BODY_LENGTH {
        let head: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} bytes total]", head, body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control() && c != ' ', "")
}

/// JSON-over-HTTP client shared by every resource controller
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    /// Create a new client with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(concat!("sygt/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    pub async fn get(&self, url: &str) -> Result<Value, ApiError> {
        tracing::debug!("GET {}", url);
        self.execute(self.client.get(url)).await
    }

    pub async fn post(&self, url: &str, body: &Value) -> Result<Value, ApiError> {
        tracing::debug!("POST {}", url);
        self.execute(self.client.post(url).json(body)).await
    }

    pub async fn put(&self, url: &str, body: &Value) -> Result<Value, ApiError> {
        tracing::debug!("PUT {}", url);
        self.execute(self.client.put(url).json(body)).await
    }

    pub async fn delete(&self, url: &str) -> Result<Value, ApiError> {
        tracing::debug!("DELETE {}", url);
        self.execute(self.client.delete(url)).await
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!("Request failed before a response: {}", e);
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !status.is_success() {
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // DELETE and some PUTs answer with an empty body
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Invalid JSON from backend: {} - {}", e, sanitize_for_log(&body));
            ApiError::Decode(e.to_string())
        })
    }
}
