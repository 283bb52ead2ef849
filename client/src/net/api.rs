//! Gateway port plus the reqwest-backed implementation.
//!
//! ERROR HANDLING
//! ==============
//! Transport errors, non-2xx statuses, and undecodable bodies all surface as
//! [`GatewayError`]. The conversation state turns every one of them into the
//! same apology bubble, so the variants exist for logging only.

use std::time::Duration;

use wire::{CHAT_PATH, ChatReply, ChatRequest, ErrorBody};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("gateway returned status {status}: {error}")]
    Status { status: u16, error: String },
}

/// Anything that can answer a chat request with the assistant's reply text.
#[async_trait::async_trait]
pub trait ChatGateway: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`GatewayError`] when no reply text could be obtained.
    async fn send(&self, request: &ChatRequest) -> Result<String, GatewayError>;
}

/// `POST {base_url}/api/chat` over HTTP.
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidBaseUrl`] unless `base_url` is an
    /// absolute `http`/`https` URL, or [`GatewayError::Http`] if the client
    /// cannot be built.
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(GatewayError::InvalidBaseUrl(base_url));
        }
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { http, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /healthz`.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the gateway is unreachable or unhealthy.
    pub async fn health(&self) -> Result<(), GatewayError> {
        let resp = self.http.get(format!("{}/healthz", self.base_url)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GatewayError::Status { status: status.as_u16(), error: String::new() });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ChatGateway for HttpGateway {
    async fn send(&self, request: &ChatRequest) -> Result<String, GatewayError> {
        let resp = self
            .http
            .post(format!("{}{CHAT_PATH}", self.base_url))
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let error = resp
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_default();
            return Err(GatewayError::Status { status: status.as_u16(), error });
        }

        Ok(resp.json::<ChatReply>().await?.message)
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;
