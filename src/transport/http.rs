//! Production HTTP collaborator backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use crate::host::{HttpClient, HttpFailure, HttpMethod, WireRequest};
use crate::{Error, Result};

/// Timeout for binary result downloads, which carry no wire request of
/// their own to supply one.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// `reqwest`-based [`HttpClient`]. Connection pooling is configured once at
/// construction; per-request timeouts come from the wire request so that
/// long-running calls (thinking mode, video polling) can exceed the default.
pub struct ReqwestClient {
    client: reqwest::Client,
    download_timeout: Duration,
}

impl ReqwestClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(32)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            download_timeout: DOWNLOAD_TIMEOUT,
        })
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    fn failure_from_reqwest(err: reqwest::Error) -> HttpFailure {
        HttpFailure {
            status: err.status().map(|s| s.as_u16()),
            http_code: None,
            message: err.to_string(),
            description: String::new(),
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn request(&self, request: &WireRequest) -> std::result::Result<Value, HttpFailure> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder = builder.timeout(request.timeout);

        let response = builder.send().await.map_err(Self::failure_from_reqwest)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpFailure {
                status: Some(status.as_u16()),
                http_code: None,
                message: format!(
                    "{} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("HTTP error")
                ),
                description: body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(Self::failure_from_reqwest)
    }

    async fn download(&self, url: &str) -> std::result::Result<Bytes, HttpFailure> {
        let response = self
            .client
            .get(url)
            .timeout(self.download_timeout)
            .send()
            .await
            .map_err(Self::failure_from_reqwest)?;
        let status = response.status();
        if !status.is_success() {
            return Err(HttpFailure::with_status(
                status.as_u16(),
                format!("download failed: {}", status.as_u16()),
            ));
        }
        response.bytes().await.map_err(Self::failure_from_reqwest)
    }
}
