//! Host collaborator seams.
//!
//! The node core never talks to the outside world directly: credentials and
//! raw HTTP execution are injected through the traits here. Production wires
//! in [`SystemCredentials`] and [`crate::transport::ReqwestClient`]; tests
//! substitute scripted implementations.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use keyring::Entry;
use serde_json::Value;

use crate::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.deerapi.com";

/// Resolved gateway credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: String,
    pub base_url: String,
}

/// Source of gateway credentials. The host owns the credential lifecycle;
/// the core only ever sees the resolved pair.
pub trait CredentialStore: Send + Sync {
    fn resolve(&self) -> Result<Credentials>;
}

/// Fixed credentials, for tests and for hosts that manage keys themselves.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    credentials: Credentials,
}

impl StaticCredentials {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            credentials: Credentials {
                api_key: api_key.into(),
                base_url: base_url.into(),
            },
        }
    }

    pub fn with_default_base_url(api_key: impl Into<String>) -> Self {
        Self::new(api_key, DEFAULT_BASE_URL)
    }
}

impl CredentialStore for StaticCredentials {
    fn resolve(&self) -> Result<Credentials> {
        Ok(self.credentials.clone())
    }
}

/// System credential lookup: OS keyring first, environment second.
///
/// The keyring entry is `deerapi-node` / `deerapi`; the environment
/// fallbacks are `DEERAPI_API_KEY` and `DEERAPI_BASE_URL`.
#[derive(Debug, Clone, Default)]
pub struct SystemCredentials;

impl SystemCredentials {
    fn api_key_from_keyring() -> Option<String> {
        let entry = Entry::new("deerapi-node", "deerapi").ok()?;
        entry.get_password().ok()
    }
}

impl CredentialStore for SystemCredentials {
    fn resolve(&self) -> Result<Credentials> {
        let api_key = Self::api_key_from_keyring()
            .or_else(|| env::var("DEERAPI_API_KEY").ok())
            .ok_or_else(|| {
                Error::Configuration(
                    "no API key found in keyring or DEERAPI_API_KEY".to_string(),
                )
            })?;
        let base_url =
            env::var("DEERAPI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Credentials { api_key, base_url })
    }
}

/// HTTP method for a wire request. Only the verbs the gateway contract uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// Fully assembled outbound request, ready for the HTTP collaborator.
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
    pub query: HashMap<String, String>,
    pub timeout: Duration,
}

/// Raw failure reported by the HTTP collaborator, before sanitization.
///
/// The status code may arrive numerically (`status`) or as a string
/// (`http_code`), depending on which layer of the host stack produced it.
#[derive(Debug, Clone, Default)]
pub struct HttpFailure {
    pub status: Option<u16>,
    pub http_code: Option<String>,
    pub message: String,
    pub description: String,
}

impl HttpFailure {
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            http_code: None,
            message: message.into(),
            description: String::new(),
        }
    }

    pub fn without_status(message: impl Into<String>) -> Self {
        Self {
            status: None,
            http_code: None,
            message: message.into(),
            description: String::new(),
        }
    }

    /// Effective status code: numeric field first, string field second.
    pub fn status_code(&self) -> Option<u16> {
        self.status
            .or_else(|| self.http_code.as_deref().and_then(|c| c.parse().ok()))
    }
}

/// HTTP execution collaborator. The sole way bytes leave the process.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute a JSON request and decode the response body.
    async fn request(&self, request: &WireRequest) -> std::result::Result<Value, HttpFailure>;

    /// Fetch a binary resource (generated images, rendered videos).
    async fn download(&self, url: &str) -> std::result::Result<Bytes, HttpFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_prefers_numeric_field() {
        let failure = HttpFailure {
            status: Some(500),
            http_code: Some("429".into()),
            ..Default::default()
        };
        assert_eq!(failure.status_code(), Some(500));
    }

    #[test]
    fn status_code_falls_back_to_string_field() {
        let failure = HttpFailure {
            http_code: Some("404".into()),
            ..Default::default()
        };
        assert_eq!(failure.status_code(), Some(404));

        let garbage = HttpFailure {
            http_code: Some("ECONNRESET".into()),
            ..Default::default()
        };
        assert_eq!(garbage.status_code(), None);
    }

    #[test]
    fn static_credentials_resolve_verbatim() {
        let store = StaticCredentials::new("sk-test", "https://gw.example.com");
        let creds = store.resolve().unwrap();
        assert_eq!(creds.api_key, "sk-test");
        assert_eq!(creds.base_url, "https://gw.example.com");
    }
}
