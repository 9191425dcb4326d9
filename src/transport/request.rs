//! The retry / circuit-breaker request loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::host::{CredentialStore, HttpClient, HttpFailure, HttpMethod, WireRequest};
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig};
use crate::transport::sanitize::sanitize;
use crate::{Error, Result};

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_BASE: Duration = Duration::from_millis(1000);
const DEFAULT_TIMEOUT: Duration = Duration::from_millis(60_000);
const RETRYABLE_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

/// Immutable description of one gateway request. Owned by the calling
/// action for the duration of a single [`Transport::perform_request`].
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub endpoint: String,
    pub body: Option<Value>,
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub timeout: Option<Duration>,
}

impl RequestDescriptor {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            endpoint: endpoint.into(),
            body: None,
            query: HashMap::new(),
            headers: HashMap::new(),
            timeout: None,
        }
    }

    pub fn post(endpoint: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            endpoint: endpoint.into(),
            body: Some(body),
            query: HashMap::new(),
            headers: HashMap::new(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Tunables for the transport. Defaults match the gateway policy; tests
/// shrink the delays so backoff assertions run in milliseconds.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub max_retries: u32,
    pub retry_delay_base: Duration,
    pub default_timeout: Duration,
    pub breaker: CircuitBreakerConfig,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            retry_delay_base: RETRY_DELAY_BASE,
            default_timeout: DEFAULT_TIMEOUT,
            breaker: CircuitBreakerConfig::default(),
        }
    }
}

/// The sole egress point for gateway HTTP calls.
///
/// One transport per process: the circuit breaker it owns is the only
/// persistent state in the core and is shared by every in-flight request.
pub struct Transport {
    http: Arc<dyn HttpClient>,
    credentials: Arc<dyn CredentialStore>,
    config: TransportConfig,
    breaker: CircuitBreaker,
}

impl Transport {
    pub fn new(http: Arc<dyn HttpClient>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self::with_config(http, credentials, TransportConfig::default())
    }

    pub fn with_config(
        http: Arc<dyn HttpClient>,
        credentials: Arc<dyn CredentialStore>,
        config: TransportConfig,
    ) -> Self {
        let breaker = CircuitBreaker::new(config.breaker.clone());
        Self {
            http,
            credentials,
            config,
            breaker,
        }
    }

    /// Breaker accessor for tests and diagnostics.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Fetch a binary resource through the HTTP collaborator. Downloads
    /// bypass retry policy: they target result URLs, not the gateway API.
    pub async fn download(&self, url: &str) -> Result<bytes::Bytes> {
        let credentials = self.credentials.resolve()?;
        self.http
            .download(url)
            .await
            .map_err(|failure| Error::Api(sanitize(&failure, &credentials.api_key)))
    }

    /// Execute a request against the gateway with retry, backoff, and the
    /// circuit-breaker gate. See the crate docs for the full policy.
    pub async fn perform_request(&self, descriptor: &RequestDescriptor) -> Result<Value> {
        let credentials = self.credentials.resolve()?;

        if let Err(remaining) = self.breaker.allow() {
            let retry_after_secs = remaining.as_secs_f64().ceil() as u64;
            tracing::warn!(
                endpoint = %descriptor.endpoint,
                retry_after_secs,
                "request rejected by open circuit breaker"
            );
            return Err(Error::CircuitOpen { retry_after_secs });
        }

        let wire = self.assemble(descriptor, &credentials.api_key, &credentials.base_url);

        let mut last_failure: HttpFailure;
        let mut attempt: u32 = 0;
        loop {
            tracing::debug!(
                method = wire.method.as_str(),
                url = %wire.url,
                attempt,
                "gateway request attempt"
            );
            match self.http.request(&wire).await {
                Ok(response) => {
                    self.breaker.on_success();
                    return Ok(response);
                }
                Err(failure) => {
                    let status = failure.status_code();

                    // 4xx (except 429) will not improve on retry.
                    if matches!(status, Some(s) if (400..500).contains(&s) && s != 429) {
                        self.breaker.on_failure();
                        return Err(Error::Api(sanitize(&failure, &credentials.api_key)));
                    }

                    let retryable =
                        matches!(status, Some(s) if RETRYABLE_STATUS_CODES.contains(&s));
                    if retryable && attempt < self.config.max_retries {
                        let delay = self.backoff_delay(attempt);
                        tracing::debug!(
                            status = status.unwrap_or(0),
                            delay_ms = delay.as_millis() as u64,
                            "transient failure, backing off before retry"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    last_failure = failure;
                    break;
                }
            }
        }

        self.breaker.on_failure();
        Err(Error::Api(sanitize(&last_failure, &credentials.api_key)))
    }

    /// Exponential backoff: `base * 2^attempt` (1s, 2s, 4s at defaults).
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.config.retry_delay_base.as_millis() as u64;
        Duration::from_millis(base_ms.saturating_mul(1u64 << attempt.min(32)))
    }

    fn assemble(
        &self,
        descriptor: &RequestDescriptor,
        api_key: &str,
        base_url: &str,
    ) -> WireRequest {
        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), format!("Bearer {api_key}"));
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        // Caller-supplied overrides win on conflict.
        for (name, value) in &descriptor.headers {
            headers.insert(name.clone(), value.clone());
        }

        WireRequest {
            method: descriptor.method,
            url: format!("{base_url}{}", descriptor.endpoint),
            headers,
            body: descriptor.body.clone(),
            query: descriptor.query.clone(),
            timeout: descriptor.timeout.unwrap_or(self.config.default_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::StaticCredentials;
    use serde_json::json;

    fn transport() -> Transport {
        struct NoHttp;
        #[async_trait::async_trait]
        impl HttpClient for NoHttp {
            async fn request(
                &self,
                _request: &WireRequest,
            ) -> std::result::Result<Value, HttpFailure> {
                panic!("no HTTP expected in assembly tests");
            }
            async fn download(
                &self,
                _url: &str,
            ) -> std::result::Result<bytes::Bytes, HttpFailure> {
                panic!("no HTTP expected in assembly tests");
            }
        }
        Transport::new(
            Arc::new(NoHttp),
            Arc::new(StaticCredentials::new("sk-test", "https://gw.example.com")),
        )
    }

    #[test]
    fn assemble_merges_default_and_override_headers() {
        let t = transport();
        let descriptor = RequestDescriptor::post("/v1/chat/completions", json!({}))
            .with_header("Content-Type", "application/x-ndjson")
            .with_header("X-Trace", "abc");
        let wire = t.assemble(&descriptor, "sk-test", "https://gw.example.com");

        assert_eq!(wire.url, "https://gw.example.com/v1/chat/completions");
        assert_eq!(wire.headers["Authorization"], "Bearer sk-test");
        // Caller override beats the default.
        assert_eq!(wire.headers["Content-Type"], "application/x-ndjson");
        assert_eq!(wire.headers["X-Trace"], "abc");
    }

    #[test]
    fn assemble_applies_default_timeout() {
        let t = transport();
        let wire = t.assemble(
            &RequestDescriptor::get("/v1/videos/generations"),
            "sk-test",
            "https://gw.example.com",
        );
        assert_eq!(wire.timeout, Duration::from_millis(60_000));

        let wire = t.assemble(
            &RequestDescriptor::get("/x").with_timeout(Duration::from_millis(120_000)),
            "sk-test",
            "https://gw.example.com",
        );
        assert_eq!(wire.timeout, Duration::from_millis(120_000));
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let t = transport();
        assert_eq!(t.backoff_delay(0), Duration::from_millis(1000));
        assert_eq!(t.backoff_delay(1), Duration::from_millis(2000));
        assert_eq!(t.backoff_delay(2), Duration::from_millis(4000));
    }
}
