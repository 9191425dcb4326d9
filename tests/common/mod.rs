//! Shared test doubles: a scripted HTTP collaborator that records every
//! wire request and replays queued outcomes.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use deerapi_node::host::{HttpClient, HttpFailure, StaticCredentials, WireRequest};
use deerapi_node::resilience::CircuitBreakerConfig;
use deerapi_node::transport::{Transport, TransportConfig};

pub type HttpOutcome = Result<Value, HttpFailure>;

#[derive(Default)]
pub struct ScriptedHttp {
    outcomes: Mutex<VecDeque<HttpOutcome>>,
    downloads: Mutex<VecDeque<Result<Bytes, HttpFailure>>>,
    calls: Mutex<Vec<WireRequest>>,
    download_calls: Mutex<Vec<String>>,
}

impl ScriptedHttp {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, outcome: HttpOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn push_download(&self, outcome: Result<Bytes, HttpFailure>) {
        self.downloads.lock().unwrap().push_back(outcome);
    }

    pub fn calls(&self) -> Vec<WireRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn download_calls(&self) -> Vec<String> {
        self.download_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttp {
    async fn request(&self, request: &WireRequest) -> Result<Value, HttpFailure> {
        self.calls.lock().unwrap().push(request.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected request to {}", request.url))
    }

    async fn download(&self, url: &str) -> Result<Bytes, HttpFailure> {
        self.download_calls.lock().unwrap().push(url.to_string());
        self.downloads
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected download of {url}"))
    }
}

/// Route crate tracing through a test subscriber; `RUST_LOG` controls
/// verbosity. Safe to call from every test, only the first init wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Transport over a scripted client with millisecond-scale backoff so retry
/// tests do not sleep for real.
pub fn fast_transport(http: Arc<ScriptedHttp>) -> Transport {
    init_tracing();
    Transport::with_config(
        http,
        Arc::new(StaticCredentials::new("sk-test-key", "https://gw.test")),
        TransportConfig {
            max_retries: 3,
            retry_delay_base: Duration::from_millis(2),
            default_timeout: Duration::from_millis(60_000),
            breaker: CircuitBreakerConfig::default(),
        },
    )
}

pub fn server_error(status: u16) -> HttpFailure {
    HttpFailure::with_status(status, format!("upstream returned {status}"))
}
