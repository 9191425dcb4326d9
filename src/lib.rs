//! # deerapi-node
//!
//! Core of a workflow-automation node for the DeerAPI multi-model AI
//! gateway. The host drives action handlers with parameter structs; this
//! crate turns them into gateway HTTP calls and normalizes the gateway's
//! heterogeneous responses back into structured results.
//!
//! ## Architecture
//!
//! All egress funnels through one chokepoint, [`transport::Transport`],
//! which owns retry-with-backoff, the process-wide circuit breaker, and
//! error sanitization. Around it:
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`endpoint`] | Model → endpoint/wire-format resolution, request shaping |
//! | [`transport`] | Request execution, sanitization, response extraction |
//! | [`resilience`] | Circuit breaker guarding the egress point |
//! | [`host`] | Collaborator seams: credentials, raw HTTP, binary fetch |
//! | [`actions`] | Per-capability handlers (chat, image, video, ...) |
//! | [`models`] | Model catalog and quality-mode defaults |
//! | [`types`] | Message types in the gateway wire shape |
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use deerapi_node::actions::{chat, ChatParams};
//! use deerapi_node::host::StaticCredentials;
//! use deerapi_node::transport::{ReqwestClient, Transport};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> deerapi_node::Result<()> {
//!     let transport = Transport::new(
//!         Arc::new(ReqwestClient::new()?),
//!         Arc::new(StaticCredentials::with_default_base_url("sk-...")),
//!     );
//!
//!     let reply = chat(&transport, &ChatParams::new("claude-sonnet-4-5", "Hello")).await?;
//!     println!("{}", reply.content);
//!     Ok(())
//! }
//! ```
//!
//! ## Failure semantics
//!
//! - 4xx responses (except 429) are never retried.
//! - 429/500/502/503/504 are retried up to 3 times with exponential
//!   backoff (1 s, 2 s, 4 s).
//! - Five consecutive failures open the circuit breaker for 30 s; calls
//!   during the cooldown fail fast without touching the network.
//! - Every surfaced error is sanitized: API keys are redacted and known
//!   status codes map to fixed messages.
//! - Malformed upstream payloads are never errors: the extractors in
//!   [`transport::response`] degrade to empty fields.

pub mod actions;
pub mod endpoint;
pub mod error;
pub mod host;
pub mod models;
pub mod resilience;
pub mod transport;
pub mod types;

pub use endpoint::{build_request_for_model, resolve_endpoint, EndpointConfig, WireFormat};
pub use error::{Error, Result, UserFacingError};
pub use host::{CredentialStore, Credentials, HttpClient, StaticCredentials, SystemCredentials};
pub use transport::{
    extract_chat_content, extract_image_url, extract_thinking, parse_image_payload, sanitize,
    RequestDescriptor, Transport, TransportConfig,
};
pub use types::{ContentPart, Message, MessageContent, MessageRole};
