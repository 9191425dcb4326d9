//! Outbound request transport, the single egress chokepoint.
//!
//! Everything that leaves the process for the gateway goes through
//! [`Transport::perform_request`]: it owns the retry policy, the exponential
//! backoff, the circuit breaker, and error sanitization. The defensive
//! response extractors that normalize the gateway's loosely-typed payloads
//! live in [`response`]; they never error, malformed input degrades to
//! empty fields.

pub mod http;
pub mod request;
pub mod response;
pub mod sanitize;

pub use http::ReqwestClient;
pub use request::{RequestDescriptor, Transport, TransportConfig};
pub use response::{
    extract_chat_content, extract_image_url, extract_thinking, parse_image_payload, ChatContent,
    ImageSource,
};
pub use sanitize::sanitize;
