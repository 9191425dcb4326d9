//! Resilience primitives guarding the gateway egress point.
//!
//! The only persistent state in the core lives here: the circuit breaker
//! consulted by [`crate::transport::Transport`] before every request. The
//! breaker is a best-effort damper, not a strict limiter; see the
//! concurrency notes on [`circuit_breaker::CircuitBreaker`].

pub mod circuit_breaker;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerSnapshot};
