//! Core type definitions shared across the transport and the actions.

pub mod message;

pub use message::{ContentPart, Message, MessageContent, MessageRole};
