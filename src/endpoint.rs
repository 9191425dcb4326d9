//! Model ID → API endpoint mapping and wire-format request shaping.
//!
//! DeerAPI routes different model families to different endpoints, some of
//! which expect Anthropic-shaped bodies instead of OpenAI-shaped ones. This
//! module is the single source of truth for that routing: endpoints are
//! resolved from an ordered, data-driven rule table so that new model
//! families are rule additions, not new branches.

use serde_json::{json, Value};

use crate::types::message::{Message, MessageContent, MessageRole};
use crate::{Error, Result};

/// Upstream API body shape expected by an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    OpenAi,
    Anthropic,
    /// Declared by the gateway but currently routed nowhere; treated as
    /// OpenAI-shaped by the builder.
    Gemini,
}

/// Resolved endpoint: upstream path plus the wire format it speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointConfig {
    pub path: &'static str,
    pub format: WireFormat,
}

pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
pub const MESSAGES_PATH: &str = "/v1/messages";
pub const EMBEDDINGS_PATH: &str = "/v1/embeddings";
pub const IMAGES_PATH: &str = "/v1/images/generations";
pub const VIDEOS_PATH: &str = "/v1/videos/generations";

/// Prefix-based routing rules, evaluated in order. First match wins.
const ENDPOINT_RULES: &[(&[&str], EndpointConfig)] = &[
    (
        &["text-embedding-"],
        EndpointConfig {
            path: EMBEDDINGS_PATH,
            format: WireFormat::OpenAi,
        },
    ),
    (
        &["sora-", "veo-", "luma-"],
        EndpointConfig {
            path: VIDEOS_PATH,
            format: WireFormat::OpenAi,
        },
    ),
    (
        &["claude-"],
        EndpointConfig {
            path: MESSAGES_PATH,
            format: WireFormat::Anthropic,
        },
    ),
    (
        &["doubao-"],
        EndpointConfig {
            path: IMAGES_PATH,
            format: WireFormat::OpenAi,
        },
    ),
];

/// Default endpoint for all unmatched models (OpenAI chat completions).
const DEFAULT_ENDPOINT: EndpointConfig = EndpointConfig {
    path: CHAT_COMPLETIONS_PATH,
    format: WireFormat::OpenAi,
};

/// Resolve the API endpoint and wire format for a model ID.
pub fn resolve_endpoint(model_id: &str) -> EndpointConfig {
    for (prefixes, config) in ENDPOINT_RULES {
        if prefixes.iter().any(|p| model_id.starts_with(p)) {
            return *config;
        }
    }
    DEFAULT_ENDPOINT
}

/// A request body shaped for the endpoint that will receive it.
#[derive(Debug, Clone)]
pub struct BuiltRequest {
    pub endpoint: &'static str,
    pub body: Value,
}

/// Build the wire request for a model from a generic chat request.
///
/// `extra` must be a JSON object (or `Value::Null` for none); its fields
/// (`max_tokens`, `temperature`, thinking budget, ...) pass through to the
/// body unchanged regardless of format.
///
/// For OpenAI-shaped endpoints the messages go through as-is, system roles
/// included. For Anthropic-shaped endpoints every system message is removed
/// from the sequence and their text contents are joined in original order
/// with `"\n"` into a top-level `system` field, omitted entirely when there
/// are no system messages.
///
/// Pure by contract: no I/O, no shared state.
pub fn build_request_for_model(
    model: &str,
    messages: &[Message],
    extra: &Value,
) -> Result<BuiltRequest> {
    let config = resolve_endpoint(model);

    let mut body = match config.format {
        WireFormat::Anthropic => {
            let (system, remaining) = split_system_messages(messages);
            let mut body = json!({
                "model": model,
                "messages": remaining,
            });
            if let Some(system) = system {
                body["system"] = Value::String(system);
            }
            body
        }
        WireFormat::OpenAi | WireFormat::Gemini => json!({
            "model": model,
            "messages": messages,
        }),
    };

    match extra {
        Value::Null => {}
        Value::Object(map) => {
            for (k, v) in map {
                body[k] = v.clone();
            }
        }
        other => {
            return Err(Error::Action(format!(
                "extra request fields must be a JSON object, got {}",
                json_type_name(other)
            )));
        }
    }

    Ok(BuiltRequest {
        endpoint: config.path,
        body,
    })
}

/// Extract system messages for the Anthropic top-level `system` parameter.
/// Non-text system content does not contribute to the joined string.
fn split_system_messages(messages: &[Message]) -> (Option<String>, Vec<Value>) {
    let mut system_parts: Vec<&str> = Vec::new();
    let mut remaining: Vec<Value> = Vec::new();

    for message in messages {
        match message.role {
            MessageRole::System => {
                if let MessageContent::Text(ref s) = message.content {
                    system_parts.push(s);
                }
            }
            _ => {
                remaining.push(serde_json::to_value(message).unwrap_or(Value::Null));
            }
        }
    }

    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n"))
    };

    (system, remaining)
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
