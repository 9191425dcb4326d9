//! Defensive extraction of structured fields from upstream payloads.
//!
//! Gateway responses are loosely typed and occasionally malformed. Every
//! extractor here is total: missing or wrongly-typed fields degrade to empty
//! values, never to an error. The transport and sanitizer are the only
//! layers allowed to produce user-visible errors.

use base64::Engine as _;
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Normalized chat completion fields. Absence is represented by empty
/// values, never by a missing result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatContent {
    pub content: String,
    pub finish_reason: String,
    pub usage: Map<String, Value>,
}

/// Extract content, finish reason, and usage from an OpenAI-format chat
/// completion response. Handles malformed, empty, or unexpected shapes.
pub fn extract_chat_content(response: &Value) -> ChatContent {
    let choices = match response.get("choices").and_then(Value::as_array) {
        Some(choices) if !choices.is_empty() => choices,
        _ => return ChatContent::default(),
    };
    let first = &choices[0];

    let content = first
        .pointer("/message/content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let finish_reason = first
        .get("finish_reason")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let usage = response
        .get("usage")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    ChatContent {
        content,
        finish_reason,
        usage,
    }
}

/// First http(s) URL in `content` that ends in a known image extension,
/// optionally followed by a query string. The character classes exclude
/// whitespace, quotes, `<`, `>`, `]`, and `)` so Markdown delimiters are
/// not swallowed.
static IMAGE_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)https?://[^\s"'<>\])]+\.(?:png|jpg|jpeg|webp|gif)(?:\?[^\s"'<>\])]*)?"#)
        .expect("image URL pattern is valid")
});

/// Extract the first image URL from free-form response text.
pub fn extract_image_url(content: &str) -> Option<&str> {
    IMAGE_URL_RE.find(content).map(|m| m.as_str())
}

/// Extract the thinking block from a thinking-model response.
///
/// The block may appear as `message.thinking` or, for models that follow
/// the DeepSeek convention, `message.reasoning_content`.
pub fn extract_thinking(response: &Value) -> String {
    let message = match response.pointer("/choices/0/message") {
        Some(message) => message,
        None => return String::new(),
    };
    message
        .get("thinking")
        .and_then(Value::as_str)
        .or_else(|| message.get("reasoning_content").and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}

/// Direct image reference carried by a response payload. Materializing the
/// bytes into the host's attachment format is the host's job.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Url(String),
    Inline(Bytes),
}

/// Pull a direct image reference out of `data.image_url` /
/// `data.image_base64`. URL wins when both are present; undecodable base64
/// degrades to `None`.
pub fn parse_image_payload(response: &Value) -> Option<ImageSource> {
    let data = response.get("data")?;

    if let Some(url) = data.get("image_url").and_then(Value::as_str) {
        return Some(ImageSource::Url(url.to_string()));
    }

    let encoded = data.get("image_base64").and_then(Value::as_str)?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .ok()?;
    Some(ImageSource::Inline(Bytes::from(decoded)))
}
