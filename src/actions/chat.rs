//! Chat completion action.

use std::time::Instant;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::endpoint::build_request_for_model;
use crate::transport::{extract_chat_content, RequestDescriptor, Transport};
use crate::types::Message;
use crate::Result;

use super::{elapsed_ms, merge_extra_body, DEFAULT_SYSTEM_PROMPT};

#[derive(Debug, Clone)]
pub struct ChatParams {
    pub model: String,
    pub user_prompt: String,
    /// Defaults to a plain helpful-assistant prompt.
    pub system_prompt: Option<String>,
    /// Defaults to 0.7.
    pub temperature: Option<f64>,
    /// Defaults to 2048.
    pub max_tokens: Option<u32>,
    /// Extra JSON object merged into the request body; protected keys are
    /// stripped and invalid JSON is ignored.
    pub extra_body: Option<String>,
}

impl ChatParams {
    pub fn new(model: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            user_prompt: user_prompt.into(),
            system_prompt: None,
            temperature: None,
            max_tokens: None,
            extra_body: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatOutput {
    pub model: String,
    pub content: String,
    pub finish_reason: String,
    pub usage: Map<String, Value>,
    pub processing_time_ms: u64,
}

/// Run a chat completion. Claude models are transparently routed to the
/// Anthropic messages endpoint with the system prompt lifted out of the
/// message sequence.
pub async fn chat(transport: &Transport, params: &ChatParams) -> Result<ChatOutput> {
    let system_prompt = params
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);
    let messages = vec![
        Message::system(system_prompt),
        Message::user(params.user_prompt.clone()),
    ];
    let extra = json!({
        "max_tokens": params.max_tokens.unwrap_or(2048),
        "temperature": params.temperature.unwrap_or(0.7),
    });

    let mut built = build_request_for_model(&params.model, &messages, &extra)?;
    merge_extra_body(&mut built.body, params.extra_body.as_deref());

    let start = Instant::now();
    let response = transport
        .perform_request(&RequestDescriptor::post(built.endpoint, built.body))
        .await?;

    let extracted = extract_chat_content(&response);
    Ok(ChatOutput {
        model: params.model.clone(),
        content: extracted.content,
        finish_reason: extracted.finish_reason,
        usage: extracted.usage,
        processing_time_ms: elapsed_ms(start),
    })
}
