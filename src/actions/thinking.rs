//! Extended-thinking action: chat with an explicit reasoning budget.

use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::endpoint::build_request_for_model;
use crate::transport::{extract_chat_content, extract_thinking, RequestDescriptor, Transport};
use crate::types::Message;
use crate::Result;

use super::{elapsed_ms, merge_extra_body, DEFAULT_SYSTEM_PROMPT};

/// Thinking calls run long; they get double the default transport timeout.
const THINKING_TIMEOUT: Duration = Duration::from_millis(120_000);

#[derive(Debug, Clone)]
pub struct ThinkingParams {
    pub model: String,
    pub user_prompt: String,
    /// Token budget for the reasoning pass. Defaults to 5000.
    pub budget_tokens: Option<u32>,
    pub system_prompt: Option<String>,
    /// Defaults to 8192.
    pub max_tokens: Option<u32>,
    pub extra_body: Option<String>,
}

impl ThinkingParams {
    pub fn new(model: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            user_prompt: user_prompt.into(),
            budget_tokens: None,
            system_prompt: None,
            max_tokens: None,
            extra_body: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ThinkingOutput {
    pub model: String,
    pub content: String,
    /// The reasoning trace, empty when the model returned none.
    pub thinking: String,
    pub budget_tokens: u32,
    pub finish_reason: String,
    pub usage: Map<String, Value>,
    pub processing_time_ms: u64,
}

pub async fn thinking(transport: &Transport, params: &ThinkingParams) -> Result<ThinkingOutput> {
    let budget_tokens = params.budget_tokens.unwrap_or(5000);
    let system_prompt = params
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);

    let messages = vec![
        Message::system(system_prompt),
        Message::user(params.user_prompt.clone()),
    ];
    let extra = json!({
        "max_tokens": params.max_tokens.unwrap_or(8192),
        "temperature": 1,
        "thinking": { "type": "enabled", "budget_tokens": budget_tokens },
    });

    let mut built = build_request_for_model(&params.model, &messages, &extra)?;
    merge_extra_body(&mut built.body, params.extra_body.as_deref());

    let start = Instant::now();
    let response = transport
        .perform_request(
            &RequestDescriptor::post(built.endpoint, built.body).with_timeout(THINKING_TIMEOUT),
        )
        .await?;

    let extracted = extract_chat_content(&response);
    Ok(ThinkingOutput {
        model: params.model.clone(),
        content: extracted.content,
        thinking: extract_thinking(&response),
        budget_tokens,
        finish_reason: extracted.finish_reason,
        usage: extracted.usage,
        processing_time_ms: elapsed_ms(start),
    })
}
