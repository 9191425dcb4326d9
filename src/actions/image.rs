//! Image generation action, with an optional prompt-enhancement pre-step.

use std::time::Instant;

use bytes::Bytes;
use serde::Serialize;
use serde_json::json;

use crate::transport::{extract_chat_content, extract_image_url, RequestDescriptor, Transport};
use crate::types::Message;
use crate::{endpoint::CHAT_COMPLETIONS_PATH, Result};

use super::{elapsed_ms, merge_extra_body, DEFAULT_ENHANCEMENT_MODEL};

const ENHANCE_SYSTEM_PROMPT: &str = "You are an expert e-commerce product image prompt engineer. Enhance the user's prompt to be more detailed and specific for AI image generation. Focus on: lighting, composition, background, product placement, and commercial appeal. Output only the enhanced prompt, nothing else.";

#[derive(Debug, Clone)]
pub struct GenerateImageParams {
    pub model: String,
    pub prompt: String,
    /// Run the enhancement pre-step before generating. Defaults on.
    pub enhance_prompt: bool,
    /// Download the generated image bytes in addition to the URL.
    pub download_binary: bool,
    pub enhancement_model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub system_prompt_override: Option<String>,
    pub extra_body: Option<String>,
}

impl GenerateImageParams {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            enhance_prompt: true,
            download_binary: false,
            enhancement_model: None,
            temperature: None,
            max_tokens: None,
            system_prompt_override: None,
            extra_body: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateImageOutput {
    pub model: String,
    pub original_prompt: String,
    /// Present only when enhancement ran and actually changed the prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhanced_prompt: Option<String>,
    pub image_url: Option<String>,
    pub raw_content: String,
    pub processing_time_ms: u64,
    /// Image bytes when `download_binary` was requested and a URL was found.
    #[serde(skip)]
    pub binary: Option<Bytes>,
}

/// Generate an image through the chat surface and pull the result URL out
/// of the reply text. The enhancement pre-step is best-effort: any failure
/// falls back to the original prompt.
pub async fn generate_image(
    transport: &Transport,
    params: &GenerateImageParams,
) -> Result<GenerateImageOutput> {
    let mut final_prompt = params.prompt.clone();

    if params.enhance_prompt {
        match run_enhancement(transport, params).await {
            Ok(Some(enhanced)) => final_prompt = enhanced,
            Ok(None) => {}
            Err(err) => {
                tracing::debug!(error = %err, "prompt enhancement failed, using original prompt");
            }
        }
    }

    let mut body = json!({
        "model": params.model,
        "messages": [Message::user(format!("Generate an image: {final_prompt}"))],
    });
    merge_extra_body(&mut body, params.extra_body.as_deref());

    let start = Instant::now();
    let response = transport
        .perform_request(&RequestDescriptor::post(CHAT_COMPLETIONS_PATH, body))
        .await?;
    let raw_content = extract_chat_content(&response).content;
    let image_url = extract_image_url(&raw_content).map(str::to_string);

    let binary = match (&image_url, params.download_binary) {
        (Some(url), true) => Some(transport.download(url).await?),
        _ => None,
    };

    let enhanced_prompt =
        (params.enhance_prompt && final_prompt != params.prompt).then_some(final_prompt);

    Ok(GenerateImageOutput {
        model: params.model.clone(),
        original_prompt: params.prompt.clone(),
        enhanced_prompt,
        image_url,
        raw_content,
        processing_time_ms: elapsed_ms(start),
        binary,
    })
}

/// Enhancement pre-step; `Ok(None)` when the model returned nothing usable.
async fn run_enhancement(
    transport: &Transport,
    params: &GenerateImageParams,
) -> Result<Option<String>> {
    let model = params
        .enhancement_model
        .as_deref()
        .unwrap_or(DEFAULT_ENHANCEMENT_MODEL);
    let system_prompt = params
        .system_prompt_override
        .as_deref()
        .unwrap_or(ENHANCE_SYSTEM_PROMPT);
    let body = json!({
        "model": model,
        "messages": [Message::system(system_prompt), Message::user(params.prompt.clone())],
        "max_tokens": params.max_tokens.unwrap_or(2048),
        "temperature": params.temperature.unwrap_or(0.7),
    });
    let response = transport
        .perform_request(&RequestDescriptor::post(CHAT_COMPLETIONS_PATH, body))
        .await?;
    let enhanced = extract_chat_content(&response).content;
    Ok((!enhanced.is_empty()).then_some(enhanced))
}
