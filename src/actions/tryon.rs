//! Virtual try-on action: garment transfer between two images.

use std::time::Instant;

use bytes::Bytes;
use serde::Serialize;
use serde_json::json;

use crate::transport::{extract_chat_content, extract_image_url, RequestDescriptor, Transport};
use crate::types::{ContentPart, Message};
use crate::{endpoint::CHAT_COMPLETIONS_PATH, Result};

use super::{elapsed_ms, merge_extra_body, DEFAULT_ENHANCEMENT_MODEL};

const TRYON_ENHANCE_SYSTEM: &str = "You are a virtual try-on prompt expert. Enhance the given try-on instruction to produce more realistic and natural-looking results. Focus on: natural garment draping, proper body proportions, realistic shadows and wrinkles, maintaining the person's original pose and features. Output only the enhanced prompt.";

#[derive(Debug, Clone)]
pub struct VirtualTryOnParams {
    pub model: String,
    pub person_image_url: String,
    pub garment_image_url: String,
    /// Garment category, e.g. `"upper"`, `"lower"`, `"full"`.
    pub category: String,
    pub enhance_prompt: bool,
    pub download_binary: bool,
    pub enhancement_model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub system_prompt_override: Option<String>,
    pub extra_body: Option<String>,
}

impl VirtualTryOnParams {
    pub fn new(
        model: impl Into<String>,
        person_image_url: impl Into<String>,
        garment_image_url: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            person_image_url: person_image_url.into(),
            garment_image_url: garment_image_url.into(),
            category: category.into(),
            enhance_prompt: false,
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
pub struct VirtualTryOnOutput {
    pub model: String,
    pub category: String,
    pub image_url: Option<String>,
    pub raw_content: String,
    pub processing_time_ms: u64,
    #[serde(skip)]
    pub binary: Option<Bytes>,
}

pub async fn virtual_try_on(
    transport: &Transport,
    params: &VirtualTryOnParams,
) -> Result<VirtualTryOnOutput> {
    let mut tryon_prompt = format!(
        "Virtual try-on: Place the garment from the second image onto the person in the first image. Category: {} body. Maintain the person's pose, body shape, and facial features. The garment should fit naturally with proper wrinkles and shadows.",
        params.category
    );

    if params.enhance_prompt {
        match run_enhancement(transport, params, &tryon_prompt).await {
            Ok(Some(enhanced)) => tryon_prompt = enhanced,
            Ok(None) => {}
            Err(err) => {
                tracing::debug!(error = %err, "try-on enhancement failed, using base prompt");
            }
        }
    }

    let messages = vec![Message::user_parts(vec![
        ContentPart::text(tryon_prompt),
        ContentPart::image_url(params.person_image_url.clone()),
        ContentPart::image_url(params.garment_image_url.clone()),
    ])];
    let mut body = json!({ "model": params.model, "messages": messages });
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

    Ok(VirtualTryOnOutput {
        model: params.model.clone(),
        category: params.category.clone(),
        image_url,
        raw_content,
        processing_time_ms: elapsed_ms(start),
        binary,
    })
}

async fn run_enhancement(
    transport: &Transport,
    params: &VirtualTryOnParams,
    base_prompt: &str,
) -> Result<Option<String>> {
    let model = params
        .enhancement_model
        .as_deref()
        .unwrap_or(DEFAULT_ENHANCEMENT_MODEL);
    let system_prompt = params
        .system_prompt_override
        .as_deref()
        .unwrap_or(TRYON_ENHANCE_SYSTEM);
    let body = json!({
        "model": model,
        "messages": [Message::system(system_prompt), Message::user(base_prompt)],
        "max_tokens": params.max_tokens.unwrap_or(2048),
        "temperature": params.temperature.unwrap_or(0.7),
    });
    let response = transport
        .perform_request(&RequestDescriptor::post(CHAT_COMPLETIONS_PATH, body))
        .await?;
    let enhanced = extract_chat_content(&response).content;
    Ok((!enhanced.is_empty()).then_some(enhanced))
}
