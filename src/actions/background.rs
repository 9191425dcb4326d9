//! Background removal action.

use std::time::Instant;

use bytes::Bytes;
use serde::Serialize;
use serde_json::json;

use crate::transport::{extract_chat_content, extract_image_url, RequestDescriptor, Transport};
use crate::types::{ContentPart, Message};
use crate::{endpoint::CHAT_COMPLETIONS_PATH, Result};

use super::{elapsed_ms, merge_extra_body};

const BG_REMOVAL_BASE_PROMPT: &str = "Remove the background from this image.";

/// Replacement background requested by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundColor {
    Transparent,
    White,
    /// Any CSS-style color literal, e.g. `#FF8800`.
    Custom(String),
}

impl Default for BackgroundColor {
    fn default() -> Self {
        BackgroundColor::Transparent
    }
}

/// Source image: a URL the gateway can fetch, or host-supplied base64.
#[derive(Debug, Clone)]
pub enum ImageInput {
    Url(String),
    Base64 { data: String, mime_type: String },
}

#[derive(Debug, Clone)]
pub struct RemoveBackgroundParams {
    pub model: String,
    pub image: ImageInput,
    pub background: BackgroundColor,
    pub download_binary: bool,
    pub system_prompt_override: Option<String>,
    pub extra_body: Option<String>,
}

impl RemoveBackgroundParams {
    pub fn new(model: impl Into<String>, image: ImageInput) -> Self {
        Self {
            model: model.into(),
            image,
            background: BackgroundColor::default(),
            download_binary: false,
            system_prompt_override: None,
            extra_body: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoveBackgroundOutput {
    pub model: String,
    pub image_url: Option<String>,
    pub raw_content: String,
    pub processing_time_ms: u64,
    #[serde(skip)]
    pub binary: Option<Bytes>,
}

fn removal_prompt(background: &BackgroundColor) -> String {
    match background {
        BackgroundColor::Transparent => format!(
            "{BG_REMOVAL_BASE_PROMPT} Make the background transparent. Return only the processed image."
        ),
        BackgroundColor::White => format!(
            "{BG_REMOVAL_BASE_PROMPT} Replace the background with solid white (#FFFFFF). Return only the processed image."
        ),
        BackgroundColor::Custom(color) => format!(
            "{BG_REMOVAL_BASE_PROMPT} Replace the background with solid color {color}. Return only the processed image."
        ),
    }
}

pub async fn remove_background(
    transport: &Transport,
    params: &RemoveBackgroundParams,
) -> Result<RemoveBackgroundOutput> {
    let prompt = removal_prompt(&params.background);
    let image_part = match &params.image {
        ImageInput::Url(url) => ContentPart::image_url(url.clone()),
        ImageInput::Base64 { data, mime_type } => ContentPart::image_base64(data, mime_type),
    };
    let mut messages = vec![Message::user_parts(vec![
        ContentPart::text(prompt),
        image_part,
    ])];
    if let Some(system) = &params.system_prompt_override {
        messages.insert(0, Message::system(system.clone()));
    }

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

    Ok(RemoveBackgroundOutput {
        model: params.model.clone(),
        image_url,
        raw_content,
        processing_time_ms: elapsed_ms(start),
        binary,
    })
}
