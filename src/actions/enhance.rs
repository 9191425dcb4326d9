//! Prompt-enhancement action for e-commerce image prompts.

use std::time::Instant;

use serde::Serialize;
use serde_json::{json, Value};

use crate::endpoint::CHAT_COMPLETIONS_PATH;
use crate::transport::{extract_chat_content, RequestDescriptor, Transport};
use crate::types::Message;
use crate::Result;

use super::{elapsed_ms, merge_extra_body};

const ENHANCE_SYSTEM_PROMPT: &str = r#"You are an expert e-commerce product image prompt engineer with deep knowledge of commercial photography, visual merchandising, and AI image generation.

Your task is to analyze the user's original prompt and enhance it into a professional, detailed prompt optimized for generating high-quality e-commerce product images.

When enhancing the prompt, consider and add details about:
1. Lighting: Specify lighting setup (soft diffused, studio strobe, natural window light, rim lighting, etc.)
2. Composition: Describe camera angle, framing, rule of thirds, focal length, depth of field
3. Background: Suggest appropriate backgrounds (seamless white, gradient, contextual lifestyle, textured surface, etc.)
4. Product Placement: Describe how the product should be positioned, any props or complementary items
5. Commercial Appeal: Add elements that increase conversion (hero shot perspective, aspirational context, brand-appropriate mood)
6. Technical Details: Resolution hints, aspect ratio suggestions, color palette guidance
7. Style References: Reference relevant photography styles or visual trends in e-commerce

Based on the target category, adjust your enhancement strategy accordingly.

Output your response as a structured JSON object with the following fields:
- "enhanced_prompt": A single detailed string containing the fully enhanced prompt ready for image generation
- "suggestions": An array of 3 to 5 actionable tips for further improving the image result
- "category": The determined or confirmed image category

Always respond with valid JSON only. Do not include any text outside the JSON object."#;

#[derive(Debug, Clone)]
pub struct EnhancePromptParams {
    pub model: String,
    pub prompt: String,
    pub category: String,
    pub style: Option<String>,
    /// Output language tag; `"zh"` requests Chinese, anything else English.
    pub language: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub system_prompt_override: Option<String>,
    pub extra_body: Option<String>,
}

impl EnhancePromptParams {
    pub fn new(
        model: impl Into<String>,
        prompt: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            category: category.into(),
            style: None,
            language: None,
            temperature: None,
            max_tokens: None,
            system_prompt_override: None,
            extra_body: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnhancePromptOutput {
    pub model: String,
    pub original_prompt: String,
    pub enhanced_prompt: String,
    pub suggestions: Vec<String>,
    pub category: String,
    pub processing_time_ms: u64,
}

/// Enhance a raw image prompt. The model is asked for structured JSON; a
/// non-JSON reply degrades to using the raw content as the enhanced prompt.
pub async fn enhance_prompt(
    transport: &Transport,
    params: &EnhancePromptParams,
) -> Result<EnhancePromptOutput> {
    let mut user_message = format!("Prompt: {}\nCategory: {}", params.prompt, params.category);
    if let Some(style) = &params.style {
        user_message.push_str(&format!("\nStyle: {style}"));
    }
    if let Some(language) = &params.language {
        let language = if language == "zh" { "Chinese" } else { "English" };
        user_message.push_str(&format!("\nOutput Language: {language}"));
    }

    let system_prompt = params
        .system_prompt_override
        .as_deref()
        .unwrap_or(ENHANCE_SYSTEM_PROMPT);
    let mut body = json!({
        "model": params.model,
        "messages": [Message::system(system_prompt), Message::user(user_message)],
        "max_tokens": params.max_tokens.unwrap_or(2048),
        "temperature": params.temperature.unwrap_or(0.7),
    });
    merge_extra_body(&mut body, params.extra_body.as_deref());

    let start = Instant::now();
    let response = transport
        .perform_request(&RequestDescriptor::post(CHAT_COMPLETIONS_PATH, body))
        .await?;
    let raw_content = extract_chat_content(&response).content;

    let (enhanced_prompt, suggestions, category) = parse_enhancement(&raw_content, params);

    Ok(EnhancePromptOutput {
        model: params.model.clone(),
        original_prompt: params.prompt.clone(),
        enhanced_prompt,
        suggestions,
        category,
        processing_time_ms: elapsed_ms(start),
    })
}

fn parse_enhancement(
    raw_content: &str,
    params: &EnhancePromptParams,
) -> (String, Vec<String>, String) {
    let parsed: Value = match serde_json::from_str(raw_content) {
        Ok(v) => v,
        Err(_) => {
            return (
                raw_content.to_string(),
                Vec::new(),
                params.category.clone(),
            )
        }
    };
    let enhanced = parsed
        .get("enhanced_prompt")
        .and_then(Value::as_str)
        .unwrap_or(raw_content)
        .to_string();
    let suggestions = parsed
        .get("suggestions")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let category = parsed
        .get("category")
        .and_then(Value::as_str)
        .unwrap_or(&params.category)
        .to_string();
    (enhanced, suggestions, category)
}
