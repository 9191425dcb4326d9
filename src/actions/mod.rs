//! Per-capability action handlers.
//!
//! Thin consumers of the core: each handler builds a request description,
//! hands it to [`crate::transport::Transport`], and normalizes the result
//! through the response extractors. No transport or parsing logic lives
//! here; the host supplies parameter values as the typed structs below.

pub mod background;
pub mod chat;
pub mod embeddings;
pub mod enhance;
pub mod image;
pub mod thinking;
pub mod tryon;
pub mod video;

use serde_json::Value;
use std::time::Instant;

pub use background::{
    remove_background, BackgroundColor, ImageInput, RemoveBackgroundOutput,
    RemoveBackgroundParams,
};
pub use chat::{chat, ChatOutput, ChatParams};
pub use embeddings::{embeddings, EmbeddingsOutput, EmbeddingsParams};
pub use enhance::{enhance_prompt, EnhancePromptOutput, EnhancePromptParams};
pub use image::{generate_image, GenerateImageOutput, GenerateImageParams};
pub use thinking::{thinking, ThinkingOutput, ThinkingParams};
pub use tryon::{virtual_try_on, VirtualTryOnOutput, VirtualTryOnParams};
pub use video::{
    video_create, video_download, video_list, video_retrieve, VideoCreateOutput,
    VideoCreateParams, VideoDownloadOutput, VideoListOutput, VideoRetrieveOutput, VideoTask,
};

pub(crate) const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub(crate) const DEFAULT_ENHANCEMENT_MODEL: &str = "gemini-2.5-flash";

/// Body fields callers may never override through extra-body JSON.
const PROTECTED_BODY_KEYS: &[&str] = &[
    "model",
    "messages",
    "stream",
    "tools",
    "tool_choice",
    "function_call",
    "functions",
];

/// Merge caller-supplied extra body fields into a request body.
///
/// Mirrors the host-side contract: the value must parse as a JSON object,
/// protected keys are stripped, and anything invalid is silently ignored.
pub(crate) fn merge_extra_body(body: &mut Value, extra: Option<&str>) {
    let Some(extra) = extra else { return };
    let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(extra) else {
        tracing::debug!("ignoring non-object extra body fields");
        return;
    };
    for (key, value) in fields {
        if PROTECTED_BODY_KEYS.contains(&key.as_str()) {
            continue;
        }
        body[key] = value;
    }
}

pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extra_body_merges_plain_fields() {
        let mut body = json!({ "model": "gpt-4o" });
        merge_extra_body(&mut body, Some(r#"{"top_p": 0.9, "frequency_penalty": 0.5}"#));
        assert_eq!(body["top_p"], 0.9);
        assert_eq!(body["frequency_penalty"], 0.5);
    }

    #[test]
    fn extra_body_cannot_override_protected_keys() {
        let mut body = json!({ "model": "gpt-4o", "messages": [] });
        merge_extra_body(
            &mut body,
            Some(r#"{"model": "evil", "messages": ["x"], "stream": true, "tools": []}"#),
        );
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"], json!([]));
        assert!(body.get("stream").is_none());
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn invalid_or_non_object_extra_body_is_ignored() {
        let mut body = json!({ "model": "gpt-4o" });
        merge_extra_body(&mut body, Some("not json"));
        merge_extra_body(&mut body, Some("[1,2,3]"));
        merge_extra_body(&mut body, None);
        assert_eq!(body, json!({ "model": "gpt-4o" }));
    }
}
