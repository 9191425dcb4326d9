//! Model catalog and mode → default-model resolution.
//!
//! Fallback tables used when the gateway's `/v1/models` listing is
//! unavailable, plus the quality-mode presets the host's mode selector
//! relies on. Data-driven on purpose: new models are row additions.

use serde::{Deserialize, Serialize};

/// What a model can do; used to filter the catalog per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelCapability {
    Text,
    Image,
    Video,
    Embedding,
    Thinking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostTier {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedTier {
    Fast,
    Medium,
    Slow,
}

/// Catalog entry for one gateway model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub capabilities: &'static [ModelCapability],
    pub cost_tier: CostTier,
    pub speed_tier: SpeedTier,
}

macro_rules! model {
    ($id:literal, $name:literal, $caps:expr, $cost:ident, $speed:ident) => {
        ModelInfo {
            id: $id,
            name: $name,
            capabilities: $caps,
            cost_tier: CostTier::$cost,
            speed_tier: SpeedTier::$speed,
        }
    };
}

/// Fallback model list, used when the live model listing is unavailable.
pub const FALLBACK_MODELS: &[ModelInfo] = &[
    // Text models
    model!("gemini-2.5-flash", "Gemini 2.5 Flash", &[ModelCapability::Text], Low, Fast),
    model!("gemini-3.1-pro-preview", "Gemini 3.1 Pro Preview", &[ModelCapability::Text], Medium, Medium),
    model!("gemini-3-pro-preview", "Gemini 3 Pro Preview", &[ModelCapability::Text], Medium, Medium),
    model!("gpt-4o", "GPT-4o", &[ModelCapability::Text], High, Slow),
    model!("gpt-4o-mini", "GPT-4o Mini", &[ModelCapability::Text], Low, Fast),
    model!("deepseek-v3.1", "DeepSeek V3.1", &[ModelCapability::Text], Low, Fast),
    model!("deepseek-v3", "DeepSeek V3", &[ModelCapability::Text], Low, Fast),
    model!("deepseek-chat", "DeepSeek Chat", &[ModelCapability::Text], Low, Fast),
    model!("claude-opus-4-5", "Claude Opus 4.5", &[ModelCapability::Text], High, Slow),
    model!("claude-sonnet-4-5", "Claude Sonnet 4.5", &[ModelCapability::Text], Medium, Medium),
    // Image models
    model!("gemini-2.5-flash-image", "Gemini 2.5 Flash Image", &[ModelCapability::Image], Low, Fast),
    model!("gemini-3-pro-image-preview", "Gemini 3 Pro Image Preview", &[ModelCapability::Image], High, Slow),
    model!("doubao-seedream-4-5-251128", "Doubao Seedream 4.5", &[ModelCapability::Image], Medium, Fast),
    // Video models
    model!("sora-2-all", "Sora 2", &[ModelCapability::Video], High, Slow),
    model!("sora-2-pro-all", "Sora 2 Pro", &[ModelCapability::Video], High, Slow),
    model!("veo-3", "Veo 3", &[ModelCapability::Video], High, Slow),
    model!("veo-3-fast", "Veo 3 Fast", &[ModelCapability::Video], Medium, Fast),
    // Embedding models
    model!("text-embedding-3-small", "Text Embedding 3 Small", &[ModelCapability::Embedding], Low, Fast),
    model!("text-embedding-3-large", "Text Embedding 3 Large", &[ModelCapability::Embedding], Medium, Medium),
    // Thinking models
    model!("claude-opus-4-5-thinking", "Claude Opus 4.5 Thinking", &[ModelCapability::Thinking], High, Slow),
    model!("gemini-3-flash-preview-thinking", "Gemini 3 Flash Thinking", &[ModelCapability::Thinking], Medium, Fast),
    model!("gemini-3-pro-preview-thinking", "Gemini 3 Pro Thinking", &[ModelCapability::Thinking], High, Medium),
];

/// Quality mode the host's mode selector exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Recommended,
    Fast,
    Quality,
    Budget,
    /// User picks the model manually; no default applies.
    Custom,
}

/// Default model per (mode, capability); rows follow the gateway's model
/// configuration guidance.
const MODE_DEFAULTS: &[(Mode, ModelCapability, &str)] = &[
    (Mode::Recommended, ModelCapability::Text, "gemini-2.5-flash"),
    (Mode::Recommended, ModelCapability::Image, "gemini-2.5-flash-image"),
    (Mode::Recommended, ModelCapability::Video, "sora-2-all"),
    (Mode::Recommended, ModelCapability::Embedding, "text-embedding-3-small"),
    (Mode::Recommended, ModelCapability::Thinking, "gemini-3-flash-preview-thinking"),
    (Mode::Fast, ModelCapability::Text, "gemini-2.5-flash"),
    (Mode::Fast, ModelCapability::Image, "gemini-2.5-flash-image"),
    (Mode::Fast, ModelCapability::Video, "veo-3-fast"),
    (Mode::Fast, ModelCapability::Embedding, "text-embedding-3-small"),
    (Mode::Fast, ModelCapability::Thinking, "gemini-3-flash-preview-thinking"),
    (Mode::Quality, ModelCapability::Text, "claude-opus-4-5"),
    (Mode::Quality, ModelCapability::Image, "gemini-3-pro-image-preview"),
    (Mode::Quality, ModelCapability::Video, "sora-2-pro-all"),
    (Mode::Quality, ModelCapability::Embedding, "text-embedding-3-large"),
    (Mode::Quality, ModelCapability::Thinking, "claude-opus-4-5-thinking"),
    (Mode::Budget, ModelCapability::Text, "deepseek-chat"),
    (Mode::Budget, ModelCapability::Image, "gemini-2.5-flash-image"),
    (Mode::Budget, ModelCapability::Video, "veo-3-fast"),
    (Mode::Budget, ModelCapability::Embedding, "text-embedding-3-small"),
    (Mode::Budget, ModelCapability::Thinking, "gemini-3-flash-preview-thinking"),
];

/// Resolve the default model for a mode + capability. `None` for
/// [`Mode::Custom`], where the caller supplies the model.
pub fn resolve_model_from_mode(mode: Mode, capability: ModelCapability) -> Option<&'static str> {
    MODE_DEFAULTS
        .iter()
        .find(|(m, c, _)| *m == mode && *c == capability)
        .map(|(_, _, id)| *id)
}

/// Catalog entries matching a capability.
pub fn models_with_capability(capability: ModelCapability) -> Vec<&'static ModelInfo> {
    FALLBACK_MODELS
        .iter()
        .filter(|m| m.capabilities.contains(&capability))
        .collect()
}
