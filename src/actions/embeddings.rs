//! Embedding generation action.

use std::time::Instant;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::endpoint::EMBEDDINGS_PATH;
use crate::transport::{RequestDescriptor, Transport};
use crate::Result;

use super::{elapsed_ms, merge_extra_body};

#[derive(Debug, Clone)]
pub struct EmbeddingsParams {
    pub model: String,
    pub input: String,
    pub extra_body: Option<String>,
}

impl EmbeddingsParams {
    pub fn new(model: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
            extra_body: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingsOutput {
    pub model: String,
    pub embedding: Vec<f64>,
    pub dimensions: usize,
    pub usage: Map<String, Value>,
    pub processing_time_ms: u64,
}

pub async fn embeddings(
    transport: &Transport,
    params: &EmbeddingsParams,
) -> Result<EmbeddingsOutput> {
    let mut body = json!({ "model": params.model, "input": params.input });
    merge_extra_body(&mut body, params.extra_body.as_deref());

    let start = Instant::now();
    let response = transport
        .perform_request(&RequestDescriptor::post(EMBEDDINGS_PATH, body))
        .await?;

    // Defensive like the chat extractor: a malformed payload degrades to an
    // empty vector rather than failing the item.
    let embedding: Vec<f64> = response
        .pointer("/data/0/embedding")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_f64).collect())
        .unwrap_or_default();
    let usage = response
        .get("usage")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    Ok(EmbeddingsOutput {
        model: params.model.clone(),
        dimensions: embedding.len(),
        embedding,
        usage,
        processing_time_ms: elapsed_ms(start),
    })
}
