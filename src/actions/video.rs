//! Video generation actions: create (submit + poll), retrieve, download, list.

use std::time::{Duration, Instant};

use bytes::Bytes;
use serde::Serialize;
use serde_json::{json, Value};

use crate::endpoint::VIDEOS_PATH;
use crate::transport::{RequestDescriptor, Transport};
use crate::{Error, Result};

use super::elapsed_ms;

const SUBMIT_TIMEOUT: Duration = Duration::from_millis(30_000);
const POLL_TIMEOUT: Duration = Duration::from_millis(15_000);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(15_000);
const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 40;

/// One shot of a storyboard request.
#[derive(Debug, Clone, Serialize)]
pub struct StoryboardShot {
    pub prompt: String,
    pub duration: u32,
}

#[derive(Debug, Clone)]
pub struct VideoCreateParams {
    pub model: String,
    pub prompt: String,
    /// Resolution, e.g. `"720x1280"`. Defaults to portrait 720x1280.
    pub size: Option<String>,
    pub storyboard_shots: Option<Vec<StoryboardShot>>,
    /// Poll cadence; defaults to 15 s between polls, 40 polls max (10 min).
    pub poll_interval: Option<Duration>,
    pub max_poll_attempts: Option<u32>,
}

impl VideoCreateParams {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            size: None,
            storyboard_shots: None,
            poll_interval: None,
            max_poll_attempts: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoCreateOutput {
    pub id: String,
    pub status: String,
    pub model: String,
    pub video_url: String,
    pub processing_time_ms: u64,
}

fn task_id(response: &Value) -> Option<String> {
    response
        .get("id")
        .or_else(|| response.pointer("/data/id"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn task_status(response: &Value) -> String {
    response
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("pending")
        .to_string()
}

fn task_video_url(response: &Value) -> String {
    response
        .get("video_url")
        .or_else(|| response.pointer("/data/video_url"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Submit a generation task and poll it to completion.
pub async fn video_create(
    transport: &Transport,
    params: &VideoCreateParams,
) -> Result<VideoCreateOutput> {
    let mut body = json!({
        "model": params.model,
        "prompt": params.prompt,
        "size": params.size.as_deref().unwrap_or("720x1280"),
    });
    if let Some(shots) = &params.storyboard_shots {
        body["storyboard"] = Value::Bool(true);
        body["storyboard_shots"] = serde_json::to_value(shots)?;
    }

    let start = Instant::now();
    let submitted = transport
        .perform_request(&RequestDescriptor::post(VIDEOS_PATH, body).with_timeout(SUBMIT_TIMEOUT))
        .await?;

    let id = task_id(&submitted)
        .ok_or_else(|| Error::Action("video generation did not return a task ID".into()))?;

    let poll_interval = params.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL);
    let max_attempts = params.max_poll_attempts.unwrap_or(DEFAULT_MAX_POLL_ATTEMPTS);

    let mut status = task_status(&submitted);
    let mut latest = submitted;
    let mut attempts = 0;
    while attempts < max_attempts && status != "completed" && status != "failed" {
        tokio::time::sleep(poll_interval).await;
        latest = transport
            .perform_request(
                &RequestDescriptor::get(format!("{VIDEOS_PATH}/{id}")).with_timeout(POLL_TIMEOUT),
            )
            .await?;
        status = task_status(&latest);
        attempts += 1;
        tracing::debug!(task_id = %id, %status, attempts, "video task poll");
    }

    if status == "failed" {
        let upstream = latest
            .pointer("/error/message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error");
        return Err(Error::Action(format!("video generation failed: {upstream}")));
    }
    if status != "completed" {
        let budget_secs = (max_attempts as u64) * poll_interval.as_secs();
        return Err(Error::Action(format!(
            "video generation timed out after {budget_secs}s (status: {status})"
        )));
    }

    Ok(VideoCreateOutput {
        id,
        status,
        model: params.model.clone(),
        video_url: task_video_url(&latest),
        processing_time_ms: elapsed_ms(start),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoRetrieveOutput {
    pub id: String,
    pub status: String,
    pub video_url: String,
}

/// Fetch the current state of a generation task.
pub async fn video_retrieve(transport: &Transport, task_id: &str) -> Result<VideoRetrieveOutput> {
    let response = transport
        .perform_request(&RequestDescriptor::get(format!("{VIDEOS_PATH}/{task_id}")))
        .await?;
    Ok(VideoRetrieveOutput {
        id: task_id.to_string(),
        status: response
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        video_url: task_video_url(&response),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoDownloadOutput {
    pub id: String,
    pub status: String,
    pub video_url: String,
    #[serde(skip)]
    pub binary: Bytes,
}

/// Download the rendered video of a completed task.
pub async fn video_download(transport: &Transport, task_id: &str) -> Result<VideoDownloadOutput> {
    let retrieved = video_retrieve(transport, task_id).await?;
    if retrieved.status != "completed" {
        return Err(Error::Action(format!(
            "video task {task_id} is not completed (status: {})",
            retrieved.status
        )));
    }
    if retrieved.video_url.is_empty() {
        return Err(Error::Action(format!(
            "video task {task_id} has no video URL"
        )));
    }

    let binary = transport.download(&retrieved.video_url).await?;
    Ok(VideoDownloadOutput {
        id: retrieved.id,
        status: retrieved.status,
        video_url: retrieved.video_url,
        binary,
    })
}

/// Summary row of a listed generation task.
#[derive(Debug, Clone, Serialize)]
pub struct VideoTask {
    pub id: String,
    pub status: String,
    pub video_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoListOutput {
    pub tasks: Vec<VideoTask>,
}

/// List recent generation tasks, optionally capped by `limit`.
pub async fn video_list(transport: &Transport, limit: Option<u32>) -> Result<VideoListOutput> {
    let mut descriptor = RequestDescriptor::get(VIDEOS_PATH);
    if let Some(limit) = limit {
        descriptor = descriptor.with_query("limit", limit.to_string());
    }
    let response = transport.perform_request(&descriptor).await?;

    let tasks = response
        .get("data")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .map(|row| VideoTask {
                    id: row
                        .get("id")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    status: row
                        .get("status")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown")
                        .to_string(),
                    video_url: row
                        .get("video_url")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(VideoListOutput { tasks })
}
