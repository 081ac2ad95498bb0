//! # Content Generation Messages
//!
//! Payload delivered by the work-queue consumer for one queued job.

use crate::error::{EngineError, Result};
use crate::models::{ContentRequest, Job};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// `{jobId, type, request}` as delivered by the queue consumer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentGenerationMessage {
    #[serde(alias = "jobId")]
    pub job_id: Uuid,
    /// Workflow type the job was queued with
    #[serde(rename = "type")]
    pub job_type: String,
    pub request: ContentRequest,
}

impl ContentGenerationMessage {
    pub fn new(job_id: Uuid, job_type: impl Into<String>, request: ContentRequest) -> Self {
        Self {
            job_id,
            job_type: job_type.into(),
            request,
        }
    }

    /// Message that would be enqueued for an existing job
    pub fn for_job(job: &Job) -> Self {
        Self::new(job.id, job.job_type.clone(), job.request.clone())
    }

    /// Parse a raw queue payload.
    ///
    /// Fails with [`EngineError::MalformedJobMessage`] when `jobId`, `type` or
    /// `request` is missing or cannot be decoded.
    pub fn parse(payload: &Value) -> Result<Self> {
        let object = payload.as_object().ok_or_else(|| {
            EngineError::MalformedJobMessage("payload is not a JSON object".to_string())
        })?;

        let has_job_id = object.contains_key("jobId") || object.contains_key("job_id");
        let missing: Vec<&str> = [
            ("jobId", has_job_id),
            ("type", object.contains_key("type")),
            ("request", object.contains_key("request")),
        ]
        .into_iter()
        .filter_map(|(field, present)| (!present).then_some(field))
        .collect();

        if !missing.is_empty() {
            return Err(EngineError::MalformedJobMessage(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        Self::deserialize(payload).map_err(|e| EngineError::MalformedJobMessage(e.to_string()))
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "jobId": self.job_id,
            "type": self.job_type,
            "request": self.request,
        })
    }
}
