//! # Job Model
//!
//! Tracked instance of one asynchronous workflow execution. Jobs are owned by
//! the [`JobStore`](crate::jobs::JobStore); everything outside the store only
//! ever sees clones.

use super::content::{ContentRequest, GeneratedContent};
use crate::error::EngineError;
use crate::state_machine::JobStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl JobPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl fmt::Display for JobPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(format!("Invalid job priority: {s}")),
        }
    }
}

/// Step-level progress of a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct JobProgress {
    pub current_step: Option<String>,
    pub completed_steps: Vec<String>,
    pub total_steps: usize,
    pub percentage: u8,
}

impl JobProgress {
    /// Progress after `completed_steps` out of `total_steps`, rounded down.
    pub fn after_steps(completed_steps: Vec<String>, total_steps: usize, current_step: Option<String>) -> Self {
        let percentage = if total_steps == 0 {
            100
        } else {
            ((completed_steps.len() * 100) / total_steps).min(100) as u8
        };

        Self {
            current_step,
            completed_steps,
            total_steps,
            percentage,
        }
    }
}

/// Failure recorded on a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    pub message: String,
    pub step_name: Option<String>,
    pub code: Option<String>,
}

impl JobError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            step_name: None,
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl From<String> for JobError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for JobError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<&EngineError> for JobError {
    fn from(error: &EngineError) -> Self {
        match error {
            EngineError::StepFailed { step_name, cause } => Self {
                message: error.to_string(),
                step_name: Some(step_name.clone()),
                code: Some(cause.code().to_string()),
            },
            EngineError::WorkflowNotFound { .. } => Self {
                message: error.to_string(),
                step_name: None,
                code: Some("WORKFLOW_NOT_FOUND".to_string()),
            },
            _ => Self::new(error.to_string()),
        }
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub job_type: String,
    pub request: ContentRequest,
    pub priority: JobPriority,
    pub user_id: Option<String>,
    pub project_id: Option<String>,
    pub status: JobStatus,
    /// Message attached to the most recent status change
    pub message: Option<String>,
    pub progress: JobProgress,
    pub result: Option<GeneratedContent>,
    pub error: Option<JobError>,
    pub retry_count: u32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// `completed_at - started_at`, in milliseconds
    pub processing_time_ms: Option<i64>,
}

/// Input for `JobStore::create_job`
#[derive(Debug, Clone)]
pub struct NewJob {
    pub job_type: String,
    pub request: ContentRequest,
    pub user_id: Option<String>,
    pub project_id: Option<String>,
    pub priority: Option<JobPriority>,
}

impl NewJob {
    /// Build a job input from a request, carrying over its ownership fields
    pub fn from_request(job_type: impl Into<String>, request: ContentRequest) -> Self {
        Self {
            job_type: job_type.into(),
            user_id: request.user_id.clone(),
            project_id: request.project_id.clone(),
            priority: request.priority,
            request,
        }
    }
}

/// Conjunctive filter for `JobStore::list_jobs`
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub user_id: Option<String>,
    pub job_type: Option<String>,
    pub priority: Option<JobPriority>,
    pub status: Option<JobStatus>,
    pub limit: Option<usize>,
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        self.user_id
            .as_ref()
            .map_or(true, |user_id| job.user_id.as_ref() == Some(user_id))
            && self
                .job_type
                .as_ref()
                .map_or(true, |job_type| &job.job_type == job_type)
            && self.priority.map_or(true, |priority| job.priority == priority)
            && self.status.map_or(true, |status| job.status == status)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobListing {
    pub jobs: Vec<Job>,
    /// Number of matching jobs before `limit` was applied
    pub total: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStats {
    pub total: usize,
    pub queued: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}
