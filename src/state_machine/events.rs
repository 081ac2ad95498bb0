use super::states::JobStatus;
use serde::{Deserialize, Serialize};

/// Events that can trigger job status transitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum JobEvent {
    /// A consumer picked the job up
    Start,
    /// Workflow finished successfully
    Complete,
    /// Workflow failed with an error message
    Fail(String),
    /// Operator or caller requested another attempt
    Retry,
}

impl JobEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Fail(_) => "fail",
            Self::Retry => "retry",
        }
    }

    /// Extract error message if this is a failure event
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Fail(msg) => Some(msg),
            _ => None,
        }
    }

    /// Status the event moves a job into
    pub fn target_status(&self) -> JobStatus {
        match self {
            Self::Start => JobStatus::Processing,
            Self::Complete => JobStatus::Completed,
            Self::Fail(_) => JobStatus::Failed,
            Self::Retry => JobStatus::Queued,
        }
    }
}
