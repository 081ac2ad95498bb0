use crate::models::{JobProgress, PerformanceIssue};
use crate::state_machine::JobStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Typed events emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    JobStatusChanged {
        job_id: Uuid,
        status: JobStatus,
        message: Option<String>,
        at: DateTime<Utc>,
    },
    JobProgressUpdated {
        job_id: Uuid,
        progress: JobProgress,
        at: DateTime<Utc>,
    },
    PerformanceIssueDetected(PerformanceIssue),
}

impl EngineEvent {
    pub fn job_status(job_id: Uuid, status: JobStatus, message: Option<String>) -> Self {
        Self::JobStatusChanged {
            job_id,
            status,
            message,
            at: Utc::now(),
        }
    }

    pub fn job_progress(job_id: Uuid, progress: JobProgress) -> Self {
        Self::JobProgressUpdated {
            job_id,
            progress,
            at: Utc::now(),
        }
    }

    /// Job the event concerns, if any
    pub fn job_id(&self) -> Option<Uuid> {
        match self {
            Self::JobStatusChanged { job_id, .. } | Self::JobProgressUpdated { job_id, .. } => {
                Some(*job_id)
            }
            Self::PerformanceIssueDetected(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::JobStatusChanged { .. } => "job_status_changed",
            Self::JobProgressUpdated { .. } => "job_progress_updated",
            Self::PerformanceIssueDetected(_) => "performance_issue_detected",
        }
    }
}

/// High-throughput publisher for engine events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event; returns the number of subscribers that received it.
    ///
    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: EngineEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(crate::constants::defaults::EVENT_CHANNEL_CAPACITY)
    }
}
