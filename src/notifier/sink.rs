//! Connection transport seam.
//!
//! The notifier only needs a `push(event)` capability per connection; sockets,
//! long-polling and the like live behind [`ConnectionSink`].

use crate::constants::notifications::{MSG_TYPE_JOB_PROGRESS, MSG_TYPE_JOB_STATUS};
use crate::models::JobProgress;
use crate::state_machine::JobStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Message pushed to live observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    JobStatus {
        job_id: Uuid,
        status: JobStatus,
        message: Option<String>,
        timestamp: DateTime<Utc>,
    },
    JobProgress {
        job_id: Uuid,
        progress: JobProgress,
        timestamp: DateTime<Utc>,
    },
}

impl NotificationEvent {
    pub fn job_id(&self) -> Uuid {
        match self {
            Self::JobStatus { job_id, .. } | Self::JobProgress { job_id, .. } => *job_id,
        }
    }

    /// Wire `type` tag
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::JobStatus { .. } => MSG_TYPE_JOB_STATUS,
            Self::JobProgress { .. } => MSG_TYPE_JOB_PROGRESS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("Connection closed")]
    Closed,
    #[error("Push failed: {0}")]
    PushFailed(String),
}

/// Push capability of one registered connection
pub trait ConnectionSink: Send + Sync {
    fn push(&self, event: &NotificationEvent) -> Result<(), SinkError>;
}

/// Sink backed by an unbounded tokio channel; the transport drains the receiver
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<NotificationEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NotificationEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ConnectionSink for ChannelSink {
    fn push(&self, event: &NotificationEvent) -> Result<(), SinkError> {
        self.sender.send(event.clone()).map_err(|_| SinkError::Closed)
    }
}
