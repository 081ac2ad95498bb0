use super::events::JobEvent;
use super::states::JobStatus;
use crate::error::{EngineError, Result};
use uuid::Uuid;

/// Guard conditions for job status transitions
///
/// The allowed graph is `queued -> processing -> {completed, failed}` plus the
/// retry edge `failed -> queued`. Everything else is rejected.
#[derive(Debug)]
pub struct TransitionGuard;

impl TransitionGuard {
    /// Check whether `from -> to` is an edge of the job lifecycle graph
    pub fn is_allowed(from: JobStatus, to: JobStatus) -> bool {
        use JobStatus::*;

        matches!(
            (from, to),
            (Queued, Processing)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Failed, Queued)
        )
    }

    /// Validate a transition for a specific job
    pub fn check(job_id: Uuid, from: JobStatus, to: JobStatus) -> Result<()> {
        if Self::is_allowed(from, to) {
            Ok(())
        } else {
            Err(EngineError::InvalidTransition { job_id, from, to })
        }
    }

    /// Resolve the status an event leads to, rejecting events illegal in `from`
    pub fn apply(job_id: Uuid, from: JobStatus, event: &JobEvent) -> Result<JobStatus> {
        let to = event.target_status();
        Self::check(job_id, from, to)?;
        Ok(to)
    }
}
