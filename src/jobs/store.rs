//! # Job Store
//!
//! In-memory, thread-safe store for the lifecycle of asynchronous generation
//! jobs. The table is a `DashMap` keyed by job id; every row carries its own
//! `parking_lot::Mutex`, and each mutation is a read-check-write performed
//! under that row lock. Concurrent retries, progress updates and completions
//! for the same job therefore serialize, while different jobs never contend
//! beyond the map shard lookup.

use crate::config::JobsConfig;
use crate::error::{EngineError, Result};
use crate::logging::log_job_operation;
use crate::models::{
    GeneratedContent, Job, JobError, JobFilter, JobListing, JobProgress, JobStats, NewJob,
};
use crate::state_machine::{JobEvent, JobStatus, TransitionGuard};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug)]
struct JobRow {
    /// Insertion order, breaks `created_at` ties when listing
    sequence: u64,
    job: Mutex<Job>,
}

#[derive(Debug)]
pub struct JobStore {
    rows: DashMap<Uuid, Arc<JobRow>>,
    next_sequence: AtomicU64,
    config: JobsConfig,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new(JobsConfig::default())
    }
}

impl JobStore {
    pub fn new(config: JobsConfig) -> Self {
        Self {
            rows: DashMap::new(),
            next_sequence: AtomicU64::new(0),
            config,
        }
    }

    /// Create a job in `queued` with no progress and no retries
    pub fn create_job(&self, new_job: NewJob) -> Job {
        let job = Job {
            id: Uuid::new_v4(),
            job_type: new_job.job_type,
            request: new_job.request,
            priority: new_job.priority.unwrap_or_default(),
            user_id: new_job.user_id,
            project_id: new_job.project_id,
            status: JobStatus::Queued,
            message: None,
            progress: JobProgress::default(),
            result: None,
            error: None,
            retry_count: 0,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            processing_time_ms: None,
        };

        let row = JobRow {
            sequence: self.next_sequence.fetch_add(1, Ordering::SeqCst),
            job: Mutex::new(job.clone()),
        };
        self.rows.insert(job.id, Arc::new(row));

        log_job_operation(
            "create_job",
            Some(job.id),
            Some(&job.job_type),
            job.status.as_str(),
            Some(job.priority.as_str()),
        );

        job
    }

    pub fn get_job_status(&self, job_id: Uuid) -> Option<Job> {
        self.row(job_id).map(|row| row.job.lock().clone())
    }

    /// Apply a status transition, stamping lifecycle timestamps
    pub fn update_job_status(
        &self,
        job_id: Uuid,
        status: JobStatus,
        message: Option<String>,
        result: Option<GeneratedContent>,
    ) -> Result<Job> {
        let row = self.require_row(job_id)?;
        let mut job = row.job.lock();
        Self::apply_status(&mut job, status, message, result)?;
        Ok(job.clone())
    }

    /// Record step progress; only forward movement is accepted
    pub fn update_job_progress(&self, job_id: Uuid, progress: JobProgress) -> Result<Job> {
        let row = self.require_row(job_id)?;
        let mut job = row.job.lock();
        Self::apply_progress(&mut job, progress)?;
        Ok(job.clone())
    }

    /// Force a job to `failed` with the given error.
    ///
    /// Legal from `queued` (cancel before pickup), `processing`, and `failed`
    /// (replaces the recorded error). A completed job cannot be failed.
    /// `started_at` is only stamped when a job is claimed, so a job failed
    /// out of `queued` has a `completed_at` but no `started_at` and no
    /// processing time.
    pub fn set_job_error(&self, job_id: Uuid, error: impl Into<JobError>) -> Result<Job> {
        let error = error.into();
        let row = self.require_row(job_id)?;
        let mut job = row.job.lock();

        if job.status == JobStatus::Completed {
            return Err(EngineError::InvalidTransition {
                job_id,
                from: job.status,
                to: JobStatus::Failed,
            });
        }

        Self::apply_error(&mut job, error);
        Ok(job.clone())
    }

    /// Claim a queued job for execution.
    ///
    /// The returned job's `retry_count` is the attempt number every later
    /// write of this execution must present.
    pub fn claim_job(&self, job_id: Uuid, message: Option<String>) -> Result<Job> {
        self.update_job_status(job_id, JobStatus::Processing, message, None)
    }

    /// Record progress for one attempt; rejected once the attempt was
    /// cancelled or superseded by a retry
    pub fn update_attempt_progress(
        &self,
        job_id: Uuid,
        attempt: u32,
        progress: JobProgress,
    ) -> Result<Job> {
        let row = self.require_row(job_id)?;
        let mut job = row.job.lock();
        Self::check_attempt(&job, attempt)?;
        Self::apply_progress(&mut job, progress)?;
        Ok(job.clone())
    }

    /// Complete the job with the result of one attempt
    pub fn complete_attempt(
        &self,
        job_id: Uuid,
        attempt: u32,
        message: Option<String>,
        result: GeneratedContent,
    ) -> Result<Job> {
        let row = self.require_row(job_id)?;
        let mut job = row.job.lock();
        Self::check_attempt(&job, attempt)?;
        Self::apply_status(&mut job, JobStatus::Completed, message, Some(result))?;
        Ok(job.clone())
    }

    /// Fail the job with the error of one attempt. An external failure or a
    /// newer attempt keeps its own state.
    pub fn fail_attempt(&self, job_id: Uuid, attempt: u32, error: impl Into<JobError>) -> Result<Job> {
        let error = error.into();
        let row = self.require_row(job_id)?;
        let mut job = row.job.lock();
        Self::check_attempt(&job, attempt)?;
        Self::apply_error(&mut job, error);
        Ok(job.clone())
    }

    /// Whether `attempt` is still the live execution of the job
    pub fn is_attempt_current(&self, job_id: Uuid, attempt: u32) -> bool {
        let Some(row) = self.row(job_id) else {
            return false;
        };
        let job = row.job.lock();
        Self::check_attempt(&job, attempt).is_ok()
    }

    /// Move a failed job back to `queued` for another attempt
    pub fn retry_job(&self, job_id: Uuid) -> Result<Job> {
        let row = self.require_row(job_id)?;
        let mut job = row.job.lock();

        let status = TransitionGuard::apply(job_id, job.status, &JobEvent::Retry)?;

        job.status = status;
        job.message = None;
        Self::reset_for_retry(&mut job);

        log_job_operation(
            "retry_job",
            Some(job_id),
            Some(&job.job_type),
            job.status.as_str(),
            Some(&format!("retry_count={}", job.retry_count)),
        );

        Ok(job.clone())
    }

    /// Jobs matching every given filter, newest first
    pub fn list_jobs(&self, filter: &JobFilter) -> JobListing {
        let mut matching: Vec<(u64, Job)> = self
            .rows
            .iter()
            .filter_map(|entry| {
                let row = entry.value();
                let job = row.job.lock();
                filter.matches(&job).then(|| (row.sequence, job.clone()))
            })
            .collect();

        matching.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a))
        });

        let total = matching.len();
        let limit = filter
            .limit
            .unwrap_or(self.config.default_list_limit)
            .min(self.config.max_list_limit);

        JobListing {
            jobs: matching.into_iter().take(limit).map(|(_, job)| job).collect(),
            total,
        }
    }

    pub fn stats(&self) -> JobStats {
        let mut stats = JobStats::default();
        for entry in self.rows.iter() {
            stats.total += 1;
            match entry.value().job.lock().status {
                JobStatus::Queued => stats.queued += 1,
                JobStatus::Processing => stats.processing += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    // Clone the row handle so the shard guard is released before the row lock is taken
    fn row(&self, job_id: Uuid) -> Option<Arc<JobRow>> {
        self.rows.get(&job_id).map(|entry| entry.value().clone())
    }

    fn require_row(&self, job_id: Uuid) -> Result<Arc<JobRow>> {
        self.row(job_id).ok_or(EngineError::JobNotFound { job_id })
    }

    fn check_attempt(job: &Job, attempt: u32) -> Result<()> {
        if job.status == JobStatus::Processing && job.retry_count == attempt {
            return Ok(());
        }
        Err(EngineError::StaleAttempt {
            job_id: job.id,
            attempt,
            current: job.retry_count,
            status: job.status,
        })
    }

    fn apply_status(
        job: &mut Job,
        status: JobStatus,
        message: Option<String>,
        result: Option<GeneratedContent>,
    ) -> Result<()> {
        TransitionGuard::check(job.id, job.status, status)?;

        let now = Utc::now();
        match status {
            JobStatus::Processing => {
                job.started_at.get_or_insert(now);
            }
            JobStatus::Completed => {
                job.result = result;
                job.progress.percentage = 100;
                job.progress.current_step = None;
                Self::stamp_completion(job, now);
            }
            JobStatus::Failed => {
                if job.error.is_none() {
                    let reason = message.clone().unwrap_or_else(|| "Job failed".to_string());
                    job.error = Some(JobError::new(reason));
                }
                Self::stamp_completion(job, now);
            }
            // failed -> queued carries the same bookkeeping as retry_job
            JobStatus::Queued => Self::reset_for_retry(job),
        }

        job.status = status;
        job.message = message;

        log_job_operation(
            "update_job_status",
            Some(job.id),
            Some(&job.job_type),
            status.as_str(),
            job.message.as_deref(),
        );
        Ok(())
    }

    fn apply_progress(job: &mut Job, progress: JobProgress) -> Result<()> {
        let job_id = job.id;
        if job.status != JobStatus::Processing {
            return Err(EngineError::InvalidJobState {
                job_id,
                status: job.status,
                expected: JobStatus::Processing,
            });
        }

        let current = &job.progress;
        if progress.percentage < current.percentage {
            return Err(EngineError::ProgressRegression {
                job_id,
                reason: format!(
                    "percentage would drop from {} to {}",
                    current.percentage, progress.percentage
                ),
            });
        }
        if progress.completed_steps.len() < current.completed_steps.len() {
            return Err(EngineError::ProgressRegression {
                job_id,
                reason: format!(
                    "completed steps would shrink from {} to {}",
                    current.completed_steps.len(),
                    progress.completed_steps.len()
                ),
            });
        }
        if !progress.completed_steps.starts_with(&current.completed_steps) {
            return Err(EngineError::ProgressRegression {
                job_id,
                reason: "completed steps diverge from recorded progress".to_string(),
            });
        }

        debug!(
            job_id = %job_id,
            percentage = progress.percentage,
            current_step = ?progress.current_step,
            completed = progress.completed_steps.len(),
            "Job progress updated"
        );

        job.progress = progress;
        Ok(())
    }

    fn apply_error(job: &mut Job, error: JobError) {
        job.message = Some(error.message.clone());
        job.error = Some(error);
        job.status = JobStatus::Failed;
        Self::stamp_completion(job, Utc::now());

        log_job_operation(
            "set_job_error",
            Some(job.id),
            Some(&job.job_type),
            job.status.as_str(),
            job.message.as_deref(),
        );
    }

    fn reset_for_retry(job: &mut Job) {
        job.retry_count += 1;
        job.error = None;
        job.result = None;
        job.completed_at = None;
        job.processing_time_ms = None;
        // The next attempt re-runs every step
        job.progress = JobProgress {
            total_steps: job.progress.total_steps,
            ..JobProgress::default()
        };
    }

    fn stamp_completion(job: &mut Job, now: chrono::DateTime<Utc>) {
        job.completed_at = Some(now);
        job.processing_time_ms = job
            .started_at
            .map(|started_at| (now - started_at).num_milliseconds());
    }
}
