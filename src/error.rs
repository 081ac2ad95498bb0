//! Error types for the content engine.
//!

use crate::state_machine::JobStatus;
use thiserror::Error;
use uuid::Uuid;

/// Failure reported by a layer-service collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Timeout: {0}")]
    Timeout(String),
}

impl ServiceError {
    /// Short machine-readable code, used when a failure is recorded on a job.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "SERVICE_UNAVAILABLE",
            Self::ExecutionFailed(_) => "EXECUTION_FAILED",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Timeout(_) => "TIMEOUT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Workflow not found: {workflow_type}")]
    WorkflowNotFound { workflow_type: String },

    #[error("Cyclic dependency in workflow {workflow_type} involving steps {steps:?}")]
    CyclicDependency {
        workflow_type: String,
        steps: Vec<String>,
    },

    #[error("Invalid workflow {workflow_type}: {}", errors.join("; "))]
    InvalidWorkflow {
        workflow_type: String,
        errors: Vec<String>,
    },

    #[error("Step {step_name} failed: {cause}")]
    StepFailed {
        step_name: String,
        cause: ServiceError,
    },

    #[error("Invalid transition for job {job_id}: {from} -> {to}")]
    InvalidTransition {
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("Progress regression for job {job_id}: {reason}")]
    ProgressRegression { job_id: Uuid, reason: String },

    #[error("Malformed job message: {0}")]
    MalformedJobMessage(String),

    #[error("Service unavailable: {service_ref}")]
    ServiceUnavailable { service_ref: String },

    #[error("Job not found: {job_id}")]
    JobNotFound { job_id: Uuid },

    #[error("Job {job_id} is {status}, expected {expected}")]
    InvalidJobState {
        job_id: Uuid,
        status: JobStatus,
        expected: JobStatus,
    },

    #[error("Attempt {attempt} of job {job_id} was superseded (job is {status} on attempt {current})")]
    StaleAttempt {
        job_id: Uuid,
        attempt: u32,
        current: u32,
        status: JobStatus,
    },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl EngineError {
    /// Name of the failing step, when the error came out of step execution.
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            Self::StepFailed { step_name, .. } => Some(step_name),
            _ => None,
        }
    }
}

impl From<crate::config::ConfigurationError> for EngineError {
    fn from(error: crate::config::ConfigurationError) -> Self {
        EngineError::ConfigurationError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
