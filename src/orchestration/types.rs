//! # Orchestration Types
//!
//! Shared structures threaded through a single pipeline execution and the
//! results handed back to callers.

use crate::models::{ContentRequest, GeneratedContent, WorkflowDefinition};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Accumulating state of one execution.
///
/// Each context is owned by exactly one execution and is never shared
/// between jobs. Collaborators read it; only the pipeline writes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineContext {
    /// Job id on the asynchronous path, correlation id on the synchronous one
    pub job_id: Option<Uuid>,
    pub workflow_type: String,
    pub workflow_version: String,
    pub request: ContentRequest,
    /// Output of every completed step, keyed by step name
    pub outputs: HashMap<String, Value>,
    pub completed_steps: Vec<String>,
    /// Step currently being executed
    pub current_step: Option<String>,
}

impl PipelineContext {
    pub fn new(request: ContentRequest, workflow: &WorkflowDefinition, job_id: Option<Uuid>) -> Self {
        Self {
            job_id,
            workflow_type: workflow.workflow_type.clone(),
            workflow_version: workflow.version.clone(),
            request,
            outputs: HashMap::new(),
            completed_steps: Vec::new(),
            current_step: None,
        }
    }

    /// Output previously produced by `step_name`
    pub fn output(&self, step_name: &str) -> Option<&Value> {
        self.outputs.get(step_name)
    }

    /// Merge a step output and mark the step complete
    pub fn record_output(&mut self, step_name: &str, output: Value) {
        self.outputs.insert(step_name.to_string(), output);
        self.completed_steps.push(step_name.to_string());
        self.current_step = None;
    }

    pub fn is_completed(&self, step_name: &str) -> bool {
        self.completed_steps.iter().any(|step| step == step_name)
    }
}

/// Result of the synchronous, caller-blocking path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncGenerationResult {
    /// Correlation id; no job is stored for synchronous runs
    pub job_id: Uuid,
    pub content: GeneratedContent,
    pub completed_steps: Vec<String>,
    pub total_steps: usize,
    pub processing_time_ms: u64,
}

/// Per-execution state machine
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExecutionState {
    #[default]
    NotStarted,
    /// Index into the execution order of the step in flight
    Running(usize),
    Completed,
    /// Name of the step that failed
    Failed(String),
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Running(index) => write!(f, "running({index})"),
            Self::Completed => write!(f, "completed"),
            Self::Failed(step) => write!(f, "failed({step})"),
        }
    }
}

/// What the asynchronous message handler did with one delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum ProcessOutcome {
    /// Every step ran and the job is `completed`
    Completed,
    /// A failure was recorded on the job
    Failed(String),
    /// Nothing ran: duplicate delivery or unknown job
    Skipped(String),
    /// The job was failed externally while it was running
    Aborted,
}

impl ProcessOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}
