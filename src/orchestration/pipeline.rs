//! # Step Pipeline
//!
//! Sequential execution of a workflow's steps in execution order against their
//! registered collaborators. The synchronous and asynchronous paths share this
//! loop and differ only in the [`StepObserver`] they plug in.

use super::types::{ExecutionState, PipelineContext};
use crate::constants::metrics::STEP_DURATION_MS;
use crate::error::{EngineError, Result, ServiceError};
use crate::events::Telemetry;
use crate::logging::log_step_operation;
use crate::models::{WorkflowDefinition, WorkflowStep};
use crate::registry::ServiceRegistry;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Hooks invoked around every step.
///
/// `before_step` may stop the run; the step it was called for is then not
/// executed.
pub trait StepObserver {
    fn before_step(&mut self, _index: usize, _step: &WorkflowStep, _context: &PipelineContext) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn after_step(&mut self, _index: usize, _step: &WorkflowStep, _context: &PipelineContext) {}
}

/// Observer that does nothing; used by the synchronous path
#[derive(Debug, Default)]
pub struct NoopObserver;

impl StepObserver for NoopObserver {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Completed,
    /// An observer stopped the run before `next_step` started
    Stopped { next_step: String },
}

#[derive(Debug, Clone)]
pub struct StepPipeline {
    services: Arc<ServiceRegistry>,
    telemetry: Telemetry,
}

impl StepPipeline {
    pub fn new(services: Arc<ServiceRegistry>, telemetry: Telemetry) -> Self {
        Self { services, telemetry }
    }

    /// Run every step of `order` in sequence.
    ///
    /// The first collaborator failure aborts the run with
    /// [`EngineError::StepFailed`]; later steps never execute.
    pub async fn run<O: StepObserver + Send>(
        &self,
        workflow: &WorkflowDefinition,
        order: &[String],
        context: &mut PipelineContext,
        observer: &mut O,
    ) -> Result<PipelineOutcome> {
        let mut state = ExecutionState::NotStarted;

        for (index, step_name) in order.iter().enumerate() {
            let step = workflow
                .step(step_name)
                .ok_or_else(|| EngineError::InvalidWorkflow {
                    workflow_type: workflow.workflow_type.clone(),
                    errors: vec![format!("Execution order names unknown step '{step_name}'")],
                })?;

            if let ControlFlow::Break(()) = observer.before_step(index, step, context) {
                debug!(
                    job_id = ?context.job_id,
                    next_step = %step_name,
                    state = %state,
                    "Pipeline stopped by observer"
                );
                return Ok(PipelineOutcome::Stopped {
                    next_step: step_name.clone(),
                });
            }

            state = ExecutionState::Running(index);
            context.current_step = Some(step_name.clone());

            match self.execute_step(step, context).await {
                Ok(output) => context.record_output(step_name, output),
                Err(e) => {
                    state = ExecutionState::Failed(step_name.clone());
                    debug!(job_id = ?context.job_id, state = %state, "Pipeline failed");
                    return Err(e);
                }
            }

            observer.after_step(index, step, context);
        }

        state = ExecutionState::Completed;
        debug!(
            job_id = ?context.job_id,
            workflow_type = %workflow.workflow_type,
            state = %state,
            steps = order.len(),
            "Pipeline finished"
        );
        Ok(PipelineOutcome::Completed)
    }

    async fn execute_step(&self, step: &WorkflowStep, context: &PipelineContext) -> Result<serde_json::Value> {
        let step_failed = |cause: ServiceError| EngineError::StepFailed {
            step_name: step.name.clone(),
            cause,
        };

        let service = self
            .services
            .resolve(&step.service_ref)
            .map_err(|_| step_failed(ServiceError::Unavailable(step.service_ref.clone())))?;

        log_step_operation("execute_step", context.job_id, &step.name, step.layer.as_str(), "started", None);

        let started = Instant::now();
        let result = service.execute(context).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        self.telemetry.metric(
            STEP_DURATION_MS,
            duration_ms as f64,
            &[
                ("workflow", context.workflow_type.as_str()),
                ("step", step.name.as_str()),
                ("layer", step.layer.as_str()),
            ],
        );

        match result {
            Ok(output) => {
                log_step_operation(
                    "execute_step",
                    context.job_id,
                    &step.name,
                    step.layer.as_str(),
                    "completed",
                    Some(duration_ms),
                );
                Ok(output)
            }
            Err(cause) => {
                log_step_operation(
                    "execute_step",
                    context.job_id,
                    &step.name,
                    step.layer.as_str(),
                    "failed",
                    Some(duration_ms),
                );
                Err(step_failed(cause))
            }
        }
    }
}
