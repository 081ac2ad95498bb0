//! # Content Orchestrator
//!
//! Resolves a request's workflow from the catalog and runs its steps against
//! the registered collaborators, either inline (synchronous path) or for a
//! queued job delivered by an external consumer (asynchronous path).
//!
//! The synchronous path surfaces the first failure to its caller and never
//! touches the job store. The asynchronous path records every failure on the
//! job and only returns an error for a malformed message.
//!
//! ## Usage
//!
//! ```rust
//! use async_trait::async_trait;
//! use content_core::error::ServiceError;
//! use content_core::models::ContentRequest;
//! use content_core::orchestration::{ContentOrchestrator, PipelineContext};
//! use content_core::registry::LayerService;
//! use serde_json::{json, Value};
//! use std::sync::Arc;
//!
//! struct Writer;
//!
//! #[async_trait]
//! impl LayerService for Writer {
//!     async fn execute(&self, context: &PipelineContext) -> Result<Value, ServiceError> {
//!         Ok(json!({ "title": format!("All about {}", context.request.topic) }))
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let orchestrator = ContentOrchestrator::builder()
//!     .with_service("intent-analyzer", Arc::new(Writer))
//!     .with_service("content-generator", Arc::new(Writer))
//!     .build()
//!     .unwrap();
//!
//! let request = ContentRequest::new("Rust").with_workflow("quick");
//! let result = orchestrator.generate_content_sync(request).await.unwrap();
//! assert_eq!(result.completed_steps, vec!["intent_analysis", "content_generation"]);
//! assert_eq!(result.content.title, "All about Rust");
//! # });
//! ```

use super::assembler::ContentAssembler;
use super::health::{check_health, HealthStatus, QueueProbe};
use super::pipeline::{NoopObserver, PipelineOutcome, StepObserver, StepPipeline};
use super::types::{PipelineContext, ProcessOutcome, SyncGenerationResult};
use crate::catalog::WorkflowCatalog;
use crate::config::EngineConfig;
use crate::constants::{events, metrics};
use crate::error::{EngineError, Result};
use crate::events::{EngineEvent, EventPublisher, Telemetry};
use crate::jobs::JobStore;
use crate::logging::{log_error, log_job_operation};
use crate::messaging::ContentGenerationMessage;
use crate::models::{ContentRequest, Job, JobError, JobFilter, JobListing, JobProgress, NewJob, WorkflowStep};
use crate::notifier::RealtimeNotifier;
use crate::registry::{LayerService, ServiceRegistry};
use crate::state_machine::JobStatus;
use serde_json::{json, Value};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Builder wiring the orchestrator's collaborators
pub struct OrchestratorBuilder {
    config: EngineConfig,
    catalog: Option<Arc<WorkflowCatalog>>,
    services: Arc<ServiceRegistry>,
    job_store: Option<Arc<JobStore>>,
    notifier: Option<Arc<RealtimeNotifier>>,
    telemetry: Option<Telemetry>,
    queue_probe: Option<Arc<dyn QueueProbe>>,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            catalog: None,
            services: Arc::new(ServiceRegistry::new()),
            job_store: None,
            notifier: None,
            telemetry: None,
            queue_probe: None,
        }
    }
}

impl OrchestratorBuilder {
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an existing catalog instead of building one from configuration
    pub fn with_catalog(mut self, catalog: Arc<WorkflowCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_services(mut self, services: Arc<ServiceRegistry>) -> Self {
        self.services = services;
        self
    }

    pub fn with_service(self, service_ref: &str, service: Arc<dyn LayerService>) -> Self {
        self.services.register(service_ref, service);
        self
    }

    pub fn with_job_store(mut self, job_store: Arc<JobStore>) -> Self {
        self.job_store = Some(job_store);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<RealtimeNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn with_queue_probe(mut self, probe: Arc<dyn QueueProbe>) -> Self {
        self.queue_probe = Some(probe);
        self
    }

    pub fn build(self) -> Result<ContentOrchestrator> {
        self.config.validate()?;

        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => Arc::new(WorkflowCatalog::from_config(&self.config.catalog)?),
        };
        let default_workflow = self.config.catalog.default_workflow.clone();
        if !catalog.contains(&default_workflow) {
            return Err(EngineError::ConfigurationError(format!(
                "default workflow '{default_workflow}' is not in the catalog"
            )));
        }

        let telemetry = self
            .telemetry
            .unwrap_or_else(|| Telemetry::from_config(&self.config.telemetry));
        let job_store = self
            .job_store
            .unwrap_or_else(|| Arc::new(JobStore::new(self.config.jobs.clone())));

        info!(
            default_workflow = %default_workflow,
            workflows = catalog.get_available_workflows().len(),
            services = self.services.len(),
            "Content orchestrator initialized"
        );

        Ok(ContentOrchestrator {
            pipeline: StepPipeline::new(self.services.clone(), telemetry.clone()),
            catalog,
            services: self.services,
            job_store,
            publisher: EventPublisher::new(self.config.notifier.event_channel_capacity),
            notifier: self.notifier.unwrap_or_default(),
            telemetry,
            queue_probe: self.queue_probe,
            assembler: ContentAssembler,
            default_workflow,
        })
    }
}

pub struct ContentOrchestrator {
    catalog: Arc<WorkflowCatalog>,
    services: Arc<ServiceRegistry>,
    job_store: Arc<JobStore>,
    publisher: EventPublisher,
    notifier: Arc<RealtimeNotifier>,
    telemetry: Telemetry,
    queue_probe: Option<Arc<dyn QueueProbe>>,
    pipeline: StepPipeline,
    assembler: ContentAssembler,
    default_workflow: String,
}

impl std::fmt::Debug for ContentOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentOrchestrator")
            .field("default_workflow", &self.default_workflow)
            .field("services", &self.services)
            .field("jobs", &self.job_store.len())
            .finish()
    }
}

impl ContentOrchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    /// Run the whole workflow inline and return the assembled content.
    ///
    /// Fails with the first error; no partial result is returned and no job is
    /// stored.
    pub async fn generate_content_sync(&self, request: ContentRequest) -> Result<SyncGenerationResult> {
        let started = Instant::now();
        let workflow_type = self.workflow_type_for(&request);
        let correlation_id = Uuid::new_v4();

        let (workflow, order) = match self.catalog.resolve(&workflow_type) {
            Ok(resolved) => resolved,
            Err(e) => {
                self.track_sync_failure(&workflow_type, &e);
                return Err(e);
            }
        };

        let mut context = PipelineContext::new(request, &workflow, Some(correlation_id));
        if let Err(e) = self
            .pipeline
            .run(&workflow, &order, &mut context, &mut NoopObserver)
            .await
        {
            self.track_sync_failure(&workflow_type, &e);
            return Err(e);
        }

        let content = self.assembler.assemble(&context);
        let processing_time_ms = started.elapsed().as_millis() as u64;

        self.telemetry.event(
            events::SYNC_COMPLETED,
            json!({
                "workflowType": workflow_type,
                "contentId": content.content_id,
                "steps": context.completed_steps.len(),
                "processingTimeMs": processing_time_ms,
            }),
        );
        self.telemetry.metric(
            metrics::PROCESSING_TIME_MS,
            processing_time_ms as f64,
            &[("path", "sync"), ("workflow", workflow_type.as_str())],
        );
        info!(
            correlation_id = %correlation_id,
            workflow_type = %workflow_type,
            processing_time_ms = processing_time_ms,
            "Synchronous content generation completed"
        );

        Ok(SyncGenerationResult {
            job_id: correlation_id,
            content,
            completed_steps: context.completed_steps,
            total_steps: order.len(),
            processing_time_ms,
        })
    }

    /// Create a queued job for the request; no step runs here
    pub fn queue_content_generation(&self, request: ContentRequest) -> Uuid {
        let workflow_type = self.workflow_type_for(&request);
        let job = self
            .job_store
            .create_job(NewJob::from_request(workflow_type.clone(), request));

        self.publisher
            .publish(EngineEvent::job_status(job.id, JobStatus::Queued, None));
        self.telemetry.event(
            events::JOB_QUEUED,
            json!({
                "jobId": job.id,
                "workflowType": workflow_type,
                "priority": job.priority.as_str(),
            }),
        );

        job.id
    }

    /// Message handler for the work-queue consumer.
    ///
    /// Only a malformed payload is an error; everything else, including step
    /// failures, is recorded on the job and reported as a [`ProcessOutcome`].
    pub async fn process_content_generation_job(&self, payload: &Value) -> Result<ProcessOutcome> {
        let message = ContentGenerationMessage::parse(payload).map_err(|e| {
            log_error("orchestrator", "process_content_generation_job", &e.to_string(), None);
            e
        })?;
        Ok(self.process_message(message).await)
    }

    /// Execute a queued job. Safe to call repeatedly for the same job: only a
    /// delivery that claims the job out of `queued` runs any step.
    ///
    /// The stored job's type and request are authoritative; the message only
    /// identifies the job. Every write of this execution is fenced by the
    /// attempt number taken at claim time, so an attempt that was cancelled and
    /// then superseded by a retry can no longer touch the job.
    pub async fn process_message(&self, message: ContentGenerationMessage) -> ProcessOutcome {
        let job_id = message.job_id;

        let Some(job) = self.job_store.get_job_status(job_id) else {
            warn!(job_id = %job_id, "Job not found, dropping message");
            return self.skip(job_id, "job not found");
        };
        if job.status != JobStatus::Queued {
            return self.skip(job_id, &format!("job is already {}", job.status));
        }

        let job = match self
            .job_store
            .claim_job(job_id, Some("Processing content generation".to_string()))
        {
            Ok(job) => job,
            Err(e) => {
                debug!(job_id = %job_id, error = %e, "Lost the claim on a queued job");
                return self.skip(job_id, "job was claimed by another delivery");
            }
        };
        if message.job_type != job.job_type {
            warn!(
                job_id = %job_id,
                message_type = %message.job_type,
                job_type = %job.job_type,
                "Message type differs from the stored job, running the stored workflow"
            );
        }

        let attempt = job.retry_count;
        let workflow_type = job.job_type;
        self.publisher.publish(EngineEvent::job_status(
            job_id,
            JobStatus::Processing,
            job.message,
        ));
        self.telemetry.event(
            events::JOB_STARTED,
            json!({ "jobId": job_id, "workflowType": workflow_type, "retryCount": attempt }),
        );

        let started = Instant::now();
        let (workflow, order) = match self.catalog.resolve(&workflow_type) {
            Ok(resolved) => resolved,
            Err(e) => return self.record_failure(job_id, attempt, &workflow_type, &e),
        };

        let initial = JobProgress::after_steps(Vec::new(), order.len(), order.first().cloned());
        if let Ok(job) = self.job_store.update_attempt_progress(job_id, attempt, initial) {
            self.publisher.publish(EngineEvent::job_progress(job_id, job.progress));
        }

        let mut context = PipelineContext::new(job.request, &workflow, Some(job_id));
        let mut observer = JobProgressObserver {
            job_id,
            attempt,
            order: order.as_slice(),
            job_store: &self.job_store,
            publisher: &self.publisher,
        };

        match self
            .pipeline
            .run(&workflow, &order, &mut context, &mut observer)
            .await
        {
            Ok(PipelineOutcome::Completed) => {
                let content = self.assembler.assemble(&context);
                match self.job_store.complete_attempt(
                    job_id,
                    attempt,
                    Some("Content generation completed".to_string()),
                    content,
                ) {
                    Ok(job) => {
                        self.publisher.publish(EngineEvent::job_status(
                            job_id,
                            JobStatus::Completed,
                            job.message.clone(),
                        ));
                        self.telemetry.event(
                            events::JOB_COMPLETED,
                            json!({
                                "jobId": job_id,
                                "workflowType": workflow_type,
                                "processingTimeMs": job.processing_time_ms,
                            }),
                        );
                        self.telemetry.metric(
                            metrics::PROCESSING_TIME_MS,
                            started.elapsed().as_millis() as f64,
                            &[("path", "async"), ("workflow", workflow_type.as_str())],
                        );
                        ProcessOutcome::Completed
                    }
                    Err(e) => {
                        info!(job_id = %job_id, attempt = attempt, error = %e, "Job changed state while running, result discarded");
                        ProcessOutcome::Aborted
                    }
                }
            }
            Ok(PipelineOutcome::Stopped { next_step }) => {
                info!(job_id = %job_id, attempt = attempt, next_step = %next_step, "Attempt is no longer current, stopping");
                ProcessOutcome::Aborted
            }
            Err(e) => self.record_failure(job_id, attempt, &workflow_type, &e),
        }
    }

    /// Put a failed job back in the queue
    pub fn retry_job(&self, job_id: Uuid) -> Result<Job> {
        let job = self.job_store.retry_job(job_id)?;
        self.publisher.publish(EngineEvent::job_status(
            job_id,
            JobStatus::Queued,
            Some(format!("Retry {} queued", job.retry_count)),
        ));
        Ok(job)
    }

    /// Force a job to `failed`; a running execution stops before its next step
    pub fn cancel_job(&self, job_id: Uuid, reason: &str) -> Result<Job> {
        let job = self
            .job_store
            .set_job_error(job_id, JobError::new(reason).with_code("CANCELLED"))?;
        self.publisher.publish(EngineEvent::job_status(
            job_id,
            JobStatus::Failed,
            Some(reason.to_string()),
        ));
        Ok(job)
    }

    pub fn get_job_status(&self, job_id: Uuid) -> Option<Job> {
        self.job_store.get_job_status(job_id)
    }

    pub fn list_jobs(&self, filter: &JobFilter) -> JobListing {
        self.job_store.list_jobs(filter)
    }

    pub async fn get_health_status(&self) -> HealthStatus {
        check_health(
            &self.catalog,
            &self.services,
            self.queue_probe.as_deref(),
            self.notifier.get_connection_statistics(),
            self.job_store.stats(),
        )
        .await
    }

    /// Start forwarding engine events to the realtime notifier
    pub fn attach_notifier(&self) -> JoinHandle<()> {
        self.notifier.clone().attach(&self.publisher)
    }

    pub fn catalog(&self) -> &Arc<WorkflowCatalog> {
        &self.catalog
    }

    pub fn services(&self) -> &Arc<ServiceRegistry> {
        &self.services
    }

    pub fn job_store(&self) -> &Arc<JobStore> {
        &self.job_store
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    pub fn notifier(&self) -> &Arc<RealtimeNotifier> {
        &self.notifier
    }

    pub fn default_workflow(&self) -> &str {
        &self.default_workflow
    }

    fn workflow_type_for(&self, request: &ContentRequest) -> String {
        request
            .workflow_type
            .clone()
            .unwrap_or_else(|| self.default_workflow.clone())
    }

    fn skip(&self, job_id: Uuid, reason: &str) -> ProcessOutcome {
        log_job_operation("process_job", Some(job_id), None, "skipped", Some(reason));
        self.telemetry
            .event(events::JOB_SKIPPED, json!({ "jobId": job_id, "reason": reason }));
        ProcessOutcome::Skipped(reason.to_string())
    }

    fn record_failure(
        &self,
        job_id: Uuid,
        attempt: u32,
        workflow_type: &str,
        error: &EngineError,
    ) -> ProcessOutcome {
        let job = match self.job_store.fail_attempt(job_id, attempt, JobError::from(error)) {
            Ok(job) => job,
            Err(e) => {
                // An external failure or a newer attempt owns the job; keep its state
                info!(job_id = %job_id, attempt = attempt, error = %e, "Failure of a stale attempt discarded");
                return ProcessOutcome::Aborted;
            }
        };

        log_error(
            "orchestrator",
            "process_content_generation_job",
            &error.to_string(),
            Some(&format!("job_id={job_id} workflow_type={workflow_type}")),
        );
        self.publisher.publish(EngineEvent::job_status(
            job_id,
            JobStatus::Failed,
            job.message.clone(),
        ));
        self.telemetry.event(
            events::JOB_FAILED,
            json!({
                "jobId": job_id,
                "workflowType": workflow_type,
                "step": error.failed_step(),
                "error": error.to_string(),
            }),
        );
        ProcessOutcome::Failed(error.to_string())
    }

    fn track_sync_failure(&self, workflow_type: &str, error: &EngineError) {
        log_error("orchestrator", "generate_content_sync", &error.to_string(), Some(workflow_type));
        self.telemetry.event(
            events::SYNC_FAILED,
            json!({
                "workflowType": workflow_type,
                "step": error.failed_step(),
                "error": error.to_string(),
            }),
        );
    }
}

/// Records progress on the job after every step and stops the run once its
/// attempt was failed externally or superseded by a retry
struct JobProgressObserver<'a> {
    job_id: Uuid,
    attempt: u32,
    order: &'a [String],
    job_store: &'a JobStore,
    publisher: &'a EventPublisher,
}

impl StepObserver for JobProgressObserver<'_> {
    fn before_step(&mut self, _index: usize, _step: &WorkflowStep, _context: &PipelineContext) -> ControlFlow<()> {
        if self.job_store.is_attempt_current(self.job_id, self.attempt) {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(())
        }
    }

    fn after_step(&mut self, index: usize, _step: &WorkflowStep, context: &PipelineContext) {
        let progress = JobProgress::after_steps(
            context.completed_steps.clone(),
            self.order.len(),
            self.order.get(index + 1).cloned(),
        );

        match self.job_store.update_attempt_progress(self.job_id, self.attempt, progress) {
            Ok(job) => {
                self.publisher
                    .publish(EngineEvent::job_progress(self.job_id, job.progress));
            }
            Err(EngineError::ProgressRegression { reason, .. }) => {
                warn!(job_id = %self.job_id, reason = %reason, "Ignoring regressing progress update");
            }
            Err(e) => {
                debug!(job_id = %self.job_id, error = %e, "Progress not recorded");
            }
        }
    }
}
