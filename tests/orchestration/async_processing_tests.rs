use crate::common::*;
use async_trait::async_trait;
use content_core::constants::events;
use content_core::error::{EngineError, ServiceError};
use content_core::messaging::ContentGenerationMessage;
use content_core::models::ContentRequest;
use content_core::notifier::{ChannelSink, NotificationEvent};
use content_core::orchestration::{PipelineContext, ProcessOutcome};
use content_core::registry::LayerService;
use content_core::state_machine::JobStatus;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Blocks every call until that call's own release fires, then reports
/// which call it was (or fails, when `fail` is set)
#[derive(Clone, Default)]
struct PerCallGate {
    calls: Arc<AtomicUsize>,
    entered: Arc<Notify>,
    releases: [Arc<Notify>; 2],
    fail: bool,
}

impl PerCallGate {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl LayerService for PerCallGate {
    async fn execute(&self, _context: &PipelineContext) -> Result<Value, ServiceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.releases[call].notified().await;
        if self.fail {
            return Err(ServiceError::ExecutionFailed(format!("call {call} failed")));
        }
        Ok(json!({ "attempt": call }))
    }
}

#[tokio::test]
async fn test_queued_job_runs_to_completion() {
    let (orchestrator, sink) = echo_orchestrator();

    let job_id = orchestrator.queue_content_generation(ContentRequest::new("Service meshes"));
    let queued = orchestrator.get_job_status(job_id).unwrap();
    assert_eq!(queued.status, JobStatus::Queued);
    assert_eq!(queued.job_type, "standard");

    let payload = ContentGenerationMessage::for_job(&queued).to_json();
    let outcome = orchestrator.process_content_generation_job(&payload).await.unwrap();
    assert_eq!(outcome, ProcessOutcome::Completed);

    let job = orchestrator.get_job_status(job_id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress.percentage, 100);
    assert_eq!(job.progress.completed_steps.len(), 3);
    assert!(job.result.is_some());

    let started = job.started_at.unwrap();
    let finished = job.completed_at.unwrap();
    assert_eq!(job.processing_time_ms, Some((finished - started).num_milliseconds()));

    let names = sink.event_names();
    assert!(names.contains(&events::JOB_QUEUED.to_string()));
    assert!(names.contains(&events::JOB_STARTED.to_string()));
    assert!(names.contains(&events::JOB_COMPLETED.to_string()));
}

#[tokio::test]
async fn test_redelivery_is_skipped() {
    let a = RecordingService::default();
    let (orchestrator, _sink) = abc_orchestrator(
        Arc::new(a.clone()),
        Arc::new(EchoService),
        Arc::new(EchoService),
    );

    let job_id = orchestrator.queue_content_generation(ContentRequest::new("Service meshes"));
    let message = ContentGenerationMessage::for_job(&orchestrator.get_job_status(job_id).unwrap());

    assert_eq!(orchestrator.process_message(message.clone()).await, ProcessOutcome::Completed);
    let second = orchestrator.process_message(message).await;

    assert!(second.is_skipped());
    assert_eq!(a.calls().await, vec!["A".to_string()]);
}

#[tokio::test]
async fn test_unknown_job_is_skipped() {
    let (orchestrator, sink) = echo_orchestrator();

    let payload = json!({
        "jobId": uuid::Uuid::new_v4(),
        "type": "standard",
        "request": { "topic": "orphan" }
    });
    let outcome = orchestrator.process_content_generation_job(&payload).await.unwrap();

    assert!(outcome.is_skipped());
    assert_eq!(sink.events_named(events::JOB_SKIPPED).len(), 1);
}

#[tokio::test]
async fn test_malformed_message_is_an_error() {
    let (orchestrator, _sink) = echo_orchestrator();

    let err = orchestrator
        .process_content_generation_job(&json!({ "type": "standard" }))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::MalformedJobMessage(_)));
}

#[tokio::test]
async fn test_step_failure_is_recorded_on_the_job() {
    let c = RecordingService::default();
    let (orchestrator, sink) = abc_orchestrator(
        Arc::new(EchoService),
        Arc::new(FailingService(ServiceError::Timeout("keyword provider".into()))),
        Arc::new(c.clone()),
    );

    let job_id = orchestrator.queue_content_generation(ContentRequest::new("Service meshes"));
    let message = ContentGenerationMessage::for_job(&orchestrator.get_job_status(job_id).unwrap());

    let outcome = orchestrator.process_message(message).await;
    assert!(matches!(outcome, ProcessOutcome::Failed(_)));

    let job = orchestrator.get_job_status(job_id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    let error = job.error.unwrap();
    assert_eq!(error.step_name.as_deref(), Some("B"));
    assert_eq!(error.code.as_deref(), Some("TIMEOUT"));
    assert!(job.result.is_none());
    assert!(job.completed_at.is_some());
    assert!(c.calls().await.is_empty());

    let failures = sink.events_named(events::JOB_FAILED);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["step"], "B");
}

#[tokio::test]
async fn test_unknown_workflow_fails_the_job() {
    let (orchestrator, _sink) = echo_orchestrator();

    let job_id = orchestrator
        .queue_content_generation(ContentRequest::new("Service meshes").with_workflow("missing"));
    let message = ContentGenerationMessage::for_job(&orchestrator.get_job_status(job_id).unwrap());

    let outcome = orchestrator.process_message(message).await;
    assert!(matches!(outcome, ProcessOutcome::Failed(_)));

    let job = orchestrator.get_job_status(job_id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.unwrap().code.as_deref(), Some("WORKFLOW_NOT_FOUND"));
}

#[tokio::test]
async fn test_retry_after_failure_runs_again() {
    let (orchestrator, _sink) = abc_orchestrator(
        Arc::new(EchoService),
        Arc::new(FailingService(ServiceError::Unavailable("svc-b".into()))),
        Arc::new(EchoService),
    );

    let job_id = orchestrator.queue_content_generation(ContentRequest::new("Service meshes"));
    let message = ContentGenerationMessage::for_job(&orchestrator.get_job_status(job_id).unwrap());
    orchestrator.process_message(message.clone()).await;

    let retried = orchestrator.retry_job(job_id).unwrap();
    assert_eq!(retried.status, JobStatus::Queued);
    assert_eq!(retried.retry_count, 1);
    assert!(retried.error.is_none());
    assert_eq!(retried.progress.percentage, 0);

    // The redelivery claims the job again and fails at the same step
    let outcome = orchestrator.process_message(message).await;
    assert!(matches!(outcome, ProcessOutcome::Failed(_)));
    assert_eq!(orchestrator.get_job_status(job_id).unwrap().retry_count, 1);
}

#[tokio::test]
async fn test_cancel_stops_before_the_next_step() {
    let gate = GatedService::default();
    let c = RecordingService::default();
    let (orchestrator, _sink) = abc_orchestrator(
        Arc::new(EchoService),
        Arc::new(gate.clone()),
        Arc::new(c.clone()),
    );
    let orchestrator = Arc::new(orchestrator);

    let job_id = orchestrator.queue_content_generation(ContentRequest::new("Service meshes"));
    let message = ContentGenerationMessage::for_job(&orchestrator.get_job_status(job_id).unwrap());

    let runner = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.process_message(message).await })
    };

    gate.entered.notified().await;
    orchestrator.cancel_job(job_id, "cancelled by user").unwrap();
    gate.release.notify_one();

    let outcome = runner.await.unwrap();
    assert_eq!(outcome, ProcessOutcome::Aborted);

    let job = orchestrator.get_job_status(job_id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.unwrap().code.as_deref(), Some("CANCELLED"));
    assert!(c.calls().await.is_empty());
}

#[tokio::test]
async fn test_notifier_receives_job_updates() {
    let (orchestrator, _sink) = echo_orchestrator();
    let forwarder = orchestrator.attach_notifier();

    let job_id = orchestrator.queue_content_generation(ContentRequest::new("Service meshes"));
    let (sink, mut updates) = ChannelSink::new();
    orchestrator
        .notifier()
        .register_connection("conn-1", "user-1", Arc::new(sink));
    assert!(orchestrator.notifier().subscribe_to_job("conn-1", job_id));

    let message = ContentGenerationMessage::for_job(&orchestrator.get_job_status(job_id).unwrap());
    assert_eq!(orchestrator.process_message(message).await, ProcessOutcome::Completed);

    let mut saw_progress = false;
    loop {
        let update = tokio::time::timeout(Duration::from_secs(2), updates.recv())
            .await
            .expect("notification should arrive")
            .expect("channel open");
        assert_eq!(update.job_id(), job_id);
        match update {
            NotificationEvent::JobProgress { .. } => saw_progress = true,
            NotificationEvent::JobStatus { status, .. } if status == JobStatus::Completed => break,
            NotificationEvent::JobStatus { .. } => {}
        }
    }
    assert!(saw_progress);

    forwarder.abort();
}

#[tokio::test]
async fn test_cancelled_attempt_cannot_complete_a_retried_job() {
    let gate = PerCallGate::default();
    let (orchestrator, _sink) = abc_orchestrator(
        Arc::new(EchoService),
        Arc::new(gate.clone()),
        Arc::new(EchoService),
    );
    let orchestrator = Arc::new(orchestrator);

    let job_id = orchestrator.queue_content_generation(ContentRequest::new("Service meshes"));
    let message = ContentGenerationMessage::for_job(&orchestrator.get_job_status(job_id).unwrap());
    let spawn_run = |message: ContentGenerationMessage| {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.process_message(message).await })
    };

    let first = spawn_run(message.clone());
    gate.entered.notified().await;

    orchestrator.cancel_job(job_id, "cancelled by user").unwrap();
    assert_eq!(orchestrator.retry_job(job_id).unwrap().retry_count, 1);

    let second = spawn_run(message);
    gate.entered.notified().await;

    // The cancelled attempt finishes its step while the retry is still running
    gate.releases[0].notify_one();
    assert_eq!(first.await.unwrap(), ProcessOutcome::Aborted);

    let job = orchestrator.get_job_status(job_id).unwrap();
    assert_eq!(job.status, JobStatus::Processing);
    assert_eq!(job.retry_count, 1);
    assert!(job.result.is_none());
    assert_eq!(job.progress.completed_steps, vec!["A".to_string()]);

    gate.releases[1].notify_one();
    assert_eq!(second.await.unwrap(), ProcessOutcome::Completed);

    let job = orchestrator.get_job_status(job_id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.result.unwrap().step_outputs["B"], json!({ "attempt": 1 }));
}

#[tokio::test]
async fn test_late_failure_keeps_the_cancel_error() {
    let gate = PerCallGate::failing();
    let (orchestrator, sink) = abc_orchestrator(
        Arc::new(EchoService),
        Arc::new(gate.clone()),
        Arc::new(EchoService),
    );
    let orchestrator = Arc::new(orchestrator);

    let job_id = orchestrator.queue_content_generation(ContentRequest::new("Service meshes"));
    let message = ContentGenerationMessage::for_job(&orchestrator.get_job_status(job_id).unwrap());
    let runner = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.process_message(message).await })
    };

    gate.entered.notified().await;
    orchestrator.cancel_job(job_id, "cancelled by user").unwrap();
    gate.releases[0].notify_one();

    assert_eq!(runner.await.unwrap(), ProcessOutcome::Aborted);

    let error = orchestrator.get_job_status(job_id).unwrap().error.unwrap();
    assert_eq!(error.code.as_deref(), Some("CANCELLED"));
    assert!(sink.events_named(events::JOB_FAILED).is_empty());
}

#[tokio::test]
async fn test_stored_job_type_wins_over_the_message() {
    let (orchestrator, _sink) = echo_orchestrator();

    let job_id = orchestrator.queue_content_generation(ContentRequest::new("Service meshes"));
    let mut message =
        ContentGenerationMessage::for_job(&orchestrator.get_job_status(job_id).unwrap());
    message.job_type = "missing".to_string();
    message.request = ContentRequest::new("Something else");

    assert_eq!(orchestrator.process_message(message).await, ProcessOutcome::Completed);

    let job = orchestrator.get_job_status(job_id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress.completed_steps, vec!["A", "B", "C"]);
    assert_eq!(job.request.topic, "Service meshes");
}
