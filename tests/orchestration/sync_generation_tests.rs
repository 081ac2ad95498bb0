use crate::common::*;
use content_core::constants::events;
use content_core::error::{EngineError, ServiceError};
use content_core::models::ContentRequest;
use std::sync::Arc;

#[tokio::test]
async fn test_sync_generation_runs_dependencies_first() {
    let (orchestrator, _sink) = echo_orchestrator();

    let result = orchestrator
        .generate_content_sync(ContentRequest::new("Edge caching"))
        .await
        .unwrap();

    assert_eq!(result.completed_steps.len(), 3);
    assert_eq!(result.completed_steps[0], "A");
    assert_eq!(result.total_steps, 3);
    assert_eq!(result.content.metadata.workflow_type, "standard");

    // B and C both saw A's output before running
    for step in ["B", "C"] {
        let seen = result.content.step_outputs[step]["seenSteps"]
            .as_array()
            .unwrap()
            .clone();
        assert!(seen.iter().any(|s| s == "A"), "{step} ran before A");
    }
}

#[tokio::test]
async fn test_sync_generation_stops_at_first_failure() {
    let c = RecordingService::default();
    let (orchestrator, sink) = abc_orchestrator(
        Arc::new(EchoService),
        Arc::new(FailingService(ServiceError::ExecutionFailed("model overloaded".into()))),
        Arc::new(c.clone()),
    );

    let err = orchestrator
        .generate_content_sync(ContentRequest::new("Edge caching"))
        .await
        .unwrap_err();

    match &err {
        EngineError::StepFailed { step_name, cause } => {
            assert_eq!(step_name, "B");
            assert_eq!(cause, &ServiceError::ExecutionFailed("model overloaded".into()));
        }
        other => panic!("expected StepFailed, got {other:?}"),
    }
    assert!(c.calls().await.is_empty());
    assert!(orchestrator.job_store().is_empty());

    let failures = sink.events_named(events::SYNC_FAILED);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["step"], "B");
}

#[tokio::test]
async fn test_sync_generation_unknown_workflow() {
    let (orchestrator, _sink) = echo_orchestrator();

    let err = orchestrator
        .generate_content_sync(ContentRequest::new("Edge caching").with_workflow("nonexistent"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::WorkflowNotFound {
            workflow_type: "nonexistent".to_string()
        }
    );
}

#[tokio::test]
async fn test_sync_generation_missing_service_is_a_step_failure() {
    let orchestrator = content_core::ContentOrchestrator::builder()
        .with_catalog(catalog_with(vec![abc_workflow()]))
        .with_service("svc-a", Arc::new(EchoService))
        .build()
        .unwrap();

    let err = orchestrator
        .generate_content_sync(ContentRequest::new("Edge caching"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::StepFailed {
            cause: ServiceError::Unavailable(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_sync_generation_emits_telemetry() {
    let (orchestrator, sink) = echo_orchestrator();

    let result = orchestrator
        .generate_content_sync(ContentRequest::new("Edge caching"))
        .await
        .unwrap();

    let completed = sink.events_named(events::SYNC_COMPLETED);
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0]["contentId"], result.content.content_id.as_str());
    assert_eq!(completed[0]["steps"], 3);
}
