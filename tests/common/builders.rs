//! Mock collaborators and fixture builders shared by the integration tests.

use async_trait::async_trait;
use content_core::catalog::WorkflowCatalog;
use content_core::error::ServiceError;
use content_core::events::{RecordingTelemetrySink, Telemetry};
use content_core::models::{Layer, WorkflowDefinition, WorkflowStep};
use content_core::orchestration::{ContentOrchestrator, PipelineContext};
use content_core::registry::LayerService;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

/// Returns the step name and the steps it could already see
pub struct EchoService;

#[async_trait]
impl LayerService for EchoService {
    async fn execute(&self, context: &PipelineContext) -> Result<Value, ServiceError> {
        Ok(json!({
            "step": context.current_step,
            "seenSteps": context.completed_steps,
            "topic": context.request.topic,
        }))
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// Always fails with the configured error
pub struct FailingService(pub ServiceError);

#[async_trait]
impl LayerService for FailingService {
    async fn execute(&self, _context: &PipelineContext) -> Result<Value, ServiceError> {
        Err(self.0.clone())
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Records every step it executes, in call order
#[derive(Default, Clone)]
pub struct RecordingService {
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingService {
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl LayerService for RecordingService {
    async fn execute(&self, context: &PipelineContext) -> Result<Value, ServiceError> {
        let step = context.current_step.clone().unwrap_or_default();
        self.calls.lock().await.push(step.clone());
        tokio::time::sleep(Duration::from_millis(1)).await;
        Ok(json!({ "recorded": step }))
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Blocks until released, so a test can act while a step is in flight
#[derive(Default, Clone)]
pub struct GatedService {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[async_trait]
impl LayerService for GatedService {
    async fn execute(&self, _context: &PipelineContext) -> Result<Value, ServiceError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(json!({ "gated": true }))
    }
}

/// Reports itself unhealthy but still executes
pub struct UnhealthyService;

#[async_trait]
impl LayerService for UnhealthyService {
    async fn execute(&self, _context: &PipelineContext) -> Result<Value, ServiceError> {
        Ok(Value::Null)
    }

    async fn health_check(&self) -> bool {
        false
    }
}

/// `standard` with A, B(A), C(A), each bound to its own service ref
pub fn abc_workflow() -> WorkflowDefinition {
    WorkflowDefinition::new(
        "standard",
        "1.0.0",
        vec![
            WorkflowStep::new("A", Layer::Bottom, "svc-a", &[]),
            WorkflowStep::new("B", Layer::Middle, "svc-b", &["A"]),
            WorkflowStep::new("C", Layer::Top, "svc-c", &["A"]),
        ],
    )
}

pub fn catalog_with(definitions: Vec<WorkflowDefinition>) -> Arc<WorkflowCatalog> {
    let catalog = WorkflowCatalog::new();
    for definition in definitions {
        catalog.register(definition).expect("fixture workflow must be valid");
    }
    Arc::new(catalog)
}

/// Orchestrator over the A/B/C workflow with the given services bound
pub fn abc_orchestrator(
    a: Arc<dyn LayerService>,
    b: Arc<dyn LayerService>,
    c: Arc<dyn LayerService>,
) -> (ContentOrchestrator, Arc<RecordingTelemetrySink>) {
    let sink = Arc::new(RecordingTelemetrySink::new());
    let orchestrator = ContentOrchestrator::builder()
        .with_catalog(catalog_with(vec![abc_workflow()]))
        .with_service("svc-a", a)
        .with_service("svc-b", b)
        .with_service("svc-c", c)
        .with_telemetry(Telemetry::new(sink.clone(), true))
        .build()
        .expect("orchestrator should build");
    (orchestrator, sink)
}

pub fn echo_orchestrator() -> (ContentOrchestrator, Arc<RecordingTelemetrySink>) {
    abc_orchestrator(Arc::new(EchoService), Arc::new(EchoService), Arc::new(EchoService))
}
