use crate::common::*;
use async_trait::async_trait;
use content_core::models::{ContentRequest, Layer};
use content_core::notifier::ChannelSink;
use content_core::orchestration::{HealthState, QueueProbe, QueueStatus};
use content_core::ContentOrchestrator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct FlagProbe(AtomicBool);

#[async_trait]
impl QueueProbe for FlagProbe {
    async fn is_reachable(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn test_all_services_present_is_healthy() {
    let (orchestrator, _sink) = echo_orchestrator();

    let health = orchestrator.get_health_status().await;

    assert_eq!(health.status, HealthState::Healthy);
    assert_eq!(health.queue, QueueStatus::NotConfigured);
    assert_eq!(health.workflows, 1);
    assert_eq!(health.layers.len(), 3);
}

#[tokio::test]
async fn test_missing_service_degrades_its_layer() {
    let orchestrator = ContentOrchestrator::builder()
        .with_catalog(catalog_with(vec![abc_workflow()]))
        .with_service("svc-a", Arc::new(EchoService))
        .with_service("svc-b", Arc::new(EchoService))
        .build()
        .unwrap();

    let health = orchestrator.get_health_status().await;
    assert_eq!(health.status, HealthState::Degraded);

    let top = health
        .layers
        .iter()
        .find(|layer| layer.layer == Layer::Top)
        .unwrap();
    assert_eq!(top.status, HealthState::Degraded);
    assert!(!top.services[0].registered);
}

#[tokio::test]
async fn test_every_layer_down_is_unhealthy() {
    let (orchestrator, _sink) = abc_orchestrator(
        Arc::new(UnhealthyService),
        Arc::new(UnhealthyService),
        Arc::new(UnhealthyService),
    );

    let health = orchestrator.get_health_status().await;

    assert_eq!(health.status, HealthState::Unhealthy);
    assert!(health
        .layers
        .iter()
        .flat_map(|layer| &layer.services)
        .all(|service| service.registered && !service.healthy));
}

#[tokio::test]
async fn test_unreachable_queue_is_unhealthy() {
    let probe = Arc::new(FlagProbe(AtomicBool::new(true)));
    let orchestrator = ContentOrchestrator::builder()
        .with_catalog(catalog_with(vec![abc_workflow()]))
        .with_service("svc-a", Arc::new(EchoService))
        .with_service("svc-b", Arc::new(EchoService))
        .with_service("svc-c", Arc::new(EchoService))
        .with_queue_probe(probe.clone())
        .build()
        .unwrap();

    let health = orchestrator.get_health_status().await;
    assert_eq!(health.queue, QueueStatus::Reachable);
    assert_eq!(health.status, HealthState::Healthy);

    probe.0.store(false, Ordering::SeqCst);
    let health = orchestrator.get_health_status().await;
    assert_eq!(health.queue, QueueStatus::Unreachable);
    assert_eq!(health.status, HealthState::Unhealthy);
}

#[tokio::test]
async fn test_health_reports_jobs_and_connections() {
    let (orchestrator, _sink) = echo_orchestrator();
    orchestrator.queue_content_generation(ContentRequest::new("one"));
    orchestrator.queue_content_generation(ContentRequest::new("two"));

    let (sink, _updates) = ChannelSink::new();
    orchestrator
        .notifier()
        .register_connection("conn-1", "user-1", Arc::new(sink));

    let health = orchestrator.get_health_status().await;

    assert_eq!(health.jobs.total, 2);
    assert_eq!(health.jobs.queued, 2);
    assert_eq!(health.notifier.total_connections, 1);
}
