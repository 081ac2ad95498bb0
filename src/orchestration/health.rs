//! # Health Reporting
//!
//! Queue reachability plus a per-layer rollup of collaborator availability.
//! A layer is healthy when every service its steps reference is registered
//! and passes its own health check.

use crate::catalog::WorkflowCatalog;
use crate::models::{JobStats, Layer};
use crate::notifier::ConnectionStatistics;
use crate::registry::ServiceRegistry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Reachable,
    Unreachable,
    NotConfigured,
}

/// Reachability check for the external work queue / message bus
#[async_trait]
pub trait QueueProbe: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub service_ref: String,
    pub registered: bool,
    pub healthy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerHealth {
    pub layer: Layer,
    pub status: HealthState,
    pub services: Vec<ServiceHealth>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: HealthState,
    pub queue: QueueStatus,
    pub layers: Vec<LayerHealth>,
    pub notifier: ConnectionStatistics,
    pub jobs: JobStats,
    pub workflows: usize,
    pub checked_at: DateTime<Utc>,
}

/// Probe queue and collaborators, then roll the results up
pub(crate) async fn check_health(
    catalog: &WorkflowCatalog,
    services: &ServiceRegistry,
    queue_probe: Option<&dyn QueueProbe>,
    notifier: ConnectionStatistics,
    jobs: JobStats,
) -> HealthStatus {
    let queue = match queue_probe {
        None => QueueStatus::NotConfigured,
        Some(probe) if probe.is_reachable().await => QueueStatus::Reachable,
        Some(_) => QueueStatus::Unreachable,
    };

    let workflows = catalog.get_available_workflows();
    let mut refs_by_layer: BTreeMap<Layer, BTreeSet<String>> = BTreeMap::new();
    for workflow in &workflows {
        for step in &workflow.steps {
            refs_by_layer
                .entry(step.layer)
                .or_default()
                .insert(step.service_ref.clone());
        }
    }

    let layers = join_all(
        refs_by_layer
            .into_iter()
            .map(|(layer, refs)| check_layer(services, layer, refs)),
    )
    .await;

    HealthStatus {
        status: rollup(queue, &layers),
        queue,
        layers,
        notifier,
        jobs,
        workflows: workflows.len(),
        checked_at: Utc::now(),
    }
}

async fn check_layer(services: &ServiceRegistry, layer: Layer, refs: BTreeSet<String>) -> LayerHealth {
    let checks = refs.into_iter().map(|service_ref| async move {
        match services.resolve(&service_ref) {
            Ok(service) => ServiceHealth {
                healthy: service.health_check().await,
                registered: true,
                service_ref,
            },
            Err(_) => ServiceHealth {
                service_ref,
                registered: false,
                healthy: false,
            },
        }
    });
    let services = join_all(checks).await;

    let status = if services.iter().all(|service| service.healthy) {
        HealthState::Healthy
    } else {
        HealthState::Degraded
    };

    LayerHealth {
        layer,
        status,
        services,
    }
}

/// Unhealthy when the queue is down or no layer is usable; degraded when any
/// layer is missing collaborators.
fn rollup(queue: QueueStatus, layers: &[LayerHealth]) -> HealthState {
    let degraded = layers
        .iter()
        .filter(|layer| layer.status != HealthState::Healthy)
        .count();

    if queue == QueueStatus::Unreachable || (!layers.is_empty() && degraded == layers.len()) {
        HealthState::Unhealthy
    } else if degraded > 0 {
        HealthState::Degraded
    } else {
        HealthState::Healthy
    }
}
