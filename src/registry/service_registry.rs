//! # Layer Service Registry
//!
//! Explicit mapping from a step's `service_ref` to the collaborator that
//! executes it. The registry is populated at startup; the orchestrator only
//! ever sees the [`LayerService`] interface.
//!
//! ## Usage
//!
//! ```rust
//! use async_trait::async_trait;
//! use content_core::error::ServiceError;
//! use content_core::orchestration::PipelineContext;
//! use content_core::registry::{LayerService, ServiceRegistry};
//! use serde_json::{json, Value};
//! use std::sync::Arc;
//!
//! struct IntentAnalyzer;
//!
//! #[async_trait]
//! impl LayerService for IntentAnalyzer {
//!     async fn execute(&self, context: &PipelineContext) -> Result<Value, ServiceError> {
//!         Ok(json!({ "intent": "informational", "topic": context.request.topic }))
//!     }
//! }
//!
//! let registry = ServiceRegistry::new();
//! registry.register("intent-analyzer", Arc::new(IntentAnalyzer));
//! assert!(registry.contains("intent-analyzer"));
//! ```

use crate::error::{EngineError, Result, ServiceError};
use crate::orchestration::types::PipelineContext;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Capability every step collaborator exposes.
///
/// The orchestrator imposes no timeout; a collaborator that needs one enforces
/// it itself and reports [`ServiceError::Timeout`].
#[async_trait]
pub trait LayerService: Send + Sync {
    /// Produce this step's partial result from the accumulated context
    async fn execute(&self, context: &PipelineContext) -> std::result::Result<Value, ServiceError>;

    /// Whether the collaborator can currently serve requests
    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Thread-safe `service_ref` to collaborator map
#[derive(Default)]
pub struct ServiceRegistry {
    services: RwLock<HashMap<String, Arc<dyn LayerService>>>,
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("service_refs", &self.service_refs())
            .finish()
    }
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a collaborator, replacing any previous binding
    pub fn register(&self, service_ref: &str, service: Arc<dyn LayerService>) {
        let mut services = self.services.write();
        if services.contains_key(service_ref) {
            warn!(service_ref = service_ref, "Service already registered, replacing");
        }
        info!(
            service_ref = service_ref,
            service = service.name(),
            "Registering layer service"
        );
        services.insert(service_ref.to_string(), service);
    }

    pub fn unregister(&self, service_ref: &str) -> Option<Arc<dyn LayerService>> {
        let removed = self.services.write().remove(service_ref);
        if removed.is_some() {
            debug!(service_ref = service_ref, "Unregistered layer service");
        }
        removed
    }

    /// Look up the collaborator bound to `service_ref`
    pub fn resolve(&self, service_ref: &str) -> Result<Arc<dyn LayerService>> {
        self.services
            .read()
            .get(service_ref)
            .cloned()
            .ok_or_else(|| EngineError::ServiceUnavailable {
                service_ref: service_ref.to_string(),
            })
    }

    pub fn contains(&self, service_ref: &str) -> bool {
        self.services.read().contains_key(service_ref)
    }

    pub fn service_refs(&self) -> Vec<String> {
        let mut refs: Vec<String> = self.services.read().keys().cloned().collect();
        refs.sort();
        refs
    }

    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }
}
