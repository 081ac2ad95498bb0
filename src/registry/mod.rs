//! # Registry Infrastructure
//!
//! Collaborator registries consulted by the orchestrator.

pub mod service_registry;

pub use service_registry::{LayerService, ServiceRegistry};
