//! # Workflow Catalog
//!
//! Holds named, versioned workflow definitions. Definitions are validated and
//! linearized once, at registration; a definition with a cycle or a dangling
//! dependency never enters the catalog.
//!
//! ## Usage
//!
//! ```rust
//! use content_core::catalog::WorkflowCatalog;
//!
//! let catalog = WorkflowCatalog::with_builtin().unwrap();
//! let standard = catalog.get_workflow("standard").unwrap();
//! let order = catalog.get_execution_order(&standard).unwrap();
//! assert_eq!(order[0], "intent_analysis");
//! ```

pub mod builtin;
pub mod dependency_graph;

use crate::config::CatalogConfig;
use crate::error::{EngineError, Result};
use crate::models::WorkflowDefinition;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

pub use dependency_graph::DependencyValidation;

#[derive(Debug, Clone)]
struct CatalogEntry {
    definition: Arc<WorkflowDefinition>,
    execution_order: Arc<Vec<String>>,
}

/// Thread-safe catalog of workflow definitions keyed by workflow type
#[derive(Debug, Default)]
pub struct WorkflowCatalog {
    entries: RwLock<HashMap<String, CatalogEntry>>,
}

impl WorkflowCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-loaded with the built-in workflows
    pub fn with_builtin() -> Result<Self> {
        let catalog = Self::new();
        for definition in builtin::builtin_workflows() {
            catalog.register(definition)?;
        }
        Ok(catalog)
    }

    /// Build the catalog described by configuration; invalid definitions are fatal
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        let catalog = if config.include_builtin {
            Self::with_builtin()?
        } else {
            Self::new()
        };

        for definition in &config.workflows {
            catalog.register(definition.clone())?;
        }

        if !catalog.contains(&config.default_workflow) {
            return Err(EngineError::ConfigurationError(format!(
                "default workflow '{}' is not in the catalog",
                config.default_workflow
            )));
        }

        Ok(catalog)
    }

    /// Validate and add a definition, replacing any existing one of the same type
    pub fn register(&self, definition: WorkflowDefinition) -> Result<()> {
        let execution_order = dependency_graph::get_execution_order(&definition)?;

        let workflow_type = definition.workflow_type.clone();
        let version = definition.version.clone();
        let entry = CatalogEntry {
            definition: Arc::new(definition),
            execution_order: Arc::new(execution_order),
        };

        let previous = self.entries.write().insert(workflow_type.clone(), entry);
        match previous {
            Some(previous) => warn!(
                workflow_type = %workflow_type,
                previous_version = %previous.definition.version,
                version = %version,
                "Workflow already registered, replacing"
            ),
            None => info!(
                workflow_type = %workflow_type,
                version = %version,
                "Workflow registered"
            ),
        }

        Ok(())
    }

    pub fn get_workflow(&self, workflow_type: &str) -> Result<Arc<WorkflowDefinition>> {
        self.entries
            .read()
            .get(workflow_type)
            .map(|entry| entry.definition.clone())
            .ok_or_else(|| EngineError::WorkflowNotFound {
                workflow_type: workflow_type.to_string(),
            })
    }

    /// All definitions, ordered by workflow type
    pub fn get_available_workflows(&self) -> Vec<Arc<WorkflowDefinition>> {
        let mut workflows: Vec<_> = self
            .entries
            .read()
            .values()
            .map(|entry| entry.definition.clone())
            .collect();
        workflows.sort_by(|a, b| a.workflow_type.cmp(&b.workflow_type));
        workflows
    }

    pub fn contains(&self, workflow_type: &str) -> bool {
        self.entries.read().contains_key(workflow_type)
    }

    pub fn validate_workflow_dependencies(&self, definition: &WorkflowDefinition) -> DependencyValidation {
        dependency_graph::validate_workflow_dependencies(definition)
    }

    /// Execution order of a definition; cached for registered definitions
    pub fn get_execution_order(&self, definition: &WorkflowDefinition) -> Result<Vec<String>> {
        if let Some(entry) = self.entries.read().get(&definition.workflow_type) {
            if entry.definition.as_ref() == definition {
                return Ok(entry.execution_order.as_ref().clone());
            }
        }
        dependency_graph::get_execution_order(definition)
    }

    /// Definition together with its cached execution order
    pub fn resolve(&self, workflow_type: &str) -> Result<(Arc<WorkflowDefinition>, Arc<Vec<String>>)> {
        self.entries
            .read()
            .get(workflow_type)
            .map(|entry| (entry.definition.clone(), entry.execution_order.clone()))
            .ok_or_else(|| EngineError::WorkflowNotFound {
                workflow_type: workflow_type.to_string(),
            })
    }

    /// Every service reference used by any registered workflow
    pub fn service_refs(&self) -> Vec<String> {
        let mut refs: Vec<String> = self
            .entries
            .read()
            .values()
            .flat_map(|entry| entry.definition.steps.iter().map(|step| step.service_ref.clone()))
            .collect();
        refs.sort();
        refs.dedup();
        refs
    }
}
