//! # Workflow Definitions
//!
//! Named, versioned workflow definitions: ordered steps with dependency edges,
//! each step bound to a layer-service collaborator through `service_ref`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical grouping of collaborators a step belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// Research and analysis (intent, keywords, competitors)
    Bottom,
    /// Structuring and drafting
    Middle,
    /// Optimization, citation and authority scoring
    Top,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bottom => "bottom",
            Self::Middle => "middle",
            Self::Top => "top",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of work bound to a layer-service collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub name: String,
    pub layer: Layer,
    /// Key of the collaborator in the service registry
    pub service_ref: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl WorkflowStep {
    pub fn new(name: &str, layer: Layer, service_ref: &str, depends_on: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            layer,
            service_ref: service_ref.to_string(),
            depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// Immutable workflow definition held by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    #[serde(rename = "type")]
    pub workflow_type: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    pub steps: Vec<WorkflowStep>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl WorkflowDefinition {
    pub fn new(workflow_type: &str, version: &str, steps: Vec<WorkflowStep>) -> Self {
        Self {
            workflow_type: workflow_type.to_string(),
            version: version.to_string(),
            description: None,
            steps,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn step(&self, name: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|step| step.name == name)
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name.as_str()).collect()
    }

    /// Distinct layers used by this workflow, in layer order
    pub fn layers(&self) -> Vec<Layer> {
        let mut layers: Vec<Layer> = self.steps.iter().map(|step| step.layer).collect();
        layers.sort();
        layers.dedup();
        layers
    }
}
