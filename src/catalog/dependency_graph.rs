//! Dependency graph checks and linearization for workflow definitions.
//!
//! Linearization is Kahn's algorithm with a deterministic tie-break: among the
//! steps whose dependencies are all satisfied, the one declared first in the
//! definition runs first.

use crate::error::{EngineError, Result};
use crate::models::WorkflowDefinition;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Result of `validate_workflow_dependencies`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Check references, duplicates and acyclicity of a definition
pub fn validate_workflow_dependencies(definition: &WorkflowDefinition) -> DependencyValidation {
    let mut errors = structural_errors(definition);

    if let Err(leftover) = kahn_order(definition) {
        errors.push(format!(
            "Cycle detected among steps: {}",
            leftover.join(", ")
        ));
    }

    DependencyValidation {
        valid: errors.is_empty(),
        errors,
    }
}

/// Linearize a definition so every step follows all of its dependencies
pub fn get_execution_order(definition: &WorkflowDefinition) -> Result<Vec<String>> {
    let errors = structural_errors(definition);
    if !errors.is_empty() {
        return Err(EngineError::InvalidWorkflow {
            workflow_type: definition.workflow_type.clone(),
            errors,
        });
    }

    kahn_order(definition).map_err(|steps| EngineError::CyclicDependency {
        workflow_type: definition.workflow_type.clone(),
        steps,
    })
}

/// Problems that make the graph meaningless regardless of ordering
fn structural_errors(definition: &WorkflowDefinition) -> Vec<String> {
    let mut errors = Vec::new();

    if definition.steps.is_empty() {
        errors.push("Workflow has no steps".to_string());
    }

    let mut seen = HashSet::new();
    for step in &definition.steps {
        if !seen.insert(step.name.as_str()) {
            errors.push(format!("Duplicate step name: {}", step.name));
        }
    }

    for step in &definition.steps {
        for dependency in &step.depends_on {
            if dependency == &step.name {
                errors.push(format!("Step {} depends on itself", step.name));
            } else if !seen.contains(dependency.as_str()) {
                errors.push(format!(
                    "Step {} depends on unknown step {}",
                    step.name, dependency
                ));
            }
        }
    }

    errors
}

/// Kahn's algorithm; on failure returns the steps that could never be scheduled.
/// Unknown dependency names are skipped here and reported by `structural_errors`.
fn kahn_order(definition: &WorkflowDefinition) -> std::result::Result<Vec<String>, Vec<String>> {
    let index: HashMap<&str, usize> = definition
        .steps
        .iter()
        .enumerate()
        .map(|(position, step)| (step.name.as_str(), position))
        .collect();

    let mut in_degree = vec![0usize; definition.steps.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); definition.steps.len()];

    for (position, step) in definition.steps.iter().enumerate() {
        let unique: BTreeSet<usize> = step
            .depends_on
            .iter()
            .filter_map(|dependency| index.get(dependency.as_str()).copied())
            .collect();

        for dependency in unique {
            in_degree[position] += 1;
            dependents[dependency].push(position);
        }
    }

    let mut ready: BTreeSet<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(position, _)| position)
        .collect();

    let mut order = Vec::with_capacity(definition.steps.len());

    while let Some(position) = ready.pop_first() {
        order.push(definition.steps[position].name.clone());

        for &dependent in &dependents[position] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() == definition.steps.len() {
        Ok(order)
    } else {
        Err(definition
            .steps
            .iter()
            .enumerate()
            .filter(|(position, _)| in_degree[*position] > 0)
            .map(|(_, step)| step.name.clone())
            .collect())
    }
}
