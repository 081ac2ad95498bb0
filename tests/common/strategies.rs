use content_core::models::{Layer, WorkflowDefinition, WorkflowStep};
use content_core::state_machine::JobStatus;
use proptest::prelude::*;

fn step_name(index: usize) -> String {
    format!("step_{index}")
}

fn layer_for(index: usize) -> Layer {
    match index % 3 {
        0 => Layer::Bottom,
        1 => Layer::Middle,
        _ => Layer::Top,
    }
}

fn definition(steps: Vec<WorkflowStep>) -> WorkflowDefinition {
    WorkflowDefinition::new("generated", "1.0.0", steps)
}

/// Acyclic workflows: step `i` may only depend on steps `< i`, and the
/// declaration order is shuffled afterwards
pub fn acyclic_workflow_strategy() -> impl Strategy<Value = WorkflowDefinition> {
    (1usize..12)
        .prop_flat_map(|size| {
            let dependency_masks = (0..size)
                .map(|index| prop::collection::vec(any::<bool>(), index))
                .collect::<Vec<_>>();
            dependency_masks
        })
        .prop_map(|masks| {
            masks
                .into_iter()
                .enumerate()
                .map(|(index, mask)| WorkflowStep {
                    name: step_name(index),
                    layer: layer_for(index),
                    service_ref: format!("svc-{}", index % 4),
                    depends_on: mask
                        .into_iter()
                        .enumerate()
                        .filter_map(|(dep, chosen)| chosen.then(|| step_name(dep)))
                        .collect(),
                })
                .collect::<Vec<_>>()
        })
        .prop_shuffle()
        .prop_map(definition)
}

/// Workflows containing a dependency cycle of length 2..6 plus unrelated steps
pub fn cyclic_workflow_strategy() -> impl Strategy<Value = WorkflowDefinition> {
    (2usize..6, 0usize..4)
        .prop_map(|(cycle_len, extra)| {
            let mut steps: Vec<WorkflowStep> = (0..cycle_len)
                .map(|index| WorkflowStep {
                    name: step_name(index),
                    layer: layer_for(index),
                    service_ref: "svc".to_string(),
                    depends_on: vec![step_name((index + 1) % cycle_len)],
                })
                .collect();
            steps.extend((cycle_len..cycle_len + extra).map(|index| WorkflowStep {
                name: step_name(index),
                layer: layer_for(index),
                service_ref: "svc".to_string(),
                depends_on: Vec::new(),
            }));
            steps
        })
        .prop_shuffle()
        .prop_map(definition)
}

pub fn job_status_strategy() -> impl Strategy<Value = JobStatus> {
    prop_oneof![
        Just(JobStatus::Queued),
        Just(JobStatus::Processing),
        Just(JobStatus::Completed),
        Just(JobStatus::Failed),
    ]
}

/// Arbitrary sequences of requested target statuses
pub fn transition_sequence_strategy() -> impl Strategy<Value = Vec<JobStatus>> {
    prop::collection::vec(job_status_strategy(), 0..24)
}
