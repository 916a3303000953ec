//! Pure lookup and graph utilities over workflow definitions.
//!
//! The import-side workflow driver uses these to find steps, classify the
//! pseudo-steps, and compute transition paths. `shortest_path` exists
//! because the platform only allows publishing from specific predecessor
//! steps, so the driver walks to the penultimate step on the path to
//! `published` before issuing the publish call.

use std::collections::{HashMap, HashSet, VecDeque};

use uuid::Uuid;

use content_migrator_shared::types::{
    Workflow, WorkflowStep, ARCHIVED_STEP_CODENAME, PUBLISHED_STEP_CODENAME,
    SCHEDULED_STEP_CODENAME,
};

use crate::errors::WorkflowError;

/// Finds a workflow by codename.
pub fn workflow_by_codename<'a>(
    workflows: &'a [Workflow],
    codename: &str,
) -> Result<&'a Workflow, WorkflowError> {
    workflows
        .iter()
        .find(|w| w.codename == codename)
        .ok_or_else(|| WorkflowError::WorkflowNotFound(codename.to_string()))
}

/// Finds a step (custom or pseudo) by id within one workflow.
pub fn step_by_id<'a>(workflow: &'a Workflow, id: &Uuid) -> Result<&'a WorkflowStep, WorkflowError> {
    workflow
        .all_steps()
        .find(|s| &s.id == id)
        .ok_or_else(|| WorkflowError::StepNotFound {
            workflow: workflow.codename.clone(),
            step: id.to_string(),
        })
}

/// Finds a step (custom or pseudo) by codename within one workflow.
pub fn step_by_codename<'a>(
    workflow: &'a Workflow,
    codename: &str,
) -> Result<&'a WorkflowStep, WorkflowError> {
    workflow
        .all_steps()
        .find(|s| s.codename == codename)
        .ok_or_else(|| WorkflowError::StepNotFound {
            workflow: workflow.codename.clone(),
            step: codename.to_string(),
        })
}

pub fn is_published_step(codename: &str) -> bool {
    codename == PUBLISHED_STEP_CODENAME
}

pub fn is_archived_step(codename: &str) -> bool {
    codename == ARCHIVED_STEP_CODENAME
}

pub fn is_scheduled_step(codename: &str) -> bool {
    codename == SCHEDULED_STEP_CODENAME
}

/// BFS over the directed graph defined by each step's `transitions_to`.
///
/// Returns the full path including both endpoints. Ties between equal-length
/// paths are broken by the declaration order of the workflow's steps.
pub fn shortest_path<'a>(
    workflow: &'a Workflow,
    from: &str,
    to: &str,
) -> Result<Vec<&'a WorkflowStep>, WorkflowError> {
    let start = step_by_codename(workflow, from)?;
    let goal = step_by_codename(workflow, to)?;
    if start.id == goal.id {
        return Ok(vec![start]);
    }

    let steps: HashMap<Uuid, &WorkflowStep> =
        workflow.all_steps().map(|s| (s.id, s)).collect();
    let order: HashMap<Uuid, usize> = workflow
        .all_steps()
        .enumerate()
        .map(|(index, s)| (s.id, index))
        .collect();

    let mut queue = VecDeque::from([start.id]);
    let mut visited: HashSet<Uuid> = HashSet::from([start.id]);
    let mut predecessor: HashMap<Uuid, Uuid> = HashMap::new();

    while let Some(current) = queue.pop_front() {
        let Some(step) = steps.get(&current) else {
            continue;
        };
        let mut neighbors: Vec<Uuid> = step
            .transitions_to
            .iter()
            .copied()
            .filter(|id| steps.contains_key(id))
            .collect();
        neighbors.sort_by_key(|id| order.get(id).copied().unwrap_or(usize::MAX));

        for next in neighbors {
            if !visited.insert(next) {
                continue;
            }
            predecessor.insert(next, current);
            if next == goal.id {
                let mut ids = vec![goal.id];
                let mut cursor = goal.id;
                while let Some(previous) = predecessor.get(&cursor) {
                    ids.push(*previous);
                    cursor = *previous;
                }
                ids.reverse();
                return Ok(ids
                    .into_iter()
                    .filter_map(|id| steps.get(&id).copied())
                    .collect());
            }
            queue.push_back(next);
        }
    }

    Err(WorkflowError::NoPath {
        workflow: workflow.codename.clone(),
        from: from.to_string(),
        to: to.to_string(),
    })
}

/// The step to move to immediately before publishing: the penultimate step
/// on the shortest path from `from` to the published step. When `from` is
/// already an immediate predecessor (or is the published step itself), that
/// is `from`.
pub fn publish_predecessor<'a>(
    workflow: &'a Workflow,
    from: &str,
) -> Result<&'a WorkflowStep, WorkflowError> {
    let path = shortest_path(workflow, from, PUBLISHED_STEP_CODENAME)?;
    if path.len() >= 2 {
        Ok(path[path.len() - 2])
    } else {
        step_by_codename(workflow, from)
    }
}
