// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DAG validation for workflow definitions.

use crate::model::WorkflowDef;
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

/// Errors from structural validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidateError {
    #[error("workflow has no steps")]
    NoSteps,

    #[error("duplicate step id: {0}")]
    DuplicateStepId(String),

    #[error("step '{step}' depends on unknown step '{dep}'")]
    UnknownDependency { step: String, dep: String },

    #[error("dependency cycle involving steps: {0}")]
    Cycle(String),
}

/// Validate the dependency graph and return a topological order of step ids.
///
/// Kahn's algorithm; a non-empty remainder after the queue drains means a
/// cycle. The reported cycle members are sorted for deterministic messages.
pub fn validate_dag(def: &WorkflowDef) -> Result<Vec<String>, ValidateError> {
    if def.steps.is_empty() {
        return Err(ValidateError::NoSteps);
    }

    let mut known: HashSet<&str> = HashSet::new();
    for step in &def.steps {
        if !known.insert(step.id.as_str()) {
            return Err(ValidateError::DuplicateStepId(step.id.clone()));
        }
    }

    // in-degree per step, and dependents adjacency
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for step in &def.steps {
        in_degree.entry(step.id.as_str()).or_insert(0);
        for dep in &step.depends_on {
            if !known.contains(dep.as_str()) {
                return Err(ValidateError::UnknownDependency {
                    step: step.id.clone(),
                    dep: dep.clone(),
                });
            }
            *in_degree.entry(step.id.as_str()).or_insert(0) += 1;
            dependents
                .entry(dep.as_str())
                .or_default()
                .push(step.id.as_str());
        }
    }

    // Seed the queue in definition order so the topo order is deterministic
    let mut queue: VecDeque<&str> = def
        .steps
        .iter()
        .filter(|s| in_degree.get(s.id.as_str()) == Some(&0))
        .map(|s| s.id.as_str())
        .collect();

    let mut order = Vec::with_capacity(def.steps.len());
    while let Some(id) = queue.pop_front() {
        order.push(id.to_string());
        if let Some(next) = dependents.get(id) {
            for &dependent in next {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }
    }

    if order.len() != def.steps.len() {
        let mut stuck: Vec<&str> = in_degree
            .iter()
            .filter(|(_, d)| **d > 0)
            .map(|(&id, _)| id)
            .collect();
        stuck.sort_unstable();
        return Err(ValidateError::Cycle(stuck.join(", ")));
    }

    Ok(order)
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
