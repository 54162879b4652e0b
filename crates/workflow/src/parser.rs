// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TOML parsing for workflow definitions.
//!
//! A definition document looks like:
//!
//! ```toml
//! name = "release"
//! on_failure = "abort"
//! max_retries = 1
//!
//! [[step]]
//! id = "build"
//! title = "Build and test"
//! assign = "auto"
//! skills = ["rust"]
//!
//! [step.handoff]
//! goal = "Produce a green build"
//! run_commands = ["cargo test"]
//!
//! [[step]]
//! id = "ship"
//! title = "Ship it"
//! assign = "release-bot"
//! depends_on = ["build"]
//!
//! [step.condition]
//! when = "step.build.result == 'accepted'"
//!
//! [step.handoff]
//! goal = "Tag and publish"
//! ```

use crate::condition;
use crate::model::WorkflowDef;
use crate::validate::{validate_dag, ValidateError};
use std::collections::HashSet;
use thiserror::Error;

/// Errors from parsing a workflow definition document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid workflow document: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("workflow name must not be empty")]
    EmptyName,

    #[error("step '{step}': goal must not be empty")]
    EmptyGoal { step: String },

    #[error("step '{step}': invalid condition: {inner}")]
    Condition {
        step: String,
        inner: condition::ConditionError,
    },

    #[error("step '{step}': condition references unknown step '{referenced}'")]
    ConditionUnknownStep { step: String, referenced: String },

    #[error(transparent)]
    Invalid(#[from] ValidateError),
}

/// Parse and fully validate a workflow definition.
///
/// Schema errors, empty goals, bad condition grammar, unknown condition
/// references, unknown dependencies, and cycles are all rejected here so a
/// `WorkflowDef` in hand is safe to schedule.
pub fn parse_workflow(text: &str) -> Result<WorkflowDef, ParseError> {
    let def: WorkflowDef = toml::from_str(text)?;

    if def.name.trim().is_empty() {
        return Err(ParseError::EmptyName);
    }

    validate_dag(&def)?;

    let known: HashSet<&str> = def.steps.iter().map(|s| s.id.as_str()).collect();
    for step in &def.steps {
        if step.handoff.goal.trim().is_empty() {
            return Err(ParseError::EmptyGoal {
                step: step.id.clone(),
            });
        }
        if let Some(cond) = &step.condition {
            let expr = condition::parse(&cond.when).map_err(|inner| ParseError::Condition {
                step: step.id.clone(),
                inner,
            })?;
            for path in expr.paths() {
                if path.first().map(String::as_str) == Some("step") {
                    if let Some(referenced) = path.get(1) {
                        if !known.contains(referenced.as_str()) {
                            return Err(ParseError::ConditionUnknownStep {
                                step: step.id.clone(),
                                referenced: referenced.clone(),
                            });
                        }
                    }
                }
            }
        }
    }

    Ok(def)
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
