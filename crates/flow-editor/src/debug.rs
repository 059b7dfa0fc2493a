//! Read-only consumer of debug execution results
//!
//! The execution backend reports a result or error per step, keyed by step
//! name. The editor only indexes into the map, it never mutates it. Each
//! step additionally exposes a discard channel under `{name}_Discard`,
//! which is where edges of the discard data type read from.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{EdgeDataType, WorkflowGraph};

/// Key suffix of a step's discarded-records channel
pub const DISCARD_SUFFIX: &str = "_Discard";

/// Debug channel key for a step's discarded records
pub fn discard_key(step_name: &str) -> String {
    format!("{}{}", step_name, DISCARD_SUFFIX)
}

/// Outcome of one step in a debug run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

impl StepResult {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Result of a debug run, keyed by step name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebugResult {
    #[serde(default)]
    pub steps: HashMap<String, StepResult>,
}

impl DebugResult {
    /// The entry for a step, when the run produced one
    pub fn step_result(&self, name: &str) -> Option<&StepResult> {
        self.steps.get(name)
    }

    /// Entries feeding a step, one per incoming edge
    ///
    /// A valid-data edge resolves to its origin's entry, a discard edge to
    /// the origin's discard channel. Edges whose channel produced nothing
    /// are skipped.
    pub fn input_results<'a>(
        &'a self,
        graph: &WorkflowGraph,
        name: &str,
    ) -> Vec<&'a StepResult> {
        graph
            .edges
            .iter()
            .filter(|e| e.destination == name)
            .filter_map(|e| {
                let key = match e.data_type {
                    EdgeDataType::ValidData => e.origin.clone(),
                    EdgeDataType::Discard => discard_key(&e.origin),
                };
                self.steps.get(&key)
            })
            .collect()
    }
}
