//! The persisted workflow document
//!
//! The document is the boundary shape exchanged with the storage backend:
//! it is hydrated into a [`WorkflowGraph`] when a workflow is opened and
//! reconstituted from the current model on save. Writer configs travel in
//! a separate collection keyed by destination step name, as the backend
//! stores them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};
use crate::types::{
    Annotation, StepType, ViewportTransform, WorkflowEdge, WorkflowGraph, WorkflowNode,
    WorkflowType,
};
use crate::validation::validate_graph;

/// A workflow as stored by the backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDocument {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub execution_engine: WorkflowType,
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svg_position: Option<ViewportTransform>,
    /// Writer configs keyed by destination step name
    #[serde(default)]
    pub writers: HashMap<String, serde_json::Value>,
}

/// Build the in-memory model from a stored document
///
/// Writers are re-attached to the edges entering their Output step, the
/// transient `created_new` flag stays cleared, and a document violating
/// the structural invariants is rejected outright rather than loaded into
/// an editor that could never keep them.
pub fn hydrate(document: WorkflowDocument) -> Result<WorkflowGraph> {
    let mut graph = WorkflowGraph {
        nodes: document.nodes,
        edges: document.edges,
        annotations: document.annotations,
        svg_position: document.svg_position.unwrap_or_default(),
    };

    let output_steps: Vec<String> = graph
        .nodes
        .iter()
        .filter(|n| n.step_type == StepType::Output)
        .map(|n| n.name.clone())
        .collect();
    for edge in &mut graph.edges {
        if edge.writer.is_none() && output_steps.iter().any(|n| *n == edge.destination) {
            edge.writer = document.writers.get(&edge.destination).cloned();
        }
    }

    let violations = validate_graph(&graph);
    if !violations.is_empty() {
        let summary = violations
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(EditorError::InvalidDocument(summary));
    }
    Ok(graph)
}

/// Reconstitute the document shape from the current model
///
/// The inverse of [`hydrate`]: edge writers are pulled out into the keyed
/// collection the backend expects.
pub fn persist(
    graph: &WorkflowGraph,
    id: impl Into<String>,
    name: impl Into<String>,
    execution_engine: WorkflowType,
) -> WorkflowDocument {
    let mut writers = HashMap::new();
    let edges: Vec<WorkflowEdge> = graph
        .edges
        .iter()
        .map(|edge| {
            let mut edge = edge.clone();
            if let Some(writer) = edge.writer.take() {
                writers.entry(edge.destination.clone()).or_insert(writer);
            }
            edge
        })
        .collect();

    WorkflowDocument {
        id: id.into(),
        name: name.into(),
        execution_engine,
        nodes: graph.nodes.clone(),
        edges,
        annotations: graph.annotations.clone(),
        svg_position: Some(graph.svg_position),
        writers,
    }
}
