//! Connection and graph validation
//!
//! Decides whether a proposed connection between two steps is legal, and
//! audits whole graphs against the structural invariants (unique names,
//! resolvable edge endpoints, no self-loops, one edge per step pair).

use std::collections::HashSet;

use crate::error::{EditorError, Result};
use crate::types::{StepType, WorkflowGraph};

/// Outcome of a successful connection check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeValidation {
    /// The destination is an Output step and the new edge must carry a
    /// freshly generated writer configuration
    pub writer_required: bool,
}

/// Check whether a connection from `origin` to `destination` may be created
///
/// Rules, in order: reject when an edge already exists between the two
/// names in either direction, reject a self-connection, then accept. The
/// accepted result signals whether a writer config has to be generated.
pub fn validate_connection(
    graph: &WorkflowGraph,
    origin: &str,
    destination: &str,
) -> Result<EdgeValidation> {
    if graph.edge_between(origin, destination).is_some() {
        return Err(EditorError::DuplicateConnection {
            origin: origin.to_string(),
            destination: destination.to_string(),
        });
    }
    if origin == destination {
        return Err(EditorError::SelfConnection {
            name: origin.to_string(),
        });
    }
    if !graph.contains_node(origin) {
        return Err(EditorError::NotFound {
            name: origin.to_string(),
        });
    }
    let destination_node = graph.find_node(destination).ok_or(EditorError::NotFound {
        name: destination.to_string(),
    })?;

    Ok(EdgeValidation {
        writer_required: destination_node.step_type == StepType::Output,
    })
}

/// Structural invariant violation with location context
#[derive(Debug, Clone)]
pub enum StructuralError {
    /// Two steps share the same name
    DuplicateNodeName { name: String },
    /// An edge references a step name that does not exist
    DanglingEdge {
        origin: String,
        destination: String,
        missing: String,
    },
    /// An edge connects a step to itself
    SelfLoop { name: String },
    /// More than one edge exists between the same pair of steps
    DuplicateEdgePair { a: String, b: String },
    /// An annotation references a step or edge that does not exist
    OrphanAnnotation { key: String },
}

impl std::fmt::Display for StructuralError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateNodeName { name } => {
                write!(f, "Step name '{}' is used more than once", name)
            }
            Self::DanglingEdge {
                origin,
                destination,
                missing,
            } => write!(
                f,
                "Edge '{}' -> '{}' references unknown step '{}'",
                origin, destination, missing
            ),
            Self::SelfLoop { name } => write!(f, "Step '{}' is connected to itself", name),
            Self::DuplicateEdgePair { a, b } => {
                write!(f, "Multiple edges between '{}' and '{}'", a, b)
            }
            Self::OrphanAnnotation { key } => {
                write!(f, "Annotation '{}' has no step or edge to attach to", key)
            }
        }
    }
}

impl std::error::Error for StructuralError {}

/// Audit a graph against the structural invariants
///
/// Returns all violations found (not just the first). A graph produced by
/// the mutation engine is expected to audit clean after every operation;
/// this is used by tests and to reject corrupt documents on hydration.
pub fn validate_graph(graph: &WorkflowGraph) -> Vec<StructuralError> {
    let mut errors = Vec::new();

    validate_node_names(graph, &mut errors);
    validate_edges(graph, &mut errors);
    validate_annotations(graph, &mut errors);

    errors
}

fn validate_node_names(graph: &WorkflowGraph, errors: &mut Vec<StructuralError>) {
    let mut seen: HashSet<&str> = HashSet::new();
    for node in &graph.nodes {
        if !seen.insert(&node.name) {
            errors.push(StructuralError::DuplicateNodeName {
                name: node.name.clone(),
            });
        }
    }
}

fn validate_edges(graph: &WorkflowGraph, errors: &mut Vec<StructuralError>) {
    let names: HashSet<&str> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
    let mut pairs: HashSet<(String, String)> = HashSet::new();

    for edge in &graph.edges {
        for endpoint in [&edge.origin, &edge.destination] {
            if !names.contains(endpoint.as_str()) {
                errors.push(StructuralError::DanglingEdge {
                    origin: edge.origin.clone(),
                    destination: edge.destination.clone(),
                    missing: endpoint.clone(),
                });
            }
        }
        if edge.origin == edge.destination {
            errors.push(StructuralError::SelfLoop {
                name: edge.origin.clone(),
            });
        }
        // Normalize the pair so A->B and B->A land on the same key
        let pair = if edge.origin <= edge.destination {
            (edge.origin.clone(), edge.destination.clone())
        } else {
            (edge.destination.clone(), edge.origin.clone())
        };
        if !pairs.insert(pair.clone()) {
            errors.push(StructuralError::DuplicateEdgePair {
                a: pair.0,
                b: pair.1,
            });
        }
    }
}

fn validate_annotations(graph: &WorkflowGraph, errors: &mut Vec<StructuralError>) {
    for annotation in &graph.annotations {
        let resolved = if let Some(step) = &annotation.step_name {
            graph.contains_node(step)
        } else if let Some(edge) = &annotation.edge {
            graph
                .edges
                .iter()
                .any(|e| e.origin == edge.origin && e.destination == edge.destination)
        } else {
            false
        };
        if !resolved {
            errors.push(StructuralError::OrphanAnnotation {
                key: annotation.key().unwrap_or_default(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Annotation, EdgeDataType, Position, StepType, WorkflowEdge, WorkflowNode,
    };

    fn node(name: &str, step_type: StepType) -> WorkflowNode {
        WorkflowNode {
            id: String::new(),
            name: name.to_string(),
            step_type,
            class_pretty_name: None,
            configuration: serde_json::Value::Null,
            position: Position::default(),
            created_new: false,
        }
    }

    fn edge(origin: &str, destination: &str) -> WorkflowEdge {
        WorkflowEdge {
            origin: origin.to_string(),
            destination: destination.to_string(),
            data_type: EdgeDataType::ValidData,
            writer: None,
        }
    }

    fn two_node_graph() -> WorkflowGraph {
        let mut graph = WorkflowGraph::default();
        graph.nodes.push(node("source", StepType::Input));
        graph.nodes.push(node("sink", StepType::Output));
        graph
    }

    #[test]
    fn test_accepts_new_connection_and_requires_writer_for_output() {
        let graph = two_node_graph();
        let validation = validate_connection(&graph, "source", "sink").unwrap();
        assert!(validation.writer_required);
    }

    #[test]
    fn test_no_writer_for_transformation_destination() {
        let mut graph = two_node_graph();
        graph.nodes.push(node("cleaner", StepType::Transformation));
        let validation = validate_connection(&graph, "source", "cleaner").unwrap();
        assert!(!validation.writer_required);
    }

    #[test]
    fn test_rejects_duplicate_in_both_directions() {
        let mut graph = two_node_graph();
        graph.edges.push(edge("source", "sink"));

        assert!(matches!(
            validate_connection(&graph, "source", "sink"),
            Err(EditorError::DuplicateConnection { .. })
        ));
        assert!(matches!(
            validate_connection(&graph, "sink", "source"),
            Err(EditorError::DuplicateConnection { .. })
        ));
    }

    #[test]
    fn test_rejects_self_connection() {
        let graph = two_node_graph();
        assert!(matches!(
            validate_connection(&graph, "source", "source"),
            Err(EditorError::SelfConnection { .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_endpoints() {
        let graph = two_node_graph();
        assert!(matches!(
            validate_connection(&graph, "source", "missing"),
            Err(EditorError::NotFound { .. })
        ));
        assert!(matches!(
            validate_connection(&graph, "missing", "sink"),
            Err(EditorError::NotFound { .. })
        ));
    }

    #[test]
    fn test_audit_clean_graph() {
        let mut graph = two_node_graph();
        graph.edges.push(edge("source", "sink"));
        assert!(validate_graph(&graph).is_empty());
    }

    #[test]
    fn test_audit_collects_all_violations() {
        let mut graph = two_node_graph();
        graph.nodes.push(node("source", StepType::Input));
        graph.edges.push(edge("source", "sink"));
        graph.edges.push(edge("sink", "source"));
        graph.edges.push(edge("source", "ghost"));
        graph.edges.push(edge("loop", "loop"));
        graph.annotations.push(Annotation {
            text: "stale".to_string(),
            step_name: Some("ghost".to_string()),
            edge: None,
            position: None,
        });

        let errors = validate_graph(&graph);
        assert!(errors
            .iter()
            .any(|e| matches!(e, StructuralError::DuplicateNodeName { .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, StructuralError::DuplicateEdgePair { .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, StructuralError::DanglingEdge { .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, StructuralError::SelfLoop { .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, StructuralError::OrphanAnnotation { .. })));
    }
}
