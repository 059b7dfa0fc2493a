//! Copy/paste codec for workflow subgraphs
//!
//! Copy serializes the selected steps, the connections fully inside the
//! selection, and their writer configs into a tagged snapshot stored under
//! a single application-wide key. Paste re-materializes the snapshot
//! against the *current* graph, renaming colliding steps and dropping any
//! connection the stored blob cannot justify.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};
use crate::types::{next_free_name, Position, WorkflowEdge, WorkflowGraph, WorkflowNode, WorkflowType};

/// Well-known storage key shared across the application instance
pub const CLIPBOARD_KEY: &str = "sp-copy-clipboard";

/// Tag identifying a snapshot as an editor subgraph
const OBJECT_ID_TYPE: &str = "workflow";

/// Visual delta applied to pasted steps so they do not land atop the originals
pub const PASTE_OFFSET: Position = Position { x: 45.0, y: 45.0 };

/// External string-keyed storage the clipboard lives in
///
/// The storage is shared, process-external, last-write-wins state; paste
/// never trusts it and re-validates everything against the live graph.
pub trait ClipboardStorage {
    fn set(&mut self, key: &str, value: String);
    fn get(&self, key: &str) -> Option<String>;
}

/// In-memory clipboard storage
///
/// Useful for tests and for embedding the editor without a host storage.
#[derive(Default)]
pub struct InMemoryClipboard {
    entries: HashMap<String, String>,
}

impl InMemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardStorage for InMemoryClipboard {
    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// Serialized subgraph produced by copy, consumed by paste
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardSnapshot {
    /// Always `"workflow"`; anything else is rejected on paste
    pub object_id_type: String,
    /// Kind of workflow the subgraph came from
    pub workflow_type: WorkflowType,
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
    /// Writer configs of the copied edges, keyed by destination step name
    #[serde(default)]
    pub writers: HashMap<String, serde_json::Value>,
}

/// Steps and connections ready for bulk insertion into the live graph
#[derive(Debug, Clone, Default)]
pub struct PastePayload {
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
}

/// Build a snapshot of the selected subgraph
///
/// Only edges with *both* endpoints selected survive; a connection into or
/// out of an unselected step has a missing endpoint and is meaningless on
/// its own.
pub fn copy_selection(
    graph: &WorkflowGraph,
    selected: &[String],
    workflow_type: WorkflowType,
) -> ClipboardSnapshot {
    let selected: HashSet<&str> = selected.iter().map(String::as_str).collect();
    let nodes: Vec<WorkflowNode> = graph
        .nodes
        .iter()
        .filter(|n| selected.contains(n.name.as_str()))
        .cloned()
        .collect();
    let edges: Vec<WorkflowEdge> = graph
        .edges
        .iter()
        .filter(|e| selected.contains(e.origin.as_str()) && selected.contains(e.destination.as_str()))
        .cloned()
        .collect();
    let writers = edges
        .iter()
        .filter_map(|e| e.writer.clone().map(|w| (e.destination.clone(), w)))
        .collect();

    ClipboardSnapshot {
        object_id_type: OBJECT_ID_TYPE.to_string(),
        workflow_type,
        nodes,
        edges,
        writers,
    }
}

/// Parse a stored clipboard blob and check its tags
///
/// Rejects unparseable content, content that is not an editor subgraph, and
/// subgraphs copied from a different kind of workflow.
pub fn decode_snapshot(raw: &str, expected_type: WorkflowType) -> Result<ClipboardSnapshot> {
    let snapshot: ClipboardSnapshot = serde_json::from_str(raw)
        .map_err(|e| EditorError::InvalidClipboardPayload(e.to_string()))?;
    if snapshot.object_id_type != OBJECT_ID_TYPE {
        return Err(EditorError::InvalidClipboardPayload(format!(
            "unexpected content type '{}'",
            snapshot.object_id_type
        )));
    }
    if snapshot.workflow_type != expected_type {
        return Err(EditorError::InvalidClipboardPayload(
            "snapshot was copied from a different workflow kind".to_string(),
        ));
    }
    Ok(snapshot)
}

/// Re-materialize a snapshot against the names already in the target graph
///
/// Every copied step gets a fresh collision-free name and an offset
/// position; copied edges are rewritten through the rename map. An edge
/// whose endpoint was not part of the copied step set is dropped rather
/// than failing the whole paste, since the stored blob is not trusted.
pub fn materialize(
    snapshot: ClipboardSnapshot,
    existing_names: &HashSet<String>,
    offset: Position,
) -> PastePayload {
    let mut taken = existing_names.clone();
    let mut renames: HashMap<String, String> = HashMap::new();

    let nodes: Vec<WorkflowNode> = snapshot
        .nodes
        .into_iter()
        .map(|mut node| {
            let new_name = next_free_name(&node.name, &taken);
            taken.insert(new_name.clone());
            renames.insert(node.name.clone(), new_name.clone());
            node.name = new_name;
            node.id = uuid::Uuid::new_v4().to_string();
            node.created_new = true;
            node.position = node.position.offset(offset);
            node
        })
        .collect();

    let edges: Vec<WorkflowEdge> = snapshot
        .edges
        .into_iter()
        .filter_map(|mut edge| {
            let writer = snapshot.writers.get(&edge.destination).cloned();
            let origin = renames.get(&edge.origin)?.clone();
            let destination = renames.get(&edge.destination)?.clone();
            edge.origin = origin;
            edge.destination = destination;
            if edge.writer.is_none() {
                edge.writer = writer;
            }
            Some(edge)
        })
        .collect();

    PastePayload { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EdgeDataType, StepType};

    fn node(name: &str, step_type: StepType) -> WorkflowNode {
        WorkflowNode {
            id: format!("id-{}", name),
            name: name.to_string(),
            step_type,
            class_pretty_name: None,
            configuration: serde_json::json!({"key": "value"}),
            position: Position::new(10.0, 20.0),
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

    fn sample_graph() -> WorkflowGraph {
        let mut graph = WorkflowGraph::default();
        graph.nodes.push(node("A", StepType::Input));
        graph.nodes.push(node("B", StepType::Transformation));
        graph.nodes.push(node("C", StepType::Output));
        graph.edges.push(edge("A", "B"));
        graph.edges.push(edge("A", "C"));
        graph
    }

    #[test]
    fn test_copy_excludes_edges_with_unselected_endpoints() {
        let graph = sample_graph();
        let snapshot = copy_selection(
            &graph,
            &["A".to_string(), "B".to_string()],
            WorkflowType::Streaming,
        );

        assert_eq!(snapshot.nodes.len(), 2);
        assert_eq!(snapshot.edges.len(), 1);
        assert_eq!(snapshot.edges[0].origin, "A");
        assert_eq!(snapshot.edges[0].destination, "B");
    }

    #[test]
    fn test_copy_collects_writers_of_selected_edges() {
        let mut graph = sample_graph();
        graph.edges[1].writer = Some(serde_json::json!({"saveMode": "Append"}));

        let all = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let snapshot = copy_selection(&graph, &all, WorkflowType::Streaming);
        assert_eq!(snapshot.writers.len(), 1);
        assert!(snapshot.writers.contains_key("C"));
    }

    #[test]
    fn test_decode_rejects_malformed_payload() {
        assert!(matches!(
            decode_snapshot("not json at all", WorkflowType::Streaming),
            Err(EditorError::InvalidClipboardPayload(_))
        ));
    }

    #[test]
    fn test_decode_rejects_workflow_type_mismatch() {
        let snapshot = copy_selection(&sample_graph(), &["A".to_string()], WorkflowType::Batch);
        let raw = serde_json::to_string(&snapshot).unwrap();
        assert!(matches!(
            decode_snapshot(&raw, WorkflowType::Streaming),
            Err(EditorError::InvalidClipboardPayload(_))
        ));
        assert!(decode_snapshot(&raw, WorkflowType::Batch).is_ok());
    }

    #[test]
    fn test_materialize_renames_collisions_and_rewrites_edges() {
        let graph = sample_graph();
        let snapshot = copy_selection(
            &graph,
            &["A".to_string(), "B".to_string()],
            WorkflowType::Streaming,
        );

        // Target graph already has A and B
        let existing = graph.node_names();
        let payload = materialize(snapshot, &existing, PASTE_OFFSET);

        let names: Vec<&str> = payload.nodes.iter().map(|n| n.name.as_str()).collect();
        assert!(names.contains(&"A-1"));
        assert!(names.contains(&"B-1"));
        assert_eq!(payload.edges.len(), 1);
        assert_eq!(payload.edges[0].origin, "A-1");
        assert_eq!(payload.edges[0].destination, "B-1");
    }

    #[test]
    fn test_materialize_offsets_positions_and_marks_new() {
        let graph = sample_graph();
        let snapshot = copy_selection(&graph, &["A".to_string()], WorkflowType::Streaming);
        let payload = materialize(snapshot, &HashSet::new(), PASTE_OFFSET);

        let pasted = &payload.nodes[0];
        assert_eq!(pasted.position, Position::new(55.0, 65.0));
        assert!(pasted.created_new);
        assert_ne!(pasted.id, "id-A");
    }

    #[test]
    fn test_materialize_drops_edges_outside_copied_set() {
        let graph = sample_graph();
        let mut snapshot = copy_selection(
            &graph,
            &["A".to_string(), "B".to_string()],
            WorkflowType::Streaming,
        );
        // Tampered blob: an edge whose endpoint was never copied
        snapshot.edges.push(edge("A", "C"));

        let payload = materialize(snapshot, &HashSet::new(), PASTE_OFFSET);
        assert_eq!(payload.edges.len(), 1);
        assert_eq!(payload.edges[0].destination, "B");
    }

    #[test]
    fn test_in_memory_clipboard_roundtrip() {
        let mut storage = InMemoryClipboard::new();
        assert!(storage.get(CLIPBOARD_KEY).is_none());
        storage.set(CLIPBOARD_KEY, "payload".to_string());
        assert_eq!(storage.get(CLIPBOARD_KEY).as_deref(), Some("payload"));
    }
}
