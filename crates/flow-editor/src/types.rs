//! Core types for editable workflow graphs
//!
//! These types define the structure of a workflow as it exists inside the
//! editor: steps, the data connections between them, and free-text
//! annotations. Connections reference steps by *name*, never by pointer,
//! so steps can be renamed by rewriting the two endpoint fields on every
//! incident edge.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Separator used to build the lookup key of an edge annotation
pub const ANNOTATION_EDGE_SEPARATOR: &str = "////";

/// Category of a workflow step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepType {
    /// Data sources
    Input,
    /// Data sinks; edges into an Output step carry a writer config
    Output,
    /// Everything in between
    Transformation,
}

/// Kind of workflow a graph belongs to
///
/// Clipboard snapshots are tagged with this so a subgraph copied from one
/// kind of workflow cannot be pasted into another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowType {
    Streaming,
    Batch,
}

impl Default for WorkflowType {
    fn default() -> Self {
        Self::Streaming
    }
}

/// Classification of the data flowing along an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeDataType {
    /// The regular output channel of the origin step
    ValidData,
    /// The discarded/error channel of the origin step
    Discard,
}

impl Default for EdgeDataType {
    fn default() -> Self {
        Self::ValidData
    }
}

/// A 2-D canvas coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translate by another position, returning the result
    pub fn offset(self, delta: Position) -> Self {
        Self {
            x: self.x + delta.x,
            y: self.y + delta.y,
        }
    }
}

/// Pan/zoom state of the editor viewport
///
/// Carried through the document untouched; the engine never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportTransform {
    pub x: f64,
    pub y: f64,
    /// Zoom factor
    pub k: f64,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            k: 1.0,
        }
    }
}

/// A workflow step in the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowNode {
    /// Internal instance id, stable across renames
    #[serde(default)]
    pub id: String,
    /// Human-facing identifier, unique across the graph; edges and
    /// annotations reference steps by this name
    pub name: String,
    pub step_type: StepType,
    /// Display name of the step implementation (e.g. "Kafka", "MlPipeline")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_pretty_name: Option<String>,
    /// Opaque configuration private to the step type; the editor only
    /// looks at the `pipeline` sub-field used by embedded sub-graphs
    #[serde(default)]
    pub configuration: serde_json::Value,
    #[serde(default)]
    pub position: Position,
    /// Set for steps inserted in the current editing session, cleared for
    /// steps loaded from storage; gates "new step" UI affordances only
    #[serde(skip)]
    pub created_new: bool,
}

impl WorkflowNode {
    /// The embedded sub-graph of this step, when it carries one
    pub fn pipeline_configuration(&self) -> Option<&serde_json::Value> {
        self.configuration.get("pipeline")
    }
}

/// A directed data connection between two steps
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEdge {
    /// Name of the origin step
    pub origin: String,
    /// Name of the destination step
    pub destination: String,
    #[serde(default)]
    pub data_type: EdgeDataType,
    /// Writer configuration, present when the destination is an Output step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer: Option<serde_json::Value>,
}

impl WorkflowEdge {
    /// Whether this edge starts or ends at the named step
    pub fn touches(&self, name: &str) -> bool {
        self.origin == name || self.destination == name
    }

    /// Whether this edge connects the two names, in either direction
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.origin == a && self.destination == b) || (self.origin == b && self.destination == a)
    }
}

/// Reference to an edge by its endpoint names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRef {
    pub origin: String,
    pub destination: String,
}

/// A free-text note attached to exactly one step or exactly one edge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub text: String,
    /// Name of the step this note is attached to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_name: Option<String>,
    /// Edge this note is attached to; mutually exclusive with `step_name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge: Option<EdgeRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl Annotation {
    /// Lookup key: the step name, or `origin////destination` for edges
    pub fn key(&self) -> Option<String> {
        if let Some(name) = &self.step_name {
            Some(name.clone())
        } else {
            self.edge
                .as_ref()
                .map(|e| edge_annotation_key(&e.origin, &e.destination))
        }
    }

    pub fn attached_to_step(&self, name: &str) -> bool {
        self.step_name.as_deref() == Some(name)
    }

    pub fn attached_to_edge(&self, origin: &str, destination: &str) -> bool {
        self.edge
            .as_ref()
            .map(|e| e.origin == origin && e.destination == destination)
            .unwrap_or(false)
    }
}

/// Build the lookup key for an edge annotation
pub fn edge_annotation_key(origin: &str, destination: &str) -> String {
    format!("{}{}{}", origin, ANNOTATION_EDGE_SEPARATOR, destination)
}

/// Default writer configuration attached to edges into an Output step
pub fn default_writer() -> serde_json::Value {
    serde_json::json!({
        "saveMode": "Append",
        "tableName": "",
        "partitionBy": "",
        "primaryKey": "",
        "errorTableName": ""
    })
}

/// Template data for inserting a step into the graph
///
/// Built by the UI from a palette template or an existing step being
/// cloned; the engine derives a free name from `name` when it is taken.
#[derive(Debug, Clone)]
pub struct NodeCreation {
    pub name: String,
    pub step_type: StepType,
    pub class_pretty_name: Option<String>,
    pub configuration: serde_json::Value,
    pub position: Position,
}

/// The complete editable state of one workflow
///
/// Query methods here are pure derived views over the flat node/edge lists;
/// nothing is cached, so lookups can never go stale after a rename.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowGraph {
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub svg_position: ViewportTransform,
}

impl WorkflowGraph {
    /// Find a step by name
    pub fn find_node(&self, name: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Find a step by name (mutable)
    pub fn find_node_mut(&mut self, name: &str) -> Option<&mut WorkflowNode> {
        self.nodes.iter_mut().find(|n| n.name == name)
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.find_node(name).is_some()
    }

    /// Name → step index, rebuilt on every call
    pub fn node_map(&self) -> HashMap<&str, &WorkflowNode> {
        self.nodes.iter().map(|n| (n.name.as_str(), n)).collect()
    }

    /// The set of step names currently in use
    pub fn node_names(&self) -> HashSet<String> {
        self.nodes.iter().map(|n| n.name.clone()).collect()
    }

    /// Edges starting or ending at the named step
    pub fn incident_edges<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a WorkflowEdge> {
        self.edges.iter().filter(move |e| e.touches(name))
    }

    /// The edge between two names, regardless of direction
    pub fn edge_between(&self, a: &str, b: &str) -> Option<&WorkflowEdge> {
        self.edges.iter().find(|e| e.connects(a, b))
    }

    pub fn annotation_for_step(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.attached_to_step(name))
    }

    pub fn annotation_for_edge(&self, origin: &str, destination: &str) -> Option<&Annotation> {
        self.annotations
            .iter()
            .find(|a| a.attached_to_edge(origin, destination))
    }
}

/// Derive a free step name from a desired base name
///
/// Returns the base name when unused, otherwise the first unused
/// `base-1`, `base-2`, … candidate. The search is bounded by the number of
/// taken names plus one, so it always terminates.
pub fn next_free_name(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    for suffix in 1..=taken.len() + 1 {
        let candidate = format!("{}-{}", base, suffix);
        if !taken.contains(&candidate) {
            return candidate;
        }
    }
    // Unreachable: taken.len() + 1 candidates cannot all collide with
    // taken.len() names
    format!("{}-{}", base, taken.len() + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, step_type: StepType) -> WorkflowNode {
        WorkflowNode {
            id: format!("id-{}", name),
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

    #[test]
    fn test_edge_between_is_order_independent() {
        let mut graph = WorkflowGraph::default();
        graph.nodes.push(node("a", StepType::Input));
        graph.nodes.push(node("b", StepType::Output));
        graph.edges.push(edge("a", "b"));

        assert!(graph.edge_between("a", "b").is_some());
        assert!(graph.edge_between("b", "a").is_some());
        assert!(graph.edge_between("a", "c").is_none());
    }

    #[test]
    fn test_incident_edges_covers_both_directions() {
        let mut graph = WorkflowGraph::default();
        graph.edges.push(edge("a", "b"));
        graph.edges.push(edge("c", "a"));
        graph.edges.push(edge("c", "b"));

        assert_eq!(graph.incident_edges("a").count(), 2);
        assert_eq!(graph.incident_edges("b").count(), 2);
        assert_eq!(graph.incident_edges("d").count(), 0);
    }

    #[test]
    fn test_node_map_reflects_current_names() {
        let mut graph = WorkflowGraph::default();
        graph.nodes.push(node("a", StepType::Input));
        assert!(graph.node_map().contains_key("a"));

        graph.nodes[0].name = "renamed".to_string();
        let map = graph.node_map();
        assert!(!map.contains_key("a"));
        assert!(map.contains_key("renamed"));
    }

    #[test]
    fn test_next_free_name() {
        let mut taken = HashSet::new();
        assert_eq!(next_free_name("Kafka", &taken), "Kafka");

        taken.insert("Kafka".to_string());
        assert_eq!(next_free_name("Kafka", &taken), "Kafka-1");

        taken.insert("Kafka-1".to_string());
        taken.insert("Kafka-2".to_string());
        assert_eq!(next_free_name("Kafka", &taken), "Kafka-3");
    }

    #[test]
    fn test_annotation_keys() {
        let step_note = Annotation {
            text: "check this".to_string(),
            step_name: Some("Kafka".to_string()),
            edge: None,
            position: None,
        };
        assert_eq!(step_note.key().as_deref(), Some("Kafka"));

        let edge_note = Annotation {
            text: "lossy".to_string(),
            step_name: None,
            edge: Some(EdgeRef {
                origin: "a".to_string(),
                destination: "b".to_string(),
            }),
            position: None,
        };
        assert_eq!(edge_note.key().as_deref(), Some("a////b"));
    }

    #[test]
    fn test_node_serde_skips_transient_flag() {
        let mut n = node("a", StepType::Input);
        n.created_new = true;

        let json = serde_json::to_string(&n).unwrap();
        assert!(!json.contains("createdNew"));

        let restored: WorkflowNode = serde_json::from_str(&json).unwrap();
        assert!(!restored.created_new);
    }
}
