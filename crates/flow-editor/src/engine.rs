//! The mutation engine behind the visual workflow editor
//!
//! [`WorkflowEditor`] owns the authoritative graph and the undo/redo
//! history for one editing session. Every operation is synchronous and
//! total: bad input is reported as a structured error and the graph is
//! left exactly as it was. Every operation that does change the graph
//! records the pre-operation state, so one engine call is one undoable
//! step.

use std::collections::HashSet;

use crate::clipboard::{
    self, ClipboardStorage, PastePayload, CLIPBOARD_KEY, PASTE_OFFSET,
};
use crate::error::{EditorError, Result};
use crate::events::{EditorIntent, Notification, Outcome};
use crate::history::SnapshotHistory;
use crate::types::{
    default_writer, next_free_name, Annotation, EdgeDataType, EdgeRef, NodeCreation, Position,
    ViewportTransform, WorkflowEdge, WorkflowGraph, WorkflowNode, WorkflowType,
};
use crate::validation::validate_connection;

/// Counts reported after a paste
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PasteSummary {
    pub pasted_nodes: usize,
    pub pasted_edges: usize,
    /// Edges from the snapshot that would have collided with a connection
    /// already present between two steps, silently dropped
    pub dropped_edges: usize,
}

/// Editing session over one workflow graph
pub struct WorkflowEditor {
    graph: WorkflowGraph,
    history: SnapshotHistory,
    workflow_type: WorkflowType,
    /// Whether the graph is unchanged since load or last save
    pristine: bool,
}

impl WorkflowEditor {
    /// Start an editing session over an empty graph
    pub fn new(workflow_type: WorkflowType) -> Self {
        Self::from_graph(WorkflowGraph::default(), workflow_type)
    }

    /// Start an editing session over a hydrated graph
    ///
    /// History always starts empty: undo never crosses a load boundary.
    pub fn from_graph(graph: WorkflowGraph, workflow_type: WorkflowType) -> Self {
        Self {
            graph,
            history: SnapshotHistory::default(),
            workflow_type,
            pristine: true,
        }
    }

    /// The current model, for rendering and persistence
    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    pub fn workflow_type(&self) -> WorkflowType {
        self.workflow_type
    }

    /// Whether the graph changed since load or last save
    pub fn is_pristine(&self) -> bool {
        self.pristine
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Forget history and mark the current state as persisted
    pub fn mark_saved(&mut self) {
        self.history.clear();
        self.pristine = true;
    }

    /// Record the pre-operation state; called before every mutation applies
    fn checkpoint(&mut self) -> Result<()> {
        self.history.record(&self.graph)?;
        self.pristine = false;
        Ok(())
    }

    /// Insert a step, deriving a free name when the requested one is taken
    ///
    /// Returns the inserted step, whose `name` may differ from the request.
    pub fn add_node(&mut self, creation: NodeCreation) -> Result<WorkflowNode> {
        let name = next_free_name(&creation.name, &self.graph.node_names());
        let node = WorkflowNode {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            step_type: creation.step_type,
            class_pretty_name: creation.class_pretty_name,
            configuration: creation.configuration,
            position: creation.position,
            created_new: true,
        };
        self.checkpoint()?;
        log::debug!("Inserted step '{}'", node.name);
        self.graph.nodes.push(node.clone());
        Ok(node)
    }

    /// Remove a step, cascading to its incident edges and annotations
    pub fn remove_node(&mut self, name: &str) -> Result<()> {
        let index = self
            .graph
            .nodes
            .iter()
            .position(|n| n.name == name)
            .ok_or_else(|| EditorError::NotFound {
                name: name.to_string(),
            })?;
        self.checkpoint()?;
        self.graph.nodes.remove(index);

        let removed_edges: Vec<EdgeRef> = self
            .graph
            .edges
            .iter()
            .filter(|e| e.touches(name))
            .map(|e| EdgeRef {
                origin: e.origin.clone(),
                destination: e.destination.clone(),
            })
            .collect();
        self.graph.edges.retain(|e| !e.touches(name));
        self.graph.annotations.retain(|a| {
            if a.attached_to_step(name) {
                return false;
            }
            !removed_edges
                .iter()
                .any(|e| a.attached_to_edge(&e.origin, &e.destination))
        });
        log::debug!(
            "Removed step '{}' and {} incident connection(s)",
            name,
            removed_edges.len()
        );
        Ok(())
    }

    /// Rename a step and rewrite every reference to it
    ///
    /// Atomic: all checks happen before anything is touched, so a
    /// half-renamed graph is never observable.
    pub fn rename_node(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        if old_name == new_name {
            return Ok(());
        }
        if !self.graph.contains_node(old_name) {
            return Err(EditorError::NotFound {
                name: old_name.to_string(),
            });
        }
        if self.graph.contains_node(new_name) {
            return Err(EditorError::NameCollision {
                name: new_name.to_string(),
            });
        }
        self.checkpoint()?;

        if let Some(node) = self.graph.find_node_mut(old_name) {
            node.name = new_name.to_string();
        }
        for edge in &mut self.graph.edges {
            if edge.origin == old_name {
                edge.origin = new_name.to_string();
            }
            if edge.destination == old_name {
                edge.destination = new_name.to_string();
            }
        }
        for annotation in &mut self.graph.annotations {
            if annotation.step_name.as_deref() == Some(old_name) {
                annotation.step_name = Some(new_name.to_string());
            }
            if let Some(edge) = &mut annotation.edge {
                if edge.origin == old_name {
                    edge.origin = new_name.to_string();
                }
                if edge.destination == old_name {
                    edge.destination = new_name.to_string();
                }
            }
        }
        log::debug!("Renamed step '{}' to '{}'", old_name, new_name);
        Ok(())
    }

    /// Connect two steps
    ///
    /// Edges into an Output step are created with a generated writer
    /// config; the data type starts as `ValidData`.
    pub fn add_edge(&mut self, origin: &str, destination: &str) -> Result<()> {
        let validation = validate_connection(&self.graph, origin, destination)?;
        self.checkpoint()?;
        self.graph.edges.push(WorkflowEdge {
            origin: origin.to_string(),
            destination: destination.to_string(),
            data_type: EdgeDataType::ValidData,
            writer: validation.writer_required.then(default_writer),
        });
        log::debug!("Connected '{}' -> '{}'", origin, destination);
        Ok(())
    }

    /// Remove a single connection and its annotation, nothing else
    pub fn remove_edge(&mut self, origin: &str, destination: &str) -> Result<()> {
        let index = self
            .graph
            .edges
            .iter()
            .position(|e| e.origin == origin && e.destination == destination)
            .ok_or_else(|| EditorError::NotFound {
                name: format!("{} -> {}", origin, destination),
            })?;
        self.checkpoint()?;
        self.graph.edges.remove(index);
        self.graph
            .annotations
            .retain(|a| !a.attached_to_edge(origin, destination));
        log::debug!("Disconnected '{}' -> '{}'", origin, destination);
        Ok(())
    }

    /// Clone a step under a derived name; connections are not copied
    pub fn duplicate_node(&mut self, name: &str) -> Result<WorkflowNode> {
        let source = self
            .graph
            .find_node(name)
            .ok_or_else(|| EditorError::NotFound {
                name: name.to_string(),
            })?;
        let node = WorkflowNode {
            id: uuid::Uuid::new_v4().to_string(),
            name: next_free_name(name, &self.graph.node_names()),
            step_type: source.step_type,
            class_pretty_name: source.class_pretty_name.clone(),
            // Value::clone is a deep copy; the duplicate never shares
            // nested configuration with the original
            configuration: source.configuration.clone(),
            position: source.position.offset(PASTE_OFFSET),
            created_new: true,
        };
        self.checkpoint()?;
        log::debug!("Duplicated step '{}' as '{}'", name, node.name);
        self.graph.nodes.push(node.clone());
        Ok(node)
    }

    /// Move a step to a new canvas position
    pub fn move_node(&mut self, name: &str, position: Position) -> Result<()> {
        if !self.graph.contains_node(name) {
            return Err(EditorError::NotFound {
                name: name.to_string(),
            });
        }
        self.checkpoint()?;
        if let Some(node) = self.graph.find_node_mut(name) {
            node.position = position;
        }
        Ok(())
    }

    /// Switch a connection between the valid-data and discard channels
    pub fn set_edge_data_type(
        &mut self,
        origin: &str,
        destination: &str,
        data_type: EdgeDataType,
    ) -> Result<()> {
        let current = self
            .graph
            .edges
            .iter()
            .find(|e| e.origin == origin && e.destination == destination)
            .map(|e| e.data_type)
            .ok_or_else(|| EditorError::NotFound {
                name: format!("{} -> {}", origin, destination),
            })?;
        if current == data_type {
            return Ok(());
        }
        self.checkpoint()?;
        if let Some(edge) = self
            .graph
            .edges
            .iter_mut()
            .find(|e| e.origin == origin && e.destination == destination)
        {
            edge.data_type = data_type;
        }
        Ok(())
    }

    /// Attach a note to a step, replacing any existing one
    pub fn annotate_step(&mut self, name: &str, text: impl Into<String>) -> Result<()> {
        if !self.graph.contains_node(name) {
            return Err(EditorError::NotFound {
                name: name.to_string(),
            });
        }
        self.checkpoint()?;
        self.graph.annotations.retain(|a| !a.attached_to_step(name));
        self.graph.annotations.push(Annotation {
            text: text.into(),
            step_name: Some(name.to_string()),
            edge: None,
            position: None,
        });
        Ok(())
    }

    /// Attach a note to a connection, replacing any existing one
    pub fn annotate_edge(
        &mut self,
        origin: &str,
        destination: &str,
        text: impl Into<String>,
    ) -> Result<()> {
        if !self
            .graph
            .edges
            .iter()
            .any(|e| e.origin == origin && e.destination == destination)
        {
            return Err(EditorError::NotFound {
                name: format!("{} -> {}", origin, destination),
            });
        }
        self.checkpoint()?;
        self.graph
            .annotations
            .retain(|a| !a.attached_to_edge(origin, destination));
        self.graph.annotations.push(Annotation {
            text: text.into(),
            step_name: None,
            edge: Some(EdgeRef {
                origin: origin.to_string(),
                destination: destination.to_string(),
            }),
            position: None,
        });
        Ok(())
    }

    /// Remove the note attached to a step
    pub fn remove_step_annotation(&mut self, name: &str) -> Result<()> {
        if self.graph.annotation_for_step(name).is_none() {
            return Err(EditorError::NotFound {
                name: name.to_string(),
            });
        }
        self.checkpoint()?;
        self.graph.annotations.retain(|a| !a.attached_to_step(name));
        Ok(())
    }

    /// Remove the note attached to a connection
    pub fn remove_edge_annotation(&mut self, origin: &str, destination: &str) -> Result<()> {
        if self.graph.annotation_for_edge(origin, destination).is_none() {
            return Err(EditorError::NotFound {
                name: format!("{} -> {}", origin, destination),
            });
        }
        self.checkpoint()?;
        self.graph
            .annotations
            .retain(|a| !a.attached_to_edge(origin, destination));
        Ok(())
    }

    /// Update the viewport pan/zoom state
    ///
    /// Viewport changes are non-mutating reads of the workflow itself and
    /// never push history.
    pub fn set_viewport(&mut self, viewport: ViewportTransform) {
        self.graph.svg_position = viewport;
    }

    /// Step back to the state before the most recent mutation
    ///
    /// Returns whether anything was undone. The live viewport is kept, it
    /// is UI state rather than part of the undoable model.
    pub fn undo(&mut self) -> Result<bool> {
        match self.history.undo(&self.graph)? {
            Some(mut restored) => {
                restored.svg_position = self.graph.svg_position;
                self.graph = restored;
                self.pristine = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Step forward again after an undo
    pub fn redo(&mut self) -> Result<bool> {
        match self.history.redo(&self.graph)? {
            Some(mut restored) => {
                restored.svg_position = self.graph.svg_position;
                self.graph = restored;
                self.pristine = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Store the selected subgraph in the shared clipboard
    ///
    /// A no-op returning `false` when the selection is empty.
    pub fn copy_selection(
        &self,
        storage: &mut dyn ClipboardStorage,
        selection: &[String],
    ) -> Result<bool> {
        if selection.is_empty() {
            return Ok(false);
        }
        let snapshot = clipboard::copy_selection(&self.graph, selection, self.workflow_type);
        let raw = serde_json::to_string(&snapshot)?;
        storage.set(CLIPBOARD_KEY, raw);
        log::debug!("Copied {} step(s) to the clipboard", snapshot.nodes.len());
        Ok(true)
    }

    /// Paste the stored subgraph into the current graph
    ///
    /// The stored blob is re-validated against the live graph: steps are
    /// renamed around collisions and any edge that would duplicate an
    /// existing connection is dropped rather than merged.
    pub fn paste(&mut self, storage: &dyn ClipboardStorage) -> Result<PasteSummary> {
        let raw = storage.get(CLIPBOARD_KEY).ok_or_else(|| {
            EditorError::InvalidClipboardPayload("clipboard is empty".to_string())
        })?;
        let snapshot = clipboard::decode_snapshot(&raw, self.workflow_type)?;
        let payload = clipboard::materialize(snapshot, &self.graph.node_names(), PASTE_OFFSET);
        if payload.nodes.is_empty() {
            return Ok(PasteSummary::default());
        }
        self.checkpoint()?;
        Ok(self.insert_payload(payload))
    }

    /// Bulk-insert pasted steps and connections, enforcing the one-edge-
    /// per-pair invariant against the graph as it grows
    fn insert_payload(&mut self, payload: PastePayload) -> PasteSummary {
        let mut summary = PasteSummary {
            pasted_nodes: payload.nodes.len(),
            ..PasteSummary::default()
        };
        self.graph.nodes.extend(payload.nodes);

        for edge in payload.edges {
            if self.graph.edge_between(&edge.origin, &edge.destination).is_some()
                || edge.origin == edge.destination
            {
                summary.dropped_edges += 1;
                continue;
            }
            self.graph.edges.push(edge);
            summary.pasted_edges += 1;
        }
        if summary.dropped_edges > 0 {
            log::warn!(
                "Paste dropped {} conflicting connection(s)",
                summary.dropped_edges
            );
        }
        summary
    }

    /// Handle one user intent, translating rejections into notifications
    ///
    /// This is the boundary the UI talks to: it never returns an error,
    /// every failure becomes a warning notification and `changed: false`.
    pub fn dispatch(
        &mut self,
        intent: EditorIntent,
        storage: &mut dyn ClipboardStorage,
    ) -> Outcome {
        let result = match intent {
            EditorIntent::CreateNode(creation) => self.add_node(creation).map(|_| Outcome::changed()),
            EditorIntent::RemoveNode { name } => {
                self.remove_node(&name).map(|_| Outcome::changed())
            }
            EditorIntent::RemoveEdge {
                origin,
                destination,
            } => self
                .remove_edge(&origin, &destination)
                .map(|_| Outcome::changed()),
            EditorIntent::CreateEdge {
                origin,
                destination,
            } => self
                .add_edge(&origin, &destination)
                .map(|_| Outcome::changed()),
            EditorIntent::RenameNode { old_name, new_name } => self
                .rename_node(&old_name, &new_name)
                .map(|_| Outcome::changed()),
            EditorIntent::DuplicateNode { name } => {
                self.duplicate_node(&name).map(|_| Outcome::changed())
            }
            EditorIntent::MoveNode { name, position } => {
                self.move_node(&name, position).map(|_| Outcome::changed())
            }
            EditorIntent::AnnotateStep { name, text } => {
                self.annotate_step(&name, text).map(|_| Outcome::changed())
            }
            EditorIntent::AnnotateEdge {
                origin,
                destination,
                text,
            } => self
                .annotate_edge(&origin, &destination, text)
                .map(|_| Outcome::changed()),
            EditorIntent::CopySelection { selection } => {
                self.copy_selection(storage, &selection).map(|copied| {
                    if copied {
                        Outcome::unchanged()
                            .with_notification(Notification::info("Selection copied"))
                    } else {
                        Outcome::unchanged()
                    }
                })
            }
            EditorIntent::Paste => self.paste(storage).map(|summary| {
                let mut outcome = if summary.pasted_nodes > 0 {
                    Outcome::changed()
                } else {
                    Outcome::unchanged()
                };
                if summary.dropped_edges > 0 {
                    outcome = outcome.with_notification(Notification::warning(format!(
                        "{} connection(s) could not be pasted",
                        summary.dropped_edges
                    )));
                }
                outcome
            }),
            EditorIntent::Undo => self.undo().map(|changed| Outcome {
                changed,
                notification: None,
            }),
            EditorIntent::Redo => self.redo().map(|changed| Outcome {
                changed,
                notification: None,
            }),
        };

        result.unwrap_or_else(|err| {
            log::warn!("Rejected intent: {}", err);
            Outcome::unchanged().with_notification(Notification::warning(err.to_string()))
        })
    }

    /// Names of steps present in the graph; convenience for UI selection
    pub fn node_names(&self) -> HashSet<String> {
        self.graph.node_names()
    }
}
