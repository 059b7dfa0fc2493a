//! Undo/redo history using compressed snapshots
//!
//! Each entry is a full graph snapshot, serialized to JSON and compressed
//! with zstd. Snapshots are preferred over inverse deltas because every
//! mutation is covered without per-operation inverse code, and the graphs
//! involved are small enough that compression keeps the stacks cheap.

use crate::error::{EditorError, Result};
use crate::types::WorkflowGraph;

const COMPRESSION_LEVEL: i32 = 3;

/// Two-stack undo/redo history scoped to one editing session
///
/// The undo stack holds pre-operation states, oldest first; the redo stack
/// holds states undone since the last recorded mutation. Recording a new
/// entry clears the redo stack.
pub struct SnapshotHistory {
    undo_stack: Vec<Vec<u8>>,
    redo_stack: Vec<Vec<u8>>,
    /// Maximum number of undo entries kept; the oldest is dropped beyond it
    max_depth: usize,
}

impl SnapshotHistory {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record the pre-operation state of a mutation that is about to apply
    ///
    /// Clears the redo stack. On a compression failure both stacks are left
    /// unchanged.
    pub fn record(&mut self, graph: &WorkflowGraph) -> Result<()> {
        let snapshot = encode(graph)?;
        self.undo_stack.push(snapshot);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        Ok(())
    }

    /// Step back one entry
    ///
    /// `current` is pushed onto the redo stack and the popped state is
    /// returned. Returns `None` when there is nothing to undo.
    pub fn undo(&mut self, current: &WorkflowGraph) -> Result<Option<WorkflowGraph>> {
        let Some(snapshot) = self.undo_stack.last() else {
            return Ok(None);
        };
        let restored = decode(snapshot)?;
        let current_snapshot = encode(current)?;
        self.undo_stack.pop();
        self.redo_stack.push(current_snapshot);
        Ok(Some(restored))
    }

    /// Step forward one entry; inverse of [`undo`](Self::undo)
    pub fn redo(&mut self, current: &WorkflowGraph) -> Result<Option<WorkflowGraph>> {
        let Some(snapshot) = self.redo_stack.last() else {
            return Ok(None);
        };
        let restored = decode(snapshot)?;
        let current_snapshot = encode(current)?;
        self.redo_stack.pop();
        self.undo_stack.push(current_snapshot);
        Ok(Some(restored))
    }

    /// Whether an undo step is available; recomputed, never cached
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether a redo step is available; recomputed, never cached
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Drop all history, e.g. when a workflow is freshly loaded or saved
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Total compressed size of both stacks, in bytes
    pub fn compressed_size(&self) -> usize {
        self.undo_stack
            .iter()
            .chain(self.redo_stack.iter())
            .map(|s| s.len())
            .sum()
    }
}

impl Default for SnapshotHistory {
    fn default() -> Self {
        Self::new(100)
    }
}

fn encode(graph: &WorkflowGraph) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(graph)?;
    zstd::encode_all(&json[..], COMPRESSION_LEVEL)
        .map_err(|e| EditorError::Compression(e.to_string()))
}

fn decode(snapshot: &[u8]) -> Result<WorkflowGraph> {
    let json =
        zstd::decode_all(snapshot).map_err(|e| EditorError::Compression(e.to_string()))?;
    let graph: WorkflowGraph = serde_json::from_slice(&json)?;
    Ok(graph)
}
