//! Flow Editor - graph editing engine for the visual workflow designer
//!
//! This crate is the in-memory model behind the workflow editor UI: steps,
//! the data connections between them, and free-text annotations, together
//! with the operations that mutate that model under strict consistency
//! rules. It supports:
//!
//! - Step and connection editing with duplicate/self-connection rejection
//! - Cascading deletion and atomic renames
//! - Cross-session copy/paste with collision-free renaming
//! - Compressed snapshot-based undo/redo
//!
//! # Architecture
//!
//! [`WorkflowEditor`] owns the authoritative [`WorkflowGraph`] for one
//! editing session and is the only thing that mutates it. The surrounding
//! UI feeds it [`EditorIntent`] values one at a time and re-renders from
//! the updated graph; everything is synchronous, an operation either
//! applies completely or reports a structured rejection and changes
//! nothing.
//!
//! # Example
//!
//! ```
//! use flow_editor::{NodeCreation, Position, StepType, WorkflowEditor, WorkflowType};
//!
//! let mut editor = WorkflowEditor::new(WorkflowType::Streaming);
//! let source = editor.add_node(NodeCreation {
//!     name: "events".to_string(),
//!     step_type: StepType::Input,
//!     class_pretty_name: Some("Kafka".to_string()),
//!     configuration: serde_json::json!({}),
//!     position: Position::new(0.0, 0.0),
//! }).unwrap();
//! assert_eq!(source.name, "events");
//! ```

pub mod clipboard;
pub mod debug;
pub mod document;
pub mod engine;
pub mod error;
pub mod events;
pub mod history;
pub mod types;
pub mod validation;

// Re-export key types
pub use clipboard::{ClipboardStorage, InMemoryClipboard, CLIPBOARD_KEY};
pub use debug::{DebugResult, StepResult};
pub use document::{hydrate, persist, WorkflowDocument};
pub use engine::{PasteSummary, WorkflowEditor};
pub use error::{EditorError, Result};
pub use events::{EditorIntent, Notification, NotificationKind, Outcome};
pub use history::SnapshotHistory;
pub use types::{
    Annotation, EdgeDataType, EdgeRef, NodeCreation, Position, StepType, ViewportTransform,
    WorkflowEdge, WorkflowGraph, WorkflowNode, WorkflowType,
};
pub use validation::{validate_connection, validate_graph, EdgeValidation, StructuralError};
