//! User intent and notification types
//!
//! The surrounding UI translates gestures into [`EditorIntent`] values and
//! hands them to the engine one at a time; each dispatch yields an
//! [`Outcome`] telling the UI whether the model changed and whether a
//! message should be surfaced.

use crate::types::{NodeCreation, Position};

/// A discrete editing intent originating from the UI
#[derive(Debug, Clone)]
pub enum EditorIntent {
    CreateNode(NodeCreation),
    RemoveNode { name: String },
    RemoveEdge { origin: String, destination: String },
    CreateEdge { origin: String, destination: String },
    RenameNode { old_name: String, new_name: String },
    DuplicateNode { name: String },
    MoveNode { name: String, position: Position },
    AnnotateStep { name: String, text: String },
    AnnotateEdge { origin: String, destination: String, text: String },
    CopySelection { selection: Vec<String> },
    Paste,
    Undo,
    Redo,
}

/// Severity of a notification surfaced to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
}

/// A message for the UI to display
#[derive(Debug, Clone)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Warning,
            message: message.into(),
        }
    }
}

/// Result of dispatching one intent
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    /// Whether the model changed; rejected intents never change it
    pub changed: bool,
    pub notification: Option<Notification>,
}

impl Outcome {
    pub fn changed() -> Self {
        Self {
            changed: true,
            notification: None,
        }
    }

    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn with_notification(mut self, notification: Notification) -> Self {
        self.notification = Some(notification);
        self
    }
}
