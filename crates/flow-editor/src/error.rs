//! Error types for the editing engine

use thiserror::Error;

/// Result type alias using EditorError
pub type Result<T> = std::result::Result<T, EditorError>;

/// Errors that can occur while editing a workflow graph
///
/// All of these are local, recoverable conditions: the operation is
/// rejected and the model is left untouched.
#[derive(Debug, Error)]
pub enum EditorError {
    /// A connection already exists between the two steps, in either direction
    #[error("a connection between '{origin}' and '{destination}' already exists")]
    DuplicateConnection { origin: String, destination: String },

    /// A step cannot be connected to itself
    #[error("cannot connect step '{name}' to itself")]
    SelfConnection { name: String },

    /// The requested step name is already in use
    #[error("a step named '{name}' already exists")]
    NameCollision { name: String },

    /// The operation referenced a step or connection that does not exist
    #[error("no step or connection named '{name}'")]
    NotFound { name: String },

    /// The clipboard content could not be used as a paste source
    #[error("clipboard payload rejected: {0}")]
    InvalidClipboardPayload(String),

    /// A workflow document failed the structural audit on load
    #[error("invalid workflow document: {0}")]
    InvalidDocument(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression error
    #[error("compression error: {0}")]
    Compression(String),
}
