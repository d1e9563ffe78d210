use std::path::PathBuf;

use thiserror::Error;

/// Error types for macro recording and playback
#[derive(Debug, Error)]
pub enum ReenactError {
    /// Error when establishing the global input hook
    #[error("Failed to establish input hook: {0}")]
    Hook(String),

    /// Error when synthesizing an input event
    #[error("Failed to inject input event: {0}")]
    Injection(String),

    /// Invalid recorder state transition
    #[error("Recorder error: {0}")]
    Recorder(String),

    /// The macro file does not exist
    #[error("Macro file not found: {0}")]
    FileNotFound(PathBuf),

    /// The macro file exists but could not be parsed; `contents` carries
    /// the raw text so the caller can show it for diagnosis
    #[error("Failed to parse macro file: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
        contents: String,
    },

    /// Error when serializing or deserializing JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for reenact operations
pub type Result<T> = std::result::Result<T, ReenactError>;
