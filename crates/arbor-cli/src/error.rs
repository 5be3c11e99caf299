//! Error types for the Arbor CLI.
//!
//! One hierarchical `thiserror` enum; variants carry enough context to be
//! actionable, with hints where the fix is not obvious from the message.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid command-line arguments or options
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A required file or directory is missing
    #[error("Not found: {}\n\nHint: {hint}", path.display())]
    NotFound { path: PathBuf, hint: String },

    /// Neither the requested port nor any nearby port could be bound
    #[error("Ports {from}-{to} are all in use\n\nHint: Pass --port to pick a different range")]
    PortUnavailable { from: u16, to: u16 },

    /// Development server errors
    #[error("Server error: {0}")]
    Server(String),

    /// Template file could not be parsed
    #[error("Template error: {0}\n\nHint: The template must be valid Jinja-style HTML")]
    Template(#[from] minijinja::Error),

    /// File watching errors
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = CliError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_messages_carry_the_hint() {
        let err = CliError::NotFound {
            path: PathBuf::from("./pages"),
            hint: "Create the directory or pass --pages".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("./pages"));
        assert!(text.contains("pass --pages"));
    }

    #[test]
    fn port_unavailable_names_the_range() {
        let err = CliError::PortUnavailable {
            from: 3000,
            to: 3010,
        };
        assert!(err.to_string().contains("3000-3010"));
    }
}
