//! Error types for Jupyter notebook parsing

use std::path::PathBuf;
use thiserror::Error;

/// Error type for notebook parsing operations
#[derive(Error, Debug)]
pub enum NotebookError {
    /// Notebook path does not exist
    #[error("Notebook file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// I/O error when reading notebook file
    #[error("Failed to read notebook file: {0}")]
    Io(#[from] std::io::Error),

    /// Notebook bytes are not valid UTF-8
    #[error("Notebook is not valid UTF-8: {0}")]
    EncodingError(#[from] std::string::FromUtf8Error),

    /// Notebook JSON is malformed or does not match the nbformat schema
    #[error("Malformed notebook document: {0}")]
    MalformedDocument(#[from] serde_json::Error),

    /// Notebook structure is missing required fields
    #[error("Invalid notebook format: {0}")]
    InvalidFormat(String),

    /// Notebook version not supported
    #[error("Unsupported notebook version: {major}.{minor}")]
    UnsupportedVersion {
        /// Major version number
        major: u64,
        /// Minor version number
        minor: u64,
    },
}

/// Result type alias for notebook operations
pub type Result<T> = std::result::Result<T, NotebookError>;
