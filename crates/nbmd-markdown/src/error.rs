//! Error types for markdown export and post-processing

use nbmd_notebook::NotebookError;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for conversion pipeline operations
#[derive(Error, Debug)]
pub enum MarkdownError {
    /// Notebook could not be loaded
    #[error(transparent)]
    Notebook(#[from] NotebookError),

    /// Markdown input path does not exist
    #[error("Markdown file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// Markdown input is not valid UTF-8
    #[error("Markdown file is not valid UTF-8: {0}")]
    EncodingError(#[from] std::string::FromUtf8Error),

    /// I/O error when reading or writing markdown
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for markdown operations
pub type Result<T> = std::result::Result<T, MarkdownError>;
