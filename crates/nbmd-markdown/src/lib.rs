//! # nbmd-markdown
//!
//! Markdown export for parsed notebooks and the two line-oriented
//! post-processors that run over exported markdown:
//!
//! - [`OutputRelabeler`] inserts an `OUTPUT` label line above each indented
//!   output block that follows a closing code fence
//! - [`HeaderStripper`] rewrites percent-format cell delimiters and `# `
//!   comment lines
//!
//! ## Example
//!
//! ```
//! use nbmd_markdown::relabel_outputs;
//!
//! let lines = vec!["```".to_string(), String::new(), "    42".to_string()];
//! let relabeled = relabel_outputs(lines);
//! assert_eq!(relabeled[1], "\n    OUTPUT");
//! ```

/// Error types for the conversion pipeline
pub mod error;
/// Notebook to markdown rendering
pub mod export;
/// Percent-format header stripping
pub mod headers;
/// Line classification
pub mod line;
/// File-level conversion
pub mod pipeline;
/// Output-block relabeling
pub mod relabel;

pub use error::{MarkdownError, Result};
pub use export::{export_notebook, strip_ansi, ExportOptions, MarkdownExporter};
pub use headers::{strip_headers, HeaderStripper, StripOptions};
pub use line::LineKind;
pub use pipeline::{
    convert_notebook, convert_notebook_file, read_markdown_file, Conversion, ConvertOptions,
};
pub use relabel::{
    flatten_lines, join_lines, relabel_outputs, split_lines, OutputRelabeler, RelabelOptions,
    RelabelReport,
};
