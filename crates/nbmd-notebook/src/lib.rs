//! # nbmd-notebook
//!
//! Jupyter Notebook (.ipynb) parsing library for nbmd.
//!
//! Parses nbformat 4.x documents into a flat, owned model:
//! - Markdown and raw cells (verbatim source)
//! - Code cells and their outputs (stream, display data, execute results,
//!   error tracebacks)
//! - The notebook language from `language_info`
//!
//! ## Example
//!
//! ```no_run
//! use nbmd_notebook::parse_notebook;
//!
//! let notebook = parse_notebook("example.ipynb")?;
//! for cell in &notebook.cells {
//!     println!("{:?}: {} outputs", cell.cell_type, cell.outputs.len());
//! }
//! # Ok::<(), nbmd_notebook::NotebookError>(())
//! ```

/// Error types for notebook parsing
pub mod error;
/// Jupyter notebook (ipynb) parser
pub mod ipynb;

pub use error::{NotebookError, Result};
pub use ipynb::{
    parse_notebook, parse_notebook_from_str, CellOutputData, CellType, NotebookCell,
    NotebookMetadata, OutputType, ParsedNotebook, SUPPORTED_MAJOR_VERSION,
};
