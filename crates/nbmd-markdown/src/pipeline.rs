//! File-level conversion: load, export, relabel.

use crate::error::{MarkdownError, Result};
use crate::export::{ExportOptions, MarkdownExporter};
use crate::relabel::{OutputRelabeler, RelabelOptions, RelabelReport};
use nbmd_notebook::{parse_notebook, ParsedNotebook};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Options for a full notebook conversion
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConvertOptions {
    /// Exporter settings
    pub export: ExportOptions,
    /// Relabeler settings; `None` skips relabeling
    pub relabel: Option<RelabelOptions>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            export: ExportOptions::default(),
            relabel: Some(RelabelOptions::default()),
        }
    }
}

/// Result of converting one notebook
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Conversion {
    /// Final markdown text
    pub markdown: String,
    /// Number of cells exported
    pub cells: usize,
    /// Relabel counts, when relabeling ran
    pub relabel: Option<RelabelReport>,
}

/// Convert an already parsed notebook
#[must_use]
pub fn convert_notebook(notebook: &ParsedNotebook, options: &ConvertOptions) -> Conversion {
    let exported = MarkdownExporter::new(options.export.clone()).export(notebook);

    let (markdown, relabel) = match &options.relabel {
        Some(relabel_options) => {
            let (text, report) = OutputRelabeler::new(relabel_options.clone()).relabel_text(&exported);
            (text, Some(report))
        }
        None => (exported, None),
    };

    Conversion {
        markdown,
        cells: notebook.cells.len(),
        relabel,
    }
}

/// Load a notebook from disk and convert it
///
/// # Errors
///
/// Returns [`MarkdownError::Notebook`] when the notebook is missing,
/// not UTF-8, or malformed.
pub fn convert_notebook_file<P: AsRef<Path>>(path: P, options: &ConvertOptions) -> Result<Conversion> {
    let path = path.as_ref();
    let notebook = parse_notebook(path)?;
    let conversion = convert_notebook(&notebook, options);
    log::info!(
        "Converted {} ({} cells, {} output labels)",
        path.display(),
        conversion.cells,
        conversion.relabel.map_or(0, |r| r.total())
    );
    Ok(conversion)
}

/// Read a markdown file as UTF-8 text
///
/// # Errors
///
/// Returns `MissingFile` if the path does not exist, `EncodingError` for
/// non-UTF-8 content, and `Io` for other read failures.
pub fn read_markdown_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => MarkdownError::MissingFile(path.to_path_buf()),
        _ => MarkdownError::Io(e),
    })?;
    Ok(String::from_utf8(bytes)?)
}
