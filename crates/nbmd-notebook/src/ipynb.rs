use crate::error::{NotebookError, Result};
use jupyter_protocol::media::MediaType;
use nbformat::v4::{Cell, Notebook, Output};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// The only nbformat major version the parser accepts
pub const SUPPORTED_MAJOR_VERSION: u64 = 4;

/// Parsed Jupyter Notebook content
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ParsedNotebook {
    /// Notebook-level metadata
    pub metadata: NotebookMetadata,
    /// List of cells in the notebook, in document order
    pub cells: Vec<NotebookCell>,
}

impl ParsedNotebook {
    /// Number of code cells
    #[must_use]
    pub fn code_cell_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.cell_type == CellType::Code)
            .count()
    }

    /// Total number of output fragments across all code cells
    #[must_use]
    pub fn output_count(&self) -> usize {
        self.cells.iter().map(|cell| cell.outputs.len()).sum()
    }
}

/// Notebook-level metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NotebookMetadata {
    /// Language from `language_info.name` (e.g., "python", "R")
    pub language_name: Option<String>,
}

/// Individual notebook cell
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NotebookCell {
    pub cell_type: CellType,
    /// Source lines joined into one string
    pub source: String,
    /// Outputs in execution order; always empty for markdown and raw cells
    pub outputs: Vec<CellOutputData>,
}

/// Type of notebook cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CellType {
    /// Executable code cell
    #[default]
    Code,
    /// Markdown documentation cell
    Markdown,
    /// Raw text cell (no formatting)
    Raw,
}

/// Cell output data
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CellOutputData {
    /// Type of output (`stream`, `display_data`, `execute_result`, `error`)
    pub output_type: OutputType,
    /// Plain-text content of the output
    pub text: Option<String>,
    /// Number of non-plain-text representations (images, HTML, ...)
    pub rich_media: usize,
}

/// Type of cell output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OutputType {
    /// Stream output (stdout/stderr)
    #[default]
    Stream,
    /// Rich display data (images, HTML, etc.)
    DisplayData,
    /// Result of code execution
    ExecuteResult,
    /// Error traceback
    Error,
}

/// Parse a Jupyter Notebook from a file path
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist (`MissingFile`)
/// - The file cannot be read (`Io`)
/// - The file is not UTF-8 (`EncodingError`)
/// - The notebook JSON is malformed (`MalformedDocument`)
#[must_use = "this function returns a parsed notebook that should be processed"]
pub fn parse_notebook<P: AsRef<Path>>(path: P) -> Result<ParsedNotebook> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => NotebookError::MissingFile(path.to_path_buf()),
        _ => NotebookError::Io(e),
    })?;
    let content = String::from_utf8(bytes)?;
    log::debug!("Parsing notebook {} ({} bytes)", path.display(), content.len());
    parse_notebook_from_str(&content)
}

/// Parse a Jupyter Notebook from a string
///
/// # Errors
///
/// Returns an error if the notebook JSON is malformed or the nbformat
/// major version is not 4.
#[must_use = "this function returns a parsed notebook that should be processed"]
pub fn parse_notebook_from_str(content: &str) -> Result<ParsedNotebook> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    check_version(&value)?;

    let notebook: Notebook = serde_json::from_value(value)?;

    let metadata = extract_metadata(&notebook);
    let cells = extract_cells(&notebook);
    log::trace!("Extracted {} cells", cells.len());

    Ok(ParsedNotebook { metadata, cells })
}

/// Reject documents that are not nbformat 4.x before typed deserialization
fn check_version(value: &serde_json::Value) -> Result<()> {
    let major = value
        .get("nbformat")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| NotebookError::InvalidFormat("missing 'nbformat' field".to_string()))?;
    let minor = value
        .get("nbformat_minor")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0);

    if major != SUPPORTED_MAJOR_VERSION {
        return Err(NotebookError::UnsupportedVersion { major, minor });
    }
    Ok(())
}

fn extract_metadata(notebook: &Notebook) -> NotebookMetadata {
    NotebookMetadata {
        language_name: notebook
            .metadata
            .language_info
            .as_ref()
            .map(|li| li.name.clone()),
    }
}

fn extract_cells(notebook: &Notebook) -> Vec<NotebookCell> {
    notebook
        .cells
        .iter()
        .map(|cell| match cell {
            Cell::Code { source, outputs, .. } => NotebookCell {
                cell_type: CellType::Code,
                source: source.join(""),
                outputs: extract_outputs(outputs),
            },
            Cell::Markdown { source, .. } => NotebookCell {
                cell_type: CellType::Markdown,
                source: source.join(""),
                outputs: Vec::new(),
            },
            Cell::Raw { source, .. } => NotebookCell {
                cell_type: CellType::Raw,
                source: source.join(""),
                outputs: Vec::new(),
            },
        })
        .collect()
}

/// Split a media bundle into its text/plain payload and a count of the rest
fn split_media(content: &[MediaType]) -> (Option<String>, usize) {
    let mut text = None;
    let mut rich = 0;
    for media_type in content {
        match media_type {
            MediaType::Plain(s) if text.is_none() => text = Some(s.clone()),
            MediaType::Plain(_) => {}
            _ => rich += 1,
        }
    }
    (text, rich)
}

/// Extract outputs from code cell
fn extract_outputs(outputs: &[Output]) -> Vec<CellOutputData> {
    outputs
        .iter()
        .map(|output| match output {
            Output::Stream { text, .. } => CellOutputData {
                output_type: OutputType::Stream,
                text: Some(text.0.clone()),
                rich_media: 0,
            },
            Output::DisplayData(display_data) => {
                let (text, rich_media) = split_media(&display_data.data.content);
                CellOutputData {
                    output_type: OutputType::DisplayData,
                    text,
                    rich_media,
                }
            }
            Output::ExecuteResult(execute_result) => {
                let (text, rich_media) = split_media(&execute_result.data.content);
                CellOutputData {
                    output_type: OutputType::ExecuteResult,
                    text,
                    rich_media,
                }
            }
            // the traceback already ends with the `ename: evalue` line
            Output::Error(error_output) => CellOutputData {
                output_type: OutputType::Error,
                text: Some(error_output.traceback.join("\n")),
                rich_media: 0,
            },
        })
        .collect()
}
