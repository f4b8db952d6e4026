//! Notebook to markdown export.
//!
//! Rendering follows the layout of nbconvert's markdown template, which the
//! relabeler's spacing windows are written against:
//!
//! - markdown and raw cells are emitted verbatim
//! - code cells become fenced blocks tagged with the notebook language
//! - stream and error output follows the fence after one blank line
//! - execute results and display data follow after four blank lines
//! - output text is indented by four spaces; empty output lines stay empty

use crate::line::{FENCE, OUTPUT_INDENT};
use nbmd_notebook::{CellOutputData, CellType, NotebookCell, OutputType, ParsedNotebook};
use once_cell::sync::Lazy;
use regex::Regex;

/// Blank lines between a fence and stream/error output
const STREAM_GAP: usize = 1;
/// Blank lines between a fence and rich (execute result, display data) output
const RICH_GAP: usize = 4;
/// Fallback fence language when neither options nor metadata name one
const DEFAULT_LANGUAGE: &str = "python";
/// Emitted for display data that has no plain-text representation
const RICH_PLACEHOLDER: &str = "<display data>";

static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("valid ANSI escape regex")
});

/// Configuration for [`MarkdownExporter`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ExportOptions {
    /// Fence language override; falls back to the notebook's language
    pub language: Option<String>,
}

/// Renders a [`ParsedNotebook`] as markdown text
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MarkdownExporter {
    options: ExportOptions,
}

impl MarkdownExporter {
    /// Create an exporter with the given options
    #[inline]
    #[must_use]
    pub const fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    /// Render the notebook. The result ends with exactly one newline,
    /// or is empty for a notebook without cells.
    #[must_use]
    pub fn export(&self, notebook: &ParsedNotebook) -> String {
        let language = self
            .options
            .language
            .as_deref()
            .or(notebook.metadata.language_name.as_deref())
            .unwrap_or(DEFAULT_LANGUAGE);

        let blocks: Vec<String> = notebook
            .cells
            .iter()
            .map(|cell| Self::format_cell(cell, language))
            .collect();
        log::debug!(
            "Exported {} cells ({} code, {} outputs) as {language}",
            blocks.len(),
            notebook.code_cell_count(),
            notebook.output_count()
        );

        // every block ends with a newline, so joining leaves one blank line between cells
        blocks.join("\n")
    }

    /// Format a single cell; the result ends with one newline
    fn format_cell(cell: &NotebookCell, language: &str) -> String {
        match cell.cell_type {
            CellType::Markdown | CellType::Raw => {
                let mut md = cell.source.trim_end_matches('\n').to_string();
                md.push('\n');
                md
            }
            CellType::Code => {
                let mut md = format!("```{language}\n");
                let source = cell.source.trim_end_matches('\n');
                if !source.is_empty() {
                    md.push_str(source);
                    md.push('\n');
                }
                md.push_str(FENCE);
                md.push('\n');

                for output in &cell.outputs {
                    if let Some(block) = Self::format_output(output) {
                        md.push_str(&block);
                    }
                }
                md
            }
        }
    }

    /// Format one output fragment: leading blank lines, then the indented block
    fn format_output(output: &CellOutputData) -> Option<String> {
        let (gap, text) = match output.output_type {
            OutputType::Stream => (STREAM_GAP, output.text.clone()?),
            OutputType::Error => (STREAM_GAP, strip_ansi(output.text.as_deref()?)),
            OutputType::ExecuteResult | OutputType::DisplayData => {
                let text = match &output.text {
                    Some(text) => text.clone(),
                    None if output.rich_media > 0 => RICH_PLACEHOLDER.to_string(),
                    None => return None,
                };
                (RICH_GAP, text)
            }
        };

        let text = text.trim_end_matches('\n');
        if text.is_empty() {
            return None;
        }

        let mut block = "\n".repeat(gap);
        block.push_str(&indent(text));
        Some(block)
    }
}

/// Export with default options
#[must_use]
pub fn export_notebook(notebook: &ParsedNotebook) -> String {
    MarkdownExporter::default().export(notebook)
}

/// Indent each non-empty line by four spaces; every line is newline-terminated
fn indent(text: &str) -> String {
    let pad = " ".repeat(OUTPUT_INDENT);
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for line in text.split('\n') {
        if !line.is_empty() {
            out.push_str(&pad);
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

/// Remove terminal colour and cursor escape sequences (tracebacks carry them)
#[must_use]
pub fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbmd_notebook::NotebookMetadata;

    fn code_cell(source: &str, outputs: Vec<CellOutputData>) -> NotebookCell {
        NotebookCell {
            cell_type: CellType::Code,
            source: source.to_string(),
            outputs,
        }
    }

    fn markdown_cell(source: &str) -> NotebookCell {
        NotebookCell {
            cell_type: CellType::Markdown,
            source: source.to_string(),
            ..Default::default()
        }
    }

    fn output(output_type: OutputType, text: Option<&str>, rich_media: usize) -> CellOutputData {
        CellOutputData {
            output_type,
            text: text.map(String::from),
            rich_media,
        }
    }

    fn notebook(cells: Vec<NotebookCell>) -> ParsedNotebook {
        ParsedNotebook {
            metadata: NotebookMetadata::default(),
            cells,
        }
    }

    #[test]
    fn test_markdown_and_code_cells() {
        let nb = notebook(vec![
            markdown_cell("# Ratings\n\nExplicit feedback."),
            code_cell("import numpy as np\n", vec![]),
        ]);
        assert_eq!(
            export_notebook(&nb),
            "# Ratings\n\nExplicit feedback.\n\n```python\nimport numpy as np\n```\n"
        );
    }

    #[test]
    fn test_stream_output_uses_tight_spacing() {
        let nb = notebook(vec![code_cell(
            "print(best)",
            vec![output(OutputType::Stream, Some("Item 3\n"), 0)],
        )]);
        assert_eq!(export_notebook(&nb), "```python\nprint(best)\n```\n\n    Item 3\n");
    }

    #[test]
    fn test_execute_result_uses_loose_spacing() {
        let nb = notebook(vec![code_cell(
            "ratings.mean(axis=0)",
            vec![output(OutputType::ExecuteResult, Some("array([3. , 2.25])"), 0)],
        )]);
        assert_eq!(
            export_notebook(&nb),
            "```python\nratings.mean(axis=0)\n```\n\n\n\n\n    array([3. , 2.25])\n"
        );
    }

    #[test]
    fn test_blank_output_lines_stay_empty() {
        let nb = notebook(vec![code_cell(
            "print('a\\n\\nb')",
            vec![output(OutputType::Stream, Some("a\n\nb\n"), 0)],
        )]);
        assert!(export_notebook(&nb).ends_with("\n    a\n\n    b\n"));
    }

    #[test]
    fn test_rich_display_placeholder_and_empty_outputs() {
        let nb = notebook(vec![code_cell(
            "plt.plot(x)",
            vec![
                output(OutputType::DisplayData, None, 1),
                output(OutputType::DisplayData, None, 0),
                output(OutputType::Stream, Some(""), 0),
            ],
        )]);
        assert_eq!(
            export_notebook(&nb),
            "```python\nplt.plot(x)\n```\n\n\n\n\n    <display data>\n"
        );
    }

    #[test]
    fn test_error_output_strips_ansi() {
        let nb = notebook(vec![code_cell(
            "1 / 0",
            vec![output(
                OutputType::Error,
                Some("\x1b[0;31mZeroDivisionError\x1b[0m\nZeroDivisionError: division by zero"),
                0,
            )],
        )]);
        assert_eq!(
            export_notebook(&nb),
            "```python\n1 / 0\n```\n\n    ZeroDivisionError\n    ZeroDivisionError: division by zero\n"
        );
    }

    #[test]
    fn test_language_resolution() {
        let mut nb = notebook(vec![code_cell("", vec![])]);
        assert_eq!(export_notebook(&nb), "```python\n```\n");

        nb.metadata.language_name = Some("R".to_string());
        assert_eq!(export_notebook(&nb), "```R\n```\n");

        let exporter = MarkdownExporter::new(ExportOptions {
            language: Some("julia".to_string()),
        });
        assert_eq!(exporter.export(&nb), "```julia\n```\n");
    }

    #[test]
    fn test_empty_notebook() {
        assert_eq!(export_notebook(&notebook(vec![])), "");
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[1;32mok\x1b[0m done"), "ok done");
        assert_eq!(strip_ansi("plain"), "plain");
    }
}
