//! Percent-format header stripping.
//!
//! Markdown produced from percent-format scripts keeps the cell delimiter
//! comments and `# `-prefixed comment lines. Each line is classified once and
//! handled by the first matching rule:
//!
//! | line                | result                          |
//! |---------------------|---------------------------------|
//! | `# %% [markdown]`   | removed (empty string)          |
//! | `# %%...`           | empty fenced code block         |
//! | `# text`            | `text`, newline-terminated      |
//! | anything else       | unchanged                       |

use crate::line::LineKind;

/// Configuration for [`HeaderStripper`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StripOptions {
    /// Info string of the empty fenced block that replaces a code delimiter
    pub code_language: String,
}

impl Default for StripOptions {
    fn default() -> Self {
        Self {
            code_language: "python".to_string(),
        }
    }
}

/// Rewrites percent-format header lines
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeaderStripper {
    options: StripOptions,
    empty_block: String,
}

impl Default for HeaderStripper {
    fn default() -> Self {
        Self::new(StripOptions::default())
    }
}

impl HeaderStripper {
    /// Create a stripper with the given options
    #[must_use]
    pub fn new(options: StripOptions) -> Self {
        let empty_block = format!("```{}\n```\n", options.code_language);
        Self {
            options,
            empty_block,
        }
    }

    /// Options this stripper was built with
    #[inline]
    #[must_use]
    pub const fn options(&self) -> &StripOptions {
        &self.options
    }

    /// Rewrite a single line. `line` keeps its terminator, if any.
    #[must_use]
    pub fn strip_line(&self, line: &str) -> String {
        // The label only matters to the relabeler; headers never collide with it.
        match LineKind::classify(line) {
            LineKind::HeaderMarkdownDelim => String::new(),
            LineKind::HeaderCodeDelim => self.empty_block.clone(),
            LineKind::HeaderText => {
                let body = line.strip_suffix('\n').unwrap_or(line);
                let mut out = body.strip_prefix("# ").unwrap_or(body).to_string();
                out.push('\n');
                out
            }
            _ => line.to_string(),
        }
    }

    /// Rewrite every line, in document order
    #[must_use]
    pub fn strip(&self, lines: &[String]) -> Vec<String> {
        let stripped: Vec<String> = lines.iter().map(|line| self.strip_line(line)).collect();
        log::debug!(
            "Header stripping rewrote {} of {} lines",
            lines.iter().zip(&stripped).filter(|(a, b)| a != b).count(),
            lines.len()
        );
        stripped
    }

    /// Rewrite a whole text blob, splitting after each `\n`
    #[must_use]
    pub fn strip_text(&self, text: &str) -> String {
        text.split_inclusive('\n')
            .map(|line| self.strip_line(line))
            .collect()
    }
}

/// Strip headers with default options
#[must_use]
pub fn strip_headers(lines: &[String]) -> Vec<String> {
    HeaderStripper::default().strip(lines)
}
