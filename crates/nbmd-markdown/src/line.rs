//! Per-line classification shared by the relabeler and the header stripper.

/// Closing fence of a literal code block
pub const FENCE: &str = "```";

/// Minimum indentation of an output-block line
pub const OUTPUT_INDENT: usize = 4;

const HEADER_PREFIX: &str = "# ";
const CELL_DELIMITER: &str = "# %%";
const MARKDOWN_DELIMITER: &str = "# %% [markdown]";

/// Classification of a single markdown line.
///
/// Line terminators (`\n`, `\r\n`) are ignored when classifying, so the same
/// classifier serves terminator-free sequences and `readlines`-style input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    /// A bare closing fence (```` ``` ````)
    Fence,
    /// Empty line
    Blank,
    /// At least four leading spaces followed by any character; holds the
    /// number of leading spaces
    Indented(usize),
    /// `# %% [markdown]`
    HeaderMarkdownDelim,
    /// `# %%` in any form other than the markdown delimiter
    HeaderCodeDelim,
    /// Any other line starting with `# `
    HeaderText,
    /// Everything else
    Other,
}

impl LineKind {
    /// Classify `line`
    #[must_use]
    pub fn classify(line: &str) -> Self {
        let body = strip_terminator(line);

        if body.starts_with(HEADER_PREFIX) {
            return if body.starts_with(MARKDOWN_DELIMITER) {
                Self::HeaderMarkdownDelim
            } else if body.starts_with(CELL_DELIMITER) {
                Self::HeaderCodeDelim
            } else {
                Self::HeaderText
            };
        }

        if body == FENCE {
            return Self::Fence;
        }
        if body.is_empty() {
            return Self::Blank;
        }

        let spaces = body.bytes().take_while(|&b| b == b' ').count();
        if spaces >= OUTPUT_INDENT && body.len() > OUTPUT_INDENT {
            return Self::Indented(spaces);
        }

        Self::Other
    }

    /// True for lines that open an output block
    #[inline]
    #[must_use]
    pub const fn is_indented(self) -> bool {
        matches!(self, Self::Indented(_))
    }
}

/// Drop a trailing `\n` or `\r\n`
#[inline]
pub(crate) fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
