//! Output-block relabeling.
//!
//! Exported notebooks render a code cell's captured output as an indented
//! block after the closing fence. The relabeler finds those blocks and turns
//! the blank line that separates them from the fence into a two-line marker:
//! a blank line and an indented `OUTPUT` label.
//!
//! Two spacing windows are recognised, each scanned over the whole sequence:
//!
//! 1. tight: fence, one blank line, indented line (rewrites the blank line)
//! 2. loose: fence, four blank lines, indented line (rewrites the fourth blank)
//!
//! The loose pass runs on the sequence already rewritten by the tight pass.
//! Rewrites happen in place, so the sequence length never changes; a
//! rewritten slot holds the marker with an embedded newline. Use
//! [`flatten_lines`] or [`join_lines`] to get the emitted form.
//!
//! A rewritten slot is no longer blank, so relabeling the same sequence
//! again changes nothing. The flattened form has no such guard: its label
//! line is an ordinary indented line.

use crate::line::LineKind;

/// Lines inspected by the tight window: fence, blank, indented
const TIGHT_WINDOW: usize = 3;
/// Lines inspected by the loose window: fence, four blanks, indented
const LOOSE_WINDOW: usize = 6;

/// Configuration for [`OutputRelabeler`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelabelOptions {
    /// Label text written on the marker line
    pub label: String,
    /// Indentation placed before the label
    pub indent: usize,
}

impl Default for RelabelOptions {
    fn default() -> Self {
        Self {
            label: "OUTPUT".to_string(),
            indent: 4,
        }
    }
}

/// Number of rewrites performed by each window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RelabelReport {
    /// Rewrites from the tight window
    pub tight: usize,
    /// Rewrites from the loose window
    pub loose: usize,
}

impl RelabelReport {
    /// Total number of labels inserted
    #[inline]
    #[must_use]
    pub const fn total(&self) -> usize {
        self.tight + self.loose
    }
}

/// Inserts `OUTPUT` label lines above indented output blocks
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputRelabeler {
    options: RelabelOptions,
    marker: String,
}

impl OutputRelabeler {
    /// Create a relabeler with the given options
    #[must_use]
    pub fn new(options: RelabelOptions) -> Self {
        let marker = format!("\n{}{}", " ".repeat(options.indent), options.label);
        Self { options, marker }
    }

    /// The replacement written into a matched blank slot
    #[inline]
    #[must_use]
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Options this relabeler was built with
    #[inline]
    #[must_use]
    pub const fn options(&self) -> &RelabelOptions {
        &self.options
    }

    /// Relabel `lines` in place.
    ///
    /// Lines must not carry `\n` terminators; a trailing `\r` is kept on
    /// both halves of a rewritten slot. Sequences shorter than a window are
    /// left untouched by that window's pass.
    pub fn relabel(&self, lines: &mut [String]) -> RelabelReport {
        let mut kinds: Vec<LineKind> = lines
            .iter()
            .map(|line| LineKind::classify(line))
            .collect();

        let tight = self.run_pass(lines, &mut kinds, TIGHT_WINDOW);
        let loose = self.run_pass(lines, &mut kinds, LOOSE_WINDOW);

        let report = RelabelReport { tight, loose };
        log::debug!(
            "Relabeled {} output blocks ({} tight, {} loose) over {} lines",
            report.total(),
            report.tight,
            report.loose,
            lines.len()
        );
        report
    }

    /// Relabel a markdown text blob, returning the emitted text.
    ///
    /// A trailing newline on the input is preserved.
    #[must_use]
    pub fn relabel_text(&self, text: &str) -> (String, RelabelReport) {
        let (mut lines, trailing_newline) = split_lines(text);
        let report = self.relabel(&mut lines);
        let mut out = join_lines(&lines);
        if trailing_newline {
            out.push('\n');
        }
        (out, report)
    }

    /// One forward scan with a window of `width` lines: fence, `width - 2`
    /// blanks, indented line. The last blank is rewritten.
    fn run_pass(&self, lines: &mut [String], kinds: &mut [LineKind], width: usize) -> usize {
        if lines.len() < width {
            return 0;
        }

        let mut rewrites = 0;
        for i in 0..=lines.len() - width {
            let window = &kinds[i..i + width];
            let matched = window[0] == LineKind::Fence
                && window[1..width - 1].iter().all(|k| *k == LineKind::Blank)
                && window[width - 1].is_indented();
            if !matched {
                continue;
            }

            let slot = i + width - 2;
            log::trace!("Output block after fence at line {}, label at {}", i + 1, slot + 1);
            lines[slot] = if lines[slot].ends_with('\r') {
                format!("\r{}\r", self.marker)
            } else {
                self.marker.clone()
            };
            kinds[slot] = LineKind::classify(&lines[slot]);
            rewrites += 1;
        }
        rewrites
    }
}

impl Default for OutputRelabeler {
    fn default() -> Self {
        Self::new(RelabelOptions::default())
    }
}

/// Relabel with default options, consuming and returning the sequence
#[must_use]
pub fn relabel_outputs(mut lines: Vec<String>) -> Vec<String> {
    OutputRelabeler::default().relabel(&mut lines);
    lines
}

/// Split text into terminator-free lines, reporting whether it ended with `\n`
#[must_use]
pub fn split_lines(text: &str) -> (Vec<String>, bool) {
    let trailing_newline = text.ends_with('\n');
    let body = text.strip_suffix('\n').unwrap_or(text);
    if body.is_empty() && !trailing_newline {
        return (Vec::new(), false);
    }
    (body.split('\n').map(String::from).collect(), trailing_newline)
}

/// Expand rewritten slots into one element per emitted line
#[must_use]
pub fn flatten_lines(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .flat_map(|line| line.split('\n'))
        .map(String::from)
        .collect()
}

/// Join a (possibly rewritten) sequence into text without a trailing newline
#[must_use]
pub fn join_lines(lines: &[String]) -> String {
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn owned(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_tight_pattern() {
        let lines = relabel_outputs(owned(&["```", "", "    result"]));
        assert_eq!(lines, owned(&["```", "\n    OUTPUT", "    result"]));
        assert_eq!(
            flatten_lines(&lines),
            owned(&["```", "", "    OUTPUT", "    result"])
        );
    }

    #[test]
    fn test_loose_pattern_rewrites_fourth_blank() {
        let lines = relabel_outputs(owned(&["```", "", "", "", "", "    x"]));
        assert_eq!(lines, owned(&["```", "", "", "", "\n    OUTPUT", "    x"]));
    }

    #[test]
    fn test_short_input_skips_passes() {
        assert_eq!(relabel_outputs(owned(&["```", ""])), owned(&["```", ""]));
        assert!(relabel_outputs(Vec::new()).is_empty());

        let five = owned(&["```", "", "", "", "    x"]);
        assert_eq!(relabel_outputs(five.clone()), five);
    }

    #[test]
    fn test_opening_fence_does_not_match() {
        let lines = owned(&["```python", "", "    x = 1"]);
        assert_eq!(relabel_outputs(lines.clone()), lines);
    }

    #[test]
    fn test_two_or_three_blanks_do_not_match() {
        let two = owned(&["```", "", "", "    x"]);
        assert_eq!(relabel_outputs(two.clone()), two);
        let three = owned(&["```", "", "", "", "    x", ""]);
        assert_eq!(relabel_outputs(three.clone()), three);
    }

    #[test]
    fn test_multiple_cells() {
        let mut lines = owned(&[
            "```python",
            "print(df.shape)",
            "```",
            "",
            "    (100836, 4)",
            "",
            "```python",
            "df.head()",
            "```",
            "",
            "",
            "",
            "",
            "       userId  movieId",
            "    0       1        1",
        ]);
        let report = OutputRelabeler::default().relabel(&mut lines);
        assert_eq!(report, RelabelReport { tight: 1, loose: 1 });
        assert_eq!(lines[3], "\n    OUTPUT");
        assert_eq!(lines[12], "\n    OUTPUT");
        assert_eq!(lines.len(), 15);
    }

    #[test]
    fn test_idempotent() {
        let relabeler = OutputRelabeler::default();
        let mut lines = owned(&["```", "", "    a", "```", "", "", "", "", "    b"]);
        let first = relabeler.relabel(&mut lines);
        assert_eq!(first.total(), 2);
        let snapshot = lines.clone();

        assert_eq!(relabeler.relabel(&mut lines).total(), 0);
        assert_eq!(lines, snapshot);
    }

    #[test]
    fn test_output_reading_label_is_labeled() {
        let lines = relabel_outputs(owned(&["```", "", "    OUTPUT"]));
        assert_eq!(lines, owned(&["```", "\n    OUTPUT", "    OUTPUT"]));

        let lines = relabel_outputs(owned(&["```", "", "", "", "", "    OUTPUT"]));
        assert_eq!(lines, owned(&["```", "", "", "", "\n    OUTPUT", "    OUTPUT"]));
    }

    #[test]
    fn test_flattened_output_is_relabeled_again() {
        let relabeler = OutputRelabeler::default();
        let (once, _) = relabeler.relabel_text("```\n\n    a\n");
        let (twice, report) = relabeler.relabel_text(&once);
        assert_eq!(report.tight, 1);
        assert_eq!(twice, "```\n\n    OUTPUT\n    OUTPUT\n    a\n");
    }

    #[test]
    fn test_crlf_slot_keeps_line_endings() {
        let relabeler = OutputRelabeler::default();
        let (text, report) = relabeler.relabel_text("```\r\n\r\n    1\r\n");
        assert_eq!(report.tight, 1);
        assert_eq!(text, "```\r\n\r\n    OUTPUT\r\n    1\r\n");

        let (text, report) = relabeler.relabel_text("```\r\n\r\n\r\n\r\n\r\n    x\r\n");
        assert_eq!(report.loose, 1);
        assert_eq!(text, "```\r\n\r\n\r\n\r\n\r\n    OUTPUT\r\n    x\r\n");
    }

    #[test]
    fn test_custom_label() {
        let relabeler = OutputRelabeler::new(RelabelOptions {
            label: "Out:".to_string(),
            indent: 2,
        });
        let (text, report) = relabeler.relabel_text("```\n\n    42\n");
        assert_eq!(report.tight, 1);
        assert_eq!(text, "```\n\n  Out:\n    42\n");
    }

    #[test]
    fn test_relabel_text_preserves_trailing_newline() {
        let relabeler = OutputRelabeler::default();
        let (text, _) = relabeler.relabel_text("```\n\n    1");
        assert_eq!(text, "```\n\n    OUTPUT\n    1");
        let (text, _) = relabeler.relabel_text("```\n\n    1\n");
        assert_eq!(text, "```\n\n    OUTPUT\n    1\n");
        let (text, report) = relabeler.relabel_text("");
        assert_eq!(text, "");
        assert_eq!(report.total(), 0);
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("a\nb\n"), (owned(&["a", "b"]), true));
        assert_eq!(split_lines("a\n\n"), (owned(&["a", ""]), true));
        assert_eq!(split_lines("\n"), (owned(&[""]), true));
        assert_eq!(split_lines(""), (Vec::new(), false));
    }

    fn line_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("```".to_string()),
            Just(String::new()),
            Just("    out".to_string()),
            Just("    OUTPUT".to_string()),
            Just("     ".to_string()),
            Just("    ".to_string()),
            Just("text".to_string()),
            Just("  two".to_string()),
            Just("```\r".to_string()),
            Just("\r".to_string()),
            Just("    out\r".to_string()),
        ]
    }

    fn kinds(lines: &[String]) -> Vec<LineKind> {
        lines.iter().map(|line| LineKind::classify(line)).collect()
    }

    fn is_marker(slot: &str) -> bool {
        slot == "\n    OUTPUT" || slot == "\r\n    OUTPUT\r"
    }

    proptest! {
        #[test]
        fn prop_length_preserved(lines in prop::collection::vec(line_strategy(), 0..40)) {
            let relabeled = relabel_outputs(lines.clone());
            prop_assert_eq!(relabeled.len(), lines.len());
        }

        #[test]
        fn prop_only_blank_slots_rewritten(lines in prop::collection::vec(line_strategy(), 0..40)) {
            let relabeled = relabel_outputs(lines.clone());
            for (before, after) in lines.iter().zip(&relabeled) {
                if before != after {
                    prop_assert!(before.is_empty() || before == "\r");
                    prop_assert!(is_marker(after));
                }
            }
        }

        #[test]
        fn prop_every_tight_window_rewritten(lines in prop::collection::vec(line_strategy(), 0..40)) {
            let kinds = kinds(&lines);
            let relabeled = relabel_outputs(lines.clone());
            for (i, window) in kinds.windows(3).enumerate() {
                if window[0] == LineKind::Fence
                    && window[1] == LineKind::Blank
                    && window[2].is_indented()
                {
                    prop_assert!(is_marker(&relabeled[i + 1]));
                }
            }
        }

        #[test]
        fn prop_every_loose_window_rewritten(lines in prop::collection::vec(line_strategy(), 0..40)) {
            let kinds = kinds(&lines);
            let relabeled = relabel_outputs(lines.clone());
            for (i, window) in kinds.windows(6).enumerate() {
                if window[0] == LineKind::Fence
                    && window[1..5].iter().all(|k| *k == LineKind::Blank)
                    && window[5].is_indented()
                {
                    prop_assert!(is_marker(&relabeled[i + 4]));
                }
            }
        }

        #[test]
        fn prop_no_fence_unchanged(lines in prop::collection::vec(
            prop_oneof![Just(String::new()), Just("    out".to_string()), Just("text".to_string())],
            0..40,
        )) {
            prop_assert_eq!(relabel_outputs(lines.clone()), lines);
        }

        #[test]
        fn prop_idempotent(lines in prop::collection::vec(line_strategy(), 0..40)) {
            let once = relabel_outputs(lines);
            prop_assert_eq!(relabel_outputs(once.clone()), once);
        }
    }
}
