use regex::Regex;
use std::sync::OnceLock;

/// Columns a tab expands to when measuring indentation.
pub const TAB_WIDTH: usize = 4;

/// Whether the line opens a list item (`1. `, `* `, `+ `, `- `).
///
/// Leading indentation is ignored, so nested items count too.
pub fn is_item_start(line: &str) -> bool {
    static ITEM_RE: OnceLock<Regex> = OnceLock::new();
    let item_re =
        ITEM_RE.get_or_init(|| Regex::new(r"^(?:[0-9]+\.|[*+-])\s").expect("Invalid item regex"));

    item_re.is_match(line.trim())
}

/// Whether the line closes any open list block: an empty line or an ATX heading.
pub fn is_item_terminator(line: &str) -> bool {
    static HEADING_RE: OnceLock<Regex> = OnceLock::new();
    let heading_re =
        HEADING_RE.get_or_init(|| Regex::new(r"^#+ ").expect("Invalid heading regex"));

    line.is_empty() || heading_re.is_match(line)
}

/// Width of the leading whitespace, with tabs counted as [`TAB_WIDTH`] columns.
pub fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}
