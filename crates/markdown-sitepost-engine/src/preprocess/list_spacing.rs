use super::classify::{indent_width, is_item_start, is_item_terminator};

/// Per-document list tracking. Reset for every document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ListState {
    in_item: bool,
    item_indent: usize,
    prev_line_was_item: bool,
}

/// Line-by-line state machine that inserts a blank line before every list
/// block that directly follows non-list content.
///
/// A blank line is also inserted when an item starts shallower than the
/// first item of the open block, since the converter treats that as a new
/// list needing its own separation.
pub struct ListSpacer {
    state: ListState,
    seen_first_line: bool,
    out: Vec<String>,
}

impl ListSpacer {
    pub fn new() -> Self {
        Self {
            state: ListState::default(),
            seen_first_line: false,
            out: vec![],
        }
    }

    pub fn push(&mut self, line: &str) {
        if !self.seen_first_line {
            // The first line never gets a separator and never opens a block.
            self.seen_first_line = true;
            self.out.push(line.to_string());
            return;
        }

        let line_is_item = is_item_start(line);
        if line_is_item {
            let indent = indent_width(line);
            if !(self.state.prev_line_was_item || self.state.in_item) {
                log::trace!("list starts after content, inserting blank line before {line:?}");
                self.out.push(String::new());
            } else if self.state.in_item && indent < self.state.item_indent {
                log::trace!("list restarts shallower ({indent}), inserting blank line");
                self.out.push(String::new());
            }

            if !self.state.in_item {
                self.state.item_indent = indent;
            }
            self.state.in_item = true;
        } else if self.state.in_item && is_item_terminator(line) {
            self.state.in_item = false;
        }

        self.state.prev_line_was_item = line_is_item;
        self.out.push(line.to_string());
    }

    pub fn finish(self) -> Vec<String> {
        self.out
    }
}

impl Default for ListSpacer {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the list spacing pass over one document's lines.
pub fn normalize_list_spacing<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let mut spacer = ListSpacer::new();
    for line in lines {
        spacer.push(line.as_ref());
    }
    spacer.finish()
}

/// Run the pass over a whole document.
///
/// The document's line ending (`\r\n` when present, `\n` otherwise) is kept,
/// as is a trailing newline; only the inserted blank lines are new.
pub fn normalize_text(text: &str) -> String {
    let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };
    let lines: Vec<&str> = text.split(newline).collect();
    normalize_list_spacing(&lines).join(newline)
}
