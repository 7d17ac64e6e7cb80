//! # Pre-conversion passes
//!
//! The upstream markdown converter only recognises a list when a blank line
//! precedes it. These passes rewrite the raw source lines so that rule is
//! always satisfied.
//!
//! - **`classify`**: pure line predicates (list item start, list terminator, indent width)
//! - **`list_spacing`**: `ListSpacer` state machine inserting the missing blank lines

pub mod classify;
pub mod list_spacing;

pub use classify::{indent_width, is_item_start, is_item_terminator};
pub use list_spacing::{ListSpacer, normalize_list_spacing, normalize_text};
