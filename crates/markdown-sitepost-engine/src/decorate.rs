//! Presentation attributes added to converted pages.

use crate::tree::Element;

/// Give every table below `root` a visible collapsed border.
pub fn add_table_borders(root: &mut Element) {
    root.walk_mut(&mut |el: &mut Element| {
        if el.tag == "table" {
            el.set_attr("border", "1");
            el.set_attr("bordercolor", "#888");
            el.set_attr("style", "border-collapse:collapse");
        }
    });
}
