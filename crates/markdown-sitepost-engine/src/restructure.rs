//! Title/body split of a converted page.

use crate::tree::Element;

/// Tag of the heading that becomes the page title.
pub const TITLE_TAG: &str = "h1";

/// Split the direct children of `root` into a title and an article body.
///
/// The first top-level `h1` gets `itemprop="name"`. Every sibling after it
/// moves, in order, into a new `div itemprop="articleBody"` appended as the
/// last child of `root`. Children before the title stay where they are.
/// Without a title the body wrapper is appended empty.
///
/// Returns the title's text, if a title was found.
pub fn split_title_body(root: &mut Element) -> Option<String> {
    let mut body = Element::new("div").with_attr("itemprop", "articleBody");

    // Work from an owned snapshot of the children; `root` is rebuilt from it.
    let children = std::mem::take(&mut root.children);
    let mut title = None;

    for mut child in children {
        if title.is_none() && child.tag == TITLE_TAG {
            child.set_attr("itemprop", "name");
            title = Some(child.text_content());
            root.children.push(child);
        } else if title.is_some() {
            body.children.push(child);
        } else {
            root.children.push(child);
        }
    }

    root.children.push(body);
    title
}
