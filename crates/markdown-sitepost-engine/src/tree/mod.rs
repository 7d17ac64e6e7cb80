//! # Document tree
//!
//! Converter output is handled as a small element tree in the
//! text/tail layout the converter's own tree uses:
//!
//! ```text
//! <a>text1<b>text2</b>text3</a>
//!
//! a.text = "text1", b.text = "text2", b.tail = "text3"
//! ```
//!
//! Text before the first child belongs to the parent; text after a child's
//! end tag is that child's tail.
//!
//! - **`parse`**: markup text to [`Element`], with line-window errors
//! - **`serialize`**: [`Element`] back to text, always escaping `&`

pub mod parse;
pub mod serialize;

pub use parse::{ParseError, parse_document};
pub use serialize::{MissingDocumentTag, serialize, strip_document_tag};

/// A single element of the document tree.
///
/// Each element owns its children; attributes keep insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<Element>,
    pub tail: Option<String>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        debug_assert!(!tag.is_empty(), "element tag must not be empty");
        Self {
            tag,
            attributes: vec![],
            text: None,
            children: vec![],
            tail: None,
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style text setter.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing the value in place if it already exists.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Visit this element and every descendant, parents before children.
    pub fn walk_mut<F: FnMut(&mut Element)>(&mut self, f: &mut F) {
        f(self);
        for child in &mut self.children {
            child.walk_mut(f);
        }
    }

    /// All text inside this element, ignoring markup (tails of descendants included).
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
            if let Some(tail) = &child.tail {
                out.push_str(tail);
            }
        }
    }
}
