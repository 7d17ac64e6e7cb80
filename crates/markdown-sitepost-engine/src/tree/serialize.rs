use std::fmt::Write;

use super::Element;

/// Elements written as `<tag />` with no end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "br", "col", "embed", "frame", "hr", "img", "input", "isindex",
    "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text is written without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Serialize an element tree as XHTML-style markup.
///
/// Every `&` in text and attribute values is escaped, including ones that
/// already look like the start of an entity reference. Text in the tree is
/// always decoded, so a literal `&amp;` in a node means the author wrote
/// `&amp;` and must come out as `&amp;amp;`.
pub fn serialize(root: &Element) -> String {
    let mut out = String::new();
    write_element(&mut out, root);
    out
}

fn write_element(out: &mut String, el: &Element) {
    let lower = el.tag.to_ascii_lowercase();
    let is_void = VOID_ELEMENTS.contains(&lower.as_str());

    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attributes {
        let _ = write!(out, " {name}=\"{}\"", escape_attribute(value));
    }

    if is_void {
        out.push_str(" />");
    } else {
        out.push('>');
        if let Some(text) = &el.text {
            if RAW_TEXT_ELEMENTS.contains(&lower.as_str()) {
                out.push_str(text);
            } else {
                out.push_str(&html_escape::encode_text(text));
            }
        }
        for child in &el.children {
            write_element(out, child);
        }
        let _ = write!(out, "</{}>", el.tag);
    }

    if let Some(tail) = &el.tail {
        out.push_str(&html_escape::encode_text(tail));
    }
}

fn escape_attribute(value: &str) -> String {
    html_escape::encode_double_quoted_attribute(value).replace('\n', "&#10;")
}

/// The serialized document lacked its wrapper element's start or end tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to strip top-level <{tag}> tags from document: {output:?}")]
pub struct MissingDocumentTag {
    pub tag: String,
    pub output: String,
}

/// Remove the outermost `<tag>`/`</tag>` pair from serialized output.
///
/// A self-closed `<tag />` is the empty document and yields `""`.
pub fn strip_document_tag(output: &str, tag: &str) -> Result<String, MissingDocumentTag> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");

    match (output.find(&open), output.rfind(&close)) {
        (Some(start), Some(end)) if start + open.len() <= end => {
            Ok(output[start + open.len()..end].trim().to_string())
        }
        _ if output.trim().ends_with(&format!("<{tag} />")) => Ok(String::new()),
        _ => Err(MissingDocumentTag {
            tag: tag.to_string(),
            output: output.trim().to_string(),
        }),
    }
}
