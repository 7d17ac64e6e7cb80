//! # Raw markup sanitizing
//!
//! The converter stashes markup it does not parse and leaves a placeholder
//! token in its output. Before the stash is put back, each fragment is
//! checked: a lone tag from the allow-list or a lone character reference
//! passes through, anything else is escaped so it renders as text.

use regex::Regex;
use std::sync::OnceLock;

/// Element names a raw tag fragment may use and still pass unescaped.
pub const HTML_TAGS: &[&str] = &[
    "a", "abbr", "address", "area", "article", "aside", "audio", "b", "base", "bdi", "bdo",
    "blockquote", "body", "br", "button", "canvas", "caption", "cite", "code", "col",
    "colgroup", "command", "datalist", "dd", "del", "details", "dfn", "div", "dl", "dt", "em",
    "embed", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5",
    "h6", "head", "header", "hgroup", "hr", "html", "i", "iframe", "img", "input", "ins", "kbd",
    "keygen", "label", "legend", "li", "link", "map", "mark", "menu", "meta", "meter", "nav",
    "noscript", "object", "ol", "optgroup", "option", "output", "p", "param", "pre", "progress",
    "q", "rp", "rt", "ruby", "s", "samp", "script", "section", "select", "small", "source",
    "span", "strong", "style", "sub", "summary", "sup", "table", "tbody", "td", "textarea",
    "tfoot", "th", "thead", "time", "title", "tr", "track", "u", "ul", "var", "video", "wbr",
];

fn tag_re() -> &'static Regex {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    TAG_RE.get_or_init(|| Regex::new(r"^</?([a-zA-Z0-9]+)[^<>]*>$").expect("Invalid tag regex"))
}

fn entity_re() -> &'static Regex {
    static ENTITY_RE: OnceLock<Regex> = OnceLock::new();
    ENTITY_RE.get_or_init(|| {
        Regex::new(r"^&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);$")
            .expect("Invalid entity regex")
    })
}

/// Whether `name` is on the allow-list, compared case-insensitively.
pub fn is_known_tag(name: &str) -> bool {
    HTML_TAGS.contains(&name.to_ascii_lowercase().as_str())
}

/// Whether a raw fragment can be emitted as-is.
pub fn is_safe_fragment(fragment: &str) -> bool {
    if let Some(caps) = tag_re().captures(fragment) {
        return is_known_tag(&caps[1]);
    }
    entity_re().is_match(fragment)
}

/// Escape `&`, `<`, `>` and `"`, in that order.
pub fn basic_escape(fragment: &str) -> String {
    fragment
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// The fragment unchanged when safe, escaped otherwise.
pub fn sanitize_fragment(fragment: &str) -> String {
    if is_safe_fragment(fragment) {
        fragment.to_string()
    } else {
        log::debug!("escaping raw fragment {fragment:?}");
        basic_escape(fragment)
    }
}

/// Raw fragments of one document, addressed by dense placeholder ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawStash {
    fragments: Vec<String>,
}

impl RawStash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a fragment and return the placeholder token that stands for it.
    pub fn store(&mut self, fragment: impl Into<String>) -> String {
        let id = self.fragments.len();
        self.fragments.push(fragment.into());
        Self::placeholder(id)
    }

    /// The token the converter leaves in its output for fragment `id`.
    pub fn placeholder(id: usize) -> String {
        format!("\u{2}wzxhzdk:{id}\u{3}")
    }

    pub fn get(&self, id: usize) -> Option<&str> {
        self.fragments.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Replace every placeholder in `text` with its sanitized fragment, in id order.
    pub fn reinsert(&self, text: &str) -> String {
        self.fragments
            .iter()
            .enumerate()
            .fold(text.to_string(), |text, (id, fragment)| {
                text.replace(&Self::placeholder(id), &sanitize_fragment(fragment))
            })
    }
}

impl<S: Into<String>> FromIterator<S> for RawStash {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            fragments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("<span>")]
    #[case("</span>")]
    #[case("<br />")]
    #[case(r#"<a href="x.md">"#)]
    #[case("<DIV>")]
    #[case("<h1 id=\"t\">")]
    #[case("&nbsp;")]
    #[case("&#123;")]
    #[case("&#x1F600;")]
    fn safe_fragments_pass_through(#[case] fragment: &str) {
        assert_eq!(sanitize_fragment(fragment), fragment);
    }

    #[rstest]
    #[case("<blink>", "&lt;blink&gt;")]
    #[case("<span><b>", "&lt;span&gt;&lt;b&gt;")]
    #[case("<!-- note -->", "&lt;!-- note --&gt;")]
    #[case("a & b", "a &amp; b")]
    #[case("&amp; more", "&amp;amp; more")]
    #[case("&not an entity;", "&amp;not an entity;")]
    #[case(r#"<x a="1">"#, "&lt;x a=&quot;1&quot;&gt;")]
    #[case("<span>text</span>", "&lt;span&gt;text&lt;/span&gt;")]
    fn unsafe_fragments_are_escaped(#[case] fragment: &str, #[case] expected: &str) {
        assert_eq!(sanitize_fragment(fragment), expected);
    }

    #[test]
    fn ampersand_is_escaped_first() {
        assert_eq!(basic_escape("<&>"), "&lt;&amp;&gt;");
    }

    #[test]
    fn stash_ids_are_dense() {
        let mut stash = RawStash::new();
        let first = stash.store("<span>");
        let second = stash.store("<bad>");

        assert_eq!(first, RawStash::placeholder(0));
        assert_eq!(second, RawStash::placeholder(1));
        assert_eq!(stash.len(), 2);
        assert_eq!(stash.get(1), Some("<bad>"));
    }

    #[test]
    fn reinsert_sanitizes_each_fragment() {
        let stash: RawStash = ["<span>", "</span>", "<marquee>"].into_iter().collect();
        let text = format!(
            "<p>{}x{} {}</p>",
            RawStash::placeholder(0),
            RawStash::placeholder(1),
            RawStash::placeholder(2)
        );

        assert_eq!(stash.reinsert(&text), "<p><span>x</span> &lt;marquee&gt;</p>");
    }

    #[test]
    fn placeholder_ids_do_not_collide() {
        let stash: RawStash = (0..12).map(|i| format!("&#{i};")).collect();
        let text = format!("{}|{}", RawStash::placeholder(1), RawStash::placeholder(11));

        assert_eq!(stash.reinsert(&text), "&#1;|&#11;");
    }

    #[test]
    fn no_bare_ampersand_survives() {
        for fragment in ["a&b", "& ", "&;", "<p>&</p>", "&&amp;"] {
            let out = sanitize_fragment(fragment);
            let bare = out.match_indices('&').any(|(i, _)| {
                let rest = &out[i..];
                !(rest.starts_with("&amp;")
                    || rest.starts_with("&lt;")
                    || rest.starts_with("&gt;")
                    || rest.starts_with("&quot;"))
            });
            assert!(!bare, "bare ampersand in {out:?}");
        }
    }
}
