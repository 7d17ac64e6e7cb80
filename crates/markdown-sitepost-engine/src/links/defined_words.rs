//! Defined-word linking.
//!
//! Terms listed in the site's dictionary are found in page text and wrapped
//! in `<a class="cpprefjp-defined-word">` links that carry the term's target
//! and description. Text inside links, code, keyboard input, definitions and
//! the page title is left alone.
//!
//! Dictionary entries may redirect to another entry; a missing `link` or
//! `desc` is taken from the first entry along the redirect chain that has
//! one. Dictionary links must be site-absolute or carry a scheme.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use markdown_sitepost_config::Config;
use regex::{Captures, Regex};
use serde::Deserialize;

use crate::tree::Element;

use super::url::has_scheme;

/// Class attribute of every generated link.
pub const DEFINED_WORD_CLASS: &str = "cpprefjp-defined-word";

/// Largest dictionary accepted.
pub const MAX_DEFINED_WORDS: usize = 500;

/// Elements whose content is never scanned for words.
const EXCLUDED_TAGS: &[&str] = &["a", "code", "pre", "kbd", "dfn", "h1"];

/// Joins the redirect target's name to a borrowed description.
const DESC_SEPARATOR: &str = "。";

#[derive(Debug, thiserror::Error)]
pub enum DefinedWordsError {
    #[error("Failed to read defined words at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse defined words at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Too many defined words: count = {0} must not be greater than {max}", max = MAX_DEFINED_WORDS)]
    TooMany(usize),

    #[error("defined_words: redirection loop for '{0}'")]
    RedirectLoop(String),

    #[error("defined_words: '{word}' redirects to unknown word '{target}'")]
    UnknownRedirect { word: String, target: String },

    #[error("defined_words: link='{link}': relative link is unallowed")]
    RelativeLink { word: String, link: String },

    #[error("defined_words: invalid word pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// One dictionary entry as written in the JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WordEntry {
    pub link: Option<String>,
    pub desc: Option<String>,
    pub redirect: Option<String>,
}

/// A dictionary word with its redirects followed and its link made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinedWord {
    pub word: String,
    pub href: Option<String>,
    pub desc: Option<String>,
    starts_word: bool,
    ends_word: bool,
}

impl DefinedWord {
    fn anchor(&self) -> Element {
        let mut a = Element::new("a").with_attr("class", DEFINED_WORD_CLASS);
        if let Some(href) = &self.href {
            a.set_attr("href", href.as_str());
        }
        if let Some(desc) = &self.desc {
            a.set_attr("data-desc", desc.as_str());
        }
        a.with_text(self.word.as_str())
    }
}

/// The resolved dictionary, ready to link words in document trees.
#[derive(Debug, Clone)]
pub struct DefinedWords {
    /// Reverse-sorted, so a word is always tried before its own prefixes.
    words: Vec<DefinedWord>,
    candidates: Option<Regex>,
}

impl DefinedWords {
    /// Resolve `entries` against the site's `base_url` and page `extension`.
    pub fn new(
        entries: BTreeMap<String, WordEntry>,
        base_url: &str,
        extension: &str,
    ) -> Result<Self, DefinedWordsError> {
        if entries.len() > MAX_DEFINED_WORDS {
            return Err(DefinedWordsError::TooMany(entries.len()));
        }
        let base_url = base_url.trim_matches('/');

        let mut words = Vec::with_capacity(entries.len());
        for word in entries.keys().rev() {
            if word.is_empty() {
                log::debug!("skipping empty defined word");
                continue;
            }

            let href = match resolve_property(&entries, word, link_of)? {
                Some((link, _)) => Some(resolve_link(word, link, base_url, extension)?),
                None => None,
            };
            let desc = match resolve_property(&entries, word, desc_of)? {
                Some((desc, None)) => Some(desc.to_string()),
                Some((desc, Some(target))) => Some(format!("{target}{DESC_SEPARATOR}{desc}")),
                None => None,
            };

            words.push(DefinedWord {
                word: word.clone(),
                href,
                desc,
                starts_word: word.chars().next().is_some_and(is_word_char),
                ends_word: word.chars().next_back().is_some_and(is_word_char),
            });
        }

        let candidates = if words.is_empty() {
            None
        } else {
            let pattern = words
                .iter()
                .map(|entry| regex::escape(&entry.word))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&pattern)?)
        };

        Ok(Self { words, candidates })
    }

    /// Read a JSON dictionary (`{"word": {"link": ..., "desc": ..., "redirect": ...}}`).
    pub fn load(path: &Path, base_url: &str, extension: &str) -> Result<Self, DefinedWordsError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| DefinedWordsError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let entries = serde_json::from_str(&content).map_err(|source| DefinedWordsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let words = Self::new(entries, base_url, extension)?;
        log::debug!("loaded {} defined words from {}", words.len(), path.display());
        Ok(words)
    }

    /// The dictionary named in the site config, if there is one.
    pub fn for_site(site: &Config) -> Result<Option<Self>, DefinedWordsError> {
        site.defined_words
            .as_deref()
            .map(|path| Self::load(path, &site.base_url, &site.extension))
            .transpose()
    }

    pub fn get(&self, word: &str) -> Option<&DefinedWord> {
        self.words.iter().find(|entry| entry.word == word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Wrap every dictionary word in the text and tails below `root`.
    pub fn link_words(&self, root: &mut Element) {
        if self.candidates.is_some() {
            self.link_element(root);
        }
    }

    fn link_element(&self, el: &mut Element) {
        if EXCLUDED_TAGS.contains(&el.tag.to_ascii_lowercase().as_str()) {
            return;
        }

        let mut children = Vec::with_capacity(el.children.len());
        if let Some(text) = el.text.take() {
            let (text, anchors) = self.split_text(&text);
            el.text = Some(text);
            children.extend(anchors);
        }

        for mut child in std::mem::take(&mut el.children) {
            self.link_element(&mut child);
            let anchors = match child.tail.take() {
                Some(tail) => {
                    let (tail, anchors) = self.split_text(&tail);
                    child.tail = Some(tail);
                    anchors
                }
                None => vec![],
            };
            children.push(child);
            children.extend(anchors);
        }

        el.children = children;
    }

    /// Split `text` into the part before the first word and the links that
    /// follow it, each link holding the text up to the next one as its tail.
    fn split_text(&self, text: &str) -> (String, Vec<Element>) {
        let Some(candidates) = &self.candidates else {
            return (text.to_string(), vec![]);
        };

        let mut head = None;
        let mut anchors: Vec<Element> = vec![];
        let mut pos = 0;
        let mut search = 0;

        while let Some(found) = candidates.find_at(text, search) {
            let start = found.start();
            let Some(entry) = self.word_at(text, start) else {
                search = start + text[start..].chars().next().map_or(1, char::len_utf8);
                continue;
            };

            let left = text[pos..start].to_string();
            match anchors.last_mut() {
                Some(prev) => prev.tail = Some(left),
                None => head = Some(left),
            }
            anchors.push(entry.anchor());

            pos = start + entry.word.len();
            search = pos;
        }

        let rest = text[pos..].to_string();
        match anchors.last_mut() {
            Some(prev) => prev.tail = Some(rest),
            None => head = Some(rest),
        }
        (head.unwrap_or_default(), anchors)
    }

    /// The first word, in dictionary order, that occurs at `start` on a
    /// word boundary.
    fn word_at(&self, text: &str, start: usize) -> Option<&DefinedWord> {
        let before = text[..start].chars().next_back();
        let rest = &text[start..];

        self.words.iter().find(|entry| {
            if !rest.starts_with(entry.word.as_str()) {
                return false;
            }
            let after = rest[entry.word.len()..].chars().next();
            let joins_before = entry.starts_word && before.is_some_and(is_word_char);
            let joins_after = entry.ends_word && after.is_some_and(is_word_char);
            !joins_before && !joins_after
        })
    }
}

fn link_of(entry: &WordEntry) -> Option<&str> {
    entry.link.as_deref()
}

fn desc_of(entry: &WordEntry) -> Option<&str> {
    entry.desc.as_deref()
}

/// Look up a property of `word`, following redirects until an entry has it.
///
/// Returns the value and, when it came from another entry, that entry's word.
fn resolve_property<'e>(
    entries: &'e BTreeMap<String, WordEntry>,
    word: &'e str,
    property: fn(&WordEntry) -> Option<&str>,
) -> Result<Option<(&'e str, Option<&'e str>)>, DefinedWordsError> {
    let Some(mut entry) = entries.get(word) else {
        return Ok(None);
    };
    if let Some(value) = property(entry) {
        return Ok(Some((value, None)));
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut current = word;
    while let Some(target) = entry.redirect.as_deref() {
        if !visited.insert(current) {
            return Err(DefinedWordsError::RedirectLoop(current.to_string()));
        }
        entry = entries
            .get(target)
            .ok_or_else(|| DefinedWordsError::UnknownRedirect {
                word: current.to_string(),
                target: target.to_string(),
            })?;
        current = target;
        if let Some(value) = property(entry) {
            return Ok(Some((value, Some(current))));
        }
    }
    Ok(None)
}

/// Make a dictionary link absolute: `.md` becomes `extension` and the site
/// root is prefixed. Links with a scheme are kept as they are.
fn resolve_link(
    word: &str,
    link: &str,
    base_url: &str,
    extension: &str,
) -> Result<String, DefinedWordsError> {
    static LINK_MD_RE: OnceLock<Regex> = OnceLock::new();
    let link_md_re = LINK_MD_RE
        .get_or_init(|| Regex::new(r"^([^?#]+?)\.md([?#]|$)").expect("Invalid link regex"));

    if has_scheme(link) {
        return Ok(link.to_string());
    }

    let link = link_md_re.replacen(link, 1, |caps: &Captures| {
        format!("{}{extension}{}", &caps[1], &caps[2])
    });
    if !link.starts_with('/') {
        return Err(DefinedWordsError::RelativeLink {
            word: word.to_string(),
            link: link.into_owned(),
        });
    }
    Ok(format!("{base_url}{link}"))
}

/// Letters with case, digits and `_`: the characters a Latin word is made of.
fn is_word_char(c: char) -> bool {
    static WORD_CHAR_RE: OnceLock<Regex> = OnceLock::new();
    let word_char_re = WORD_CHAR_RE
        .get_or_init(|| Regex::new(r"^[\p{Ll}\p{Lu}_0-9]$").expect("Invalid word char regex"));

    word_char_re.is_match(c.encode_utf8(&mut [0; 4]))
}
