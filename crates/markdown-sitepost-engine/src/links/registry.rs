use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use crate::io::{self, IoError};

use super::url::remove_md;

/// Read-only membership check for site pages.
///
/// Paths are site-relative with a leading slash, `.md` removed, the
/// configured extension applied, and no query or fragment: `/guide/intro`.
pub trait LinkRegistry {
    fn contains(&self, path: &str) -> bool;
}

impl LinkRegistry for HashSet<String> {
    fn contains(&self, path: &str) -> bool {
        HashSet::contains(self, path)
    }
}

impl LinkRegistry for BTreeSet<String> {
    fn contains(&self, path: &str) -> bool {
        BTreeSet::contains(self, path)
    }
}

/// The set of pages that exist when the site is rendered.
///
/// Built once per site run and shared between documents; it is never
/// modified after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRegistry {
    pages: HashSet<String>,
}

impl PageRegistry {
    /// Build from already-normalized site paths.
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pages: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Build from page source paths such as `guide/intro.md`.
    pub fn from_sources<I, S>(sources: I, extension: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_paths(
            sources
                .into_iter()
                .map(|source| page_path(source.as_ref(), extension)),
        )
    }

    /// Record every `.md` file below `pages_root`.
    pub fn scan(pages_root: &Path, extension: &str) -> Result<Self, IoError> {
        let files = io::scan_markdown_files(pages_root)?;
        log::debug!(
            "registered {} pages from {}",
            files.len(),
            pages_root.display()
        );
        Ok(Self::from_sources(
            files.iter().map(|file| file.as_str()),
            extension,
        ))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().map(String::as_str)
    }
}

impl LinkRegistry for PageRegistry {
    fn contains(&self, path: &str) -> bool {
        self.pages.contains(path)
    }
}

/// Site path of a page source: leading slash, `.md` replaced by `extension`.
pub fn page_path(source: &str, extension: &str) -> String {
    format!("/{}", remove_md(source.trim_start_matches('/'), extension))
}
