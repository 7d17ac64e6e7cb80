//! # Post-conversion pipeline
//!
//! Runs every pass over one converted page:
//!
//! 1. stashed raw fragments are sanitized and put back in place
//! 2. the output is wrapped in a `div` document element and parsed
//! 3. tables are decorated, defined words linked, links and images resolved
//! 4. the title/body split is applied
//! 5. the tree is serialized and the wrapper stripped again

use crate::decorate::add_table_borders;
use crate::error::PostprocessError;
use crate::links::{DefinedWords, DiagnosticSink, LinkRegistry, LinkResolver, ResolutionConfig};
use crate::restructure::split_title_body;
use crate::sanitize::RawStash;
use crate::tree::{parse_document, serialize, strip_document_tag};

/// Wrapper element placed around the converter output while it is a tree.
pub const DOCUMENT_TAG: &str = "div";

/// Result of post-processing one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedDocument {
    pub html: String,
    /// Text of the first top-level `h1`, if the page has one.
    pub title: Option<String>,
}

/// Post-processes pages that share one resolution config and registry.
pub struct Postprocessor<'a> {
    config: &'a ResolutionConfig,
    resolver: LinkResolver<'a>,
    defined_words: Option<&'a DefinedWords>,
}

impl<'a> Postprocessor<'a> {
    pub fn new(config: &'a ResolutionConfig, registry: Option<&'a dyn LinkRegistry>) -> Self {
        Self {
            config,
            resolver: LinkResolver::new(config, registry),
            defined_words: None,
        }
    }

    /// Link the words of `defined_words` in every page.
    pub fn with_defined_words(mut self, defined_words: &'a DefinedWords) -> Self {
        self.defined_words = Some(defined_words);
        self
    }

    /// Post-process `converted`, the converter's output for the page, whose
    /// placeholders refer to `stash`.
    pub fn run(
        &self,
        converted: &str,
        stash: &RawStash,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<ProcessedDocument, PostprocessError> {
        log::debug!(
            "post-processing {} ({} raw fragments)",
            self.config.full_path,
            stash.len()
        );

        let text = stash.reinsert(converted);
        let wrapped = format!("<{DOCUMENT_TAG}>{text}</{DOCUMENT_TAG}>");
        let mut root = parse_document(&wrapped).map_err(|source| PostprocessError::Parse {
            document: self.config.full_path.clone(),
            source,
        })?;

        add_table_borders(&mut root);
        if let Some(defined_words) = self.defined_words {
            defined_words.link_words(&mut root);
        }
        self.resolver.resolve(&mut root, sink);
        let title = split_title_body(&mut root);

        let output = serialize(&root);
        let html = strip_document_tag(&output, DOCUMENT_TAG)?;

        Ok(ProcessedDocument { html, title })
    }
}
