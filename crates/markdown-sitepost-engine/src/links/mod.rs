//! # Link & media resolution
//!
//! Rewrites every `<a href>` and `<img src>` in a converted page into its
//! canonical form and checks internal links against the set of pages that
//! exist on the site.
//!
//! All link rewriting first produces an absolute URL under `base_url`; the
//! relative form (when enabled) is derived from that, so validation always
//! sees canonical site paths.
//!
//! - **`context`**: `ResolutionConfig`, the per-document settings
//! - **`url`**: `.md` stripping, segment resolution, relative path derivation
//! - **`registry`**: `LinkRegistry` lookups and the `PageRegistry` set
//! - **`diagnostics`**: broken/pending link reports and where they are written
//! - **`resolver`**: `LinkResolver`, the tree pass itself
//! - **`defined_words`**: dictionary terms in page text turned into links,
//!   run before the resolver so their targets are checked like any other

pub mod context;
pub mod defined_words;
pub mod diagnostics;
pub mod registry;
pub mod resolver;
pub mod url;

pub use context::ResolutionConfig;
pub use defined_words::{DefinedWords, DefinedWordsError, WordEntry};
pub use diagnostics::{Diagnostic, DiagnosticSink, Severity, StdioSink};
pub use registry::{LinkRegistry, PageRegistry};
pub use resolver::LinkResolver;
