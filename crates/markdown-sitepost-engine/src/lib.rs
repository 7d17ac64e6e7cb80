pub mod decorate;
pub mod error;
pub mod io;
pub mod links;
pub mod postprocess;
pub mod preprocess;
pub mod restructure;
pub mod sanitize;
pub mod tree;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use error::PostprocessError;
pub use links::{
    DefinedWords, DefinedWordsError, Diagnostic, DiagnosticSink, LinkRegistry, LinkResolver,
    PageRegistry, ResolutionConfig, StdioSink,
};
pub use postprocess::{Postprocessor, ProcessedDocument};
pub use preprocess::{normalize_list_spacing, normalize_text};
pub use sanitize::{RawStash, sanitize_fragment};
pub use tree::Element;
