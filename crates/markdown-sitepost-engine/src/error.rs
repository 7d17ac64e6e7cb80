use crate::tree::{MissingDocumentTag, ParseError};

/// A document could not be post-processed. Other documents are unaffected.
#[derive(Debug, thiserror::Error)]
pub enum PostprocessError {
    #[error("[Parse Error : {document}] {source}")]
    Parse {
        document: String,
        source: ParseError,
    },

    #[error(transparent)]
    MissingDocumentTag(#[from] MissingDocumentTag),
}
