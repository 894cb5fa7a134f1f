use thiserror::Error;

/// Errors surfaced by the quote store, exchange, and document generation.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Import(String),

    #[error("document generation failed: {0}")]
    Document(String),

    #[error("no draft stored under number {0}")]
    NotFound(String),
}

impl From<std::io::Error> for QuoteError {
    fn from(err: std::io::Error) -> Self {
        QuoteError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for QuoteError {
    fn from(err: serde_json::Error) -> Self {
        QuoteError::Storage(err.to_string())
    }
}
