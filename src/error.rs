//! Error taxonomy shared by the loader, store, and language-model seams.
//!
//! Command plumbing uses `anyhow`; these typed errors exist where a caller
//! has to tell failure kinds apart (skip a file vs. abort, which apology
//! to show).

use std::path::PathBuf;

/// Per-file loading failure. The loader logs these and moves on.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("failed to read {}: {reason}", path.display())]
    ReadFailure { path: PathBuf, reason: String },
}

/// Invalid chunking parameters.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChunkConfigError {
    #[error("chunking.chunk_size must be > 0")]
    ZeroChunkSize,
    #[error("chunking.overlap ({overlap}) must be smaller than chunking.chunk_size ({chunk_size})")]
    OverlapTooLarge { chunk_size: usize, overlap: usize },
}

/// The vector store could not serve a read or write.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("vector store unavailable: {0}")]
    Unavailable(String),
    #[error("embedding failed: {0}")]
    Embedding(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// The language-model call failed or produced nothing usable.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("OPENAI_API_KEY environment variable not set")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("malformed completion response: {0}")]
    Malformed(String),
}
