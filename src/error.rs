//! Domain error kinds for the agent pipeline.
//!
//! Loader, existence-check, translation, and execution failures propagate
//! to the terminal error state and are rendered as a user-visible message.
//! Extraction parse failures and embedding failures are absorbed locally
//! with degraded output and never appear here as hard errors.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AgentError {
    /// The input file does not exist.
    #[error("file not found: {0}")]
    NotFound(String),

    /// The file exists but its text could not be extracted.
    #[error("could not load document: {0}")]
    Load(String),

    /// The database could not be reached or a storage query failed.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The language model call for field extraction failed outright
    /// (transport or timeout). A malformed but received response is
    /// handled fail-open and does not produce this error.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// The language model failed to produce usable query text.
    #[error("query translation failed: {0}")]
    Translation(String),

    /// The generated statement is not a single read-only SELECT.
    #[error("generated statement rejected: {0}")]
    UnsafeQueryRejected(String),

    /// The generated query failed against the store.
    #[error("query execution failed: {0}")]
    Execution(String),

    /// Embedding generation or storage failed. Downgraded to a warning
    /// by the persistence writer; never terminal on its own.
    #[error("embedding failed: {0}")]
    Embedding(String),
}
