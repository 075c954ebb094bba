//! Error types for the catalog search core.

use thiserror::Error;

/// Errors surfaced by index construction, lookups, predicate parsing and persistence.
///
/// An empty ranking is never an error; it is returned as an empty `Vec`.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller supplied something the core cannot work with: an empty dataset,
    /// a duplicate product id, a malformed predicate value, or persisted parts
    /// that do not fit together.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Lookup of an unknown document.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
