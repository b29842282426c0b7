use thiserror::Error;

/// Errors surfaced by the indexing and ranking engine. Each error is scoped
/// to a single operation (one document, one query); batch callers decide
/// whether to skip or abort.
#[derive(Error, Debug)]
pub enum Error {
    /// The document cannot be indexed because it has no usable identity.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Field schema construction or validation failed.
    #[error("schema error: {0}")]
    Schema(String),

    /// A query or statistic was requested against a store with no entries.
    #[error("index is empty")]
    EmptyIndex,

    /// The postings store rejected an operation or is inconsistent.
    #[error("store error: {0}")]
    Store(String),

    /// Persistence I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Durable layout encode/decode failure.
    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// Meta file encode/decode failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_document<S: Into<String>>(msg: S) -> Self {
        Error::InvalidDocument(msg.into())
    }

    pub fn schema<S: Into<String>>(msg: S) -> Self {
        Error::Schema(msg.into())
    }

    pub fn store<S: Into<String>>(msg: S) -> Self {
        Error::Store(msg.into())
    }
}
