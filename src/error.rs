//! Error types for sensevec.

use thiserror::Error;

/// Result type for sensevec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sensevec operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The key codec could not determine a sense tag for an object.
    #[error("Unresolvable sense for {text:?}: no entity label and no usable tag")]
    UnresolvableSense {
        /// Surface text of the offending object.
        text: String,
    },

    /// An accessor was called on an object whose document was never processed.
    #[error("Unbound document: {0} has not been processed by a sense component")]
    UnboundDocument(String),

    /// A well-formed key is absent from the vector store.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Invalid argument provided.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Serialized store data could not be loaded.
    #[error("Store load error: {0}")]
    StoreLoad(String),

    /// Extension registry misuse (duplicate registration, unknown name).
    #[error("Extension error: {0}")]
    Extension(String),

    /// Document model error.
    #[error("Document error: {0}")]
    Document(#[from] sensevec_core::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an unresolvable-sense error.
    pub fn unresolvable_sense(text: impl Into<String>) -> Self {
        Error::UnresolvableSense { text: text.into() }
    }

    /// Create a key-not-found error.
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Error::KeyNotFound(key.into())
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Create a store load error.
    pub fn store_load(msg: impl Into<String>) -> Self {
        Error::StoreLoad(msg.into())
    }

    /// Create an extension error.
    pub fn extension(msg: impl Into<String>) -> Self {
        Error::Extension(msg.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::StoreLoad(format!("{}", err))
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::StoreLoad(format!("{}", err))
    }
}
