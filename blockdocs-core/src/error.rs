//! Error types for Blockdocs Core

use crate::types::DocumentId;
use thiserror::Error;

/// Result type alias using BlockdocsError
pub type Result<T> = std::result::Result<T, BlockdocsError>;

/// Top-level error type for all Blockdocs operations
#[derive(Debug, Error)]
pub enum BlockdocsError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("File error: {0}")]
    File(#[from] FileError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Unknown document: {0}")]
    UnknownDocument(DocumentId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that occur while reading a container
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Not a recognized document: {0}")]
    MalformedArchive(String),

    #[error("Missing metadata: {0}")]
    MissingMetadata(String),

    #[error("Invalid XML: {0}")]
    InvalidXml(String),

    #[error("Invalid cover configuration: {0}")]
    InvalidCoverConfig(String),
}

/// Errors that occur while resolving image or font bytes
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Failed to fetch {url}: {reason}")]
    FetchFailure { url: String, reason: String },

    #[error("Unsupported asset reference: {0}")]
    UnsupportedReference(String),
}

impl AssetError {
    pub(crate) fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        AssetError::FetchFailure {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors that occur during encoding/conversion
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Image decoding failed: {0}")]
    ImageDecode(String),
}

/// Errors raised by the file-system access collaborator
#[derive(Debug, Error)]
pub enum FileError {
    #[error("Picker dismissed by the user")]
    UserCancelled,

    #[error("Persistent file handles are not supported on this platform")]
    UnsupportedPlatform,

    #[error("File IO failed: {0}")]
    Io(String),
}

/// Errors that occur in key-value storage (recovery cache)
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend error: {0}")]
    BackendError(String),
}
