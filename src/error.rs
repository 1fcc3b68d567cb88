//! Error types
//!
//! `TreeError` covers structural failures of the quadtree model, `StorageError`
//! covers file, network and codec failures, and `ApiError` is the top-level
//! error returned by configuration and logging setup.

use thiserror::Error;

/// Failures raised by tree-level operations.
#[derive(Debug, Error)]
pub enum TreeError {
    /// A node, file or quadkey path could not be resolved
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Malformed construction input (children count, pixel range, existing destination)
    #[error("Creation failed: {0}")]
    CreationFailed(String),

    #[error("Invalid quadkey: {0:?}")]
    InvalidQuadKey(String),

    #[error("Zoom level {zoom} is deeper than the maximum of {max}")]
    ZoomOutOfRange { zoom: u32, max: u32 },

    #[error("Invalid node link: {0:?}")]
    InvalidLink(String),

    #[error("Unknown operator tag: {0:?}")]
    UnknownOperator(String),

    #[error("Resolution must be a power of two, got {0}")]
    InvalidResolution(u32),

    #[error("Canvas is {actual:?} but resolution {expected} was requested")]
    CanvasMismatch { expected: u32, actual: (u32, u32) },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failures raised while reading, writing, fetching or encoding data.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {0}")]
    Decode(String),

    #[error("Failed to encode {0}")]
    Encode(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Destination exists and an implicit overwrite was attempted
    #[error("File {0} already exists")]
    AlreadyExists(String),

    #[error("Unknown file type: {0:?}")]
    UnknownFileType(String),

    #[error("Writing to remote destination {0} is not supported")]
    RemoteWrite(String),

    #[error("Tile cache error: {0}")]
    Cache(String),
}

impl StorageError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures observed on a background task handle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("Background task is still running")]
    NotYetDone,

    #[error("Background task panicked")]
    Panicked,
}

/// Top-level error for configuration, logging and service setup.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
