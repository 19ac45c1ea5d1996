//! Centralized error handling for cf_compressed
//!
//! Every fallible operation in the crate returns [`Result`], whose error type
//! [`CfArrayError`] covers index parsing, descriptor validation, decompression
//! and file access. Errors are raised synchronously and never retried.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for cf_compressed operations
#[derive(Error, Debug)]
pub enum CfArrayError {
    /// Out-of-range position, zero slice step, repeated fill marker or too many indices
    #[error("Invalid index: {message}")]
    InvalidIndex { message: String },

    /// Compression kind name that is not one of the CF encodings
    #[error("Unrecognised compression kind '{kind}'")]
    InvalidCompressionKind { kind: String },

    /// Store shape incompatible with the descriptor's mapping
    #[error("Shape mismatch: {message}")]
    ShapeMismatch { message: String },

    /// Failure opening or reading a NetCDF file
    #[error("I/O failure on '{}': {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: netcdf::Error,
    },

    /// Variable not present in a NetCDF file
    #[error("Variable '{var}' not found in file '{}'", path.display())]
    VariableNotFound { var: String, path: PathBuf },

    /// Malformed compression descriptor (missing or unknown fields)
    #[error("Invalid compression descriptor: {message}")]
    InvalidDescriptor { message: String },

    /// Unknown, released or mistyped shared buffer handle
    #[error("Shared buffer {handle}: {message}")]
    SharedBuffer { handle: u64, message: String },

    /// NetCDF library errors not tied to a particular file
    #[error("NetCDF error: {0}")]
    NetCDFError(#[from] netcdf::Error),

    /// Local I/O errors (spill files)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Array shape or dimension error
    #[error("Array error: {0}")]
    ArrayError(#[from] ndarray::ShapeError),
}

impl CfArrayError {
    pub(crate) fn invalid_index(message: impl Into<String>) -> Self {
        Self::InvalidIndex {
            message: message.into(),
        }
    }

    pub(crate) fn shape_mismatch(message: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_descriptor(message: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            message: message.into(),
        }
    }

    /// Whether the error came from file or storage access rather than from
    /// the request itself
    #[must_use]
    pub fn is_io_failure(&self) -> bool {
        matches!(
            self,
            Self::IoFailure { .. } | Self::NetCDFError(_) | Self::IoError(_)
        )
    }
}

impl From<serde_json::Error> for CfArrayError {
    fn from(error: serde_json::Error) -> Self {
        Self::invalid_descriptor(error.to_string())
    }
}

/// Result type alias for cf_compressed operations
pub type Result<T> = std::result::Result<T, CfArrayError>;
