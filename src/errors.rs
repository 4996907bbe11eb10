//! Error Types
//!
//! This module defines the error types used throughout the import pipeline.
//!
//! # Overview
//!
//! The main error type [`ImportError`] covers every fatal failure mode:
//! - Format errors: the source violates a structural invariant (non-triangular
//!   faces, duplicate bone names, invalid animation samplers, corrupt files)
//! - Argument errors: the caller asked for something contradictory
//! - Not-found errors: a referenced mesh or animation does not exist
//! - I/O errors: the byte-stream collaborator failed, wrapped with context
//!
//! Recoverable problems (a missing optional texture, a bone index that does not
//! fit in a byte, ...) are never errors. They are logged and recorded in
//! [`Diagnostics`](crate::import::Diagnostics) and the import continues.
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, ImportError>`.
//!
//! ```rust,ignore
//! use myth_import::errors::{ErrorKind, ImportError};
//!
//! match importer.import("robot.glb?mesh=Body", OutputKind::Mesh) {
//!     Err(e) if e.kind() == ErrorKind::NotFound => { /* ... */ }
//!     other => { /* ... */ }
//! }
//! ```

use thiserror::Error;

/// The main error type for the import pipeline.
#[derive(Error, Debug)]
pub enum ImportError {
    // ========================================================================
    // Source Format Errors
    // ========================================================================
    /// The source data violates a structural invariant.
    #[error("Format error: {0}")]
    Format(String),

    /// The glTF document could not be parsed or validated.
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),

    /// A JSON payload (glTF extras, settings) could not be parsed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 decoding of a `data:` URI failed.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    // ========================================================================
    // Caller Errors
    // ========================================================================
    /// The request is contradictory or cannot be served.
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// A mesh or animation referenced by name/index does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// The byte-stream collaborator failed.
    #[error("IO error while {context}")]
    Io {
        /// What the importer was doing when the failure occurred
        context: String,
        /// The underlying failure
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification of an [`ImportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Format,
    Argument,
    NotFound,
    Io,
}

impl ImportError {
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns the coarse category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Format(_) | Self::Gltf(_) | Self::Json(_) | Self::Base64(_) => ErrorKind::Format,
            Self::Argument(_) => ErrorKind::Argument,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Io { .. } => ErrorKind::Io,
        }
    }
}

/// Alias for `Result<T, ImportError>`.
pub type Result<T> = std::result::Result<T, ImportError>;
