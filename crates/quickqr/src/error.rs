//! Error types for quickqr.
//!
//! Storage load and persist failures are deliberately absent here: they are
//! reported through [`crate::log::LoadOutcome`] and [`crate::log::PersistOutcome`]
//! so a corrupt or oversized record never aborts the caller.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for quickqr operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Input Errors ===
    /// A form field failed validation. The message is shown to the user inline.
    #[error("{message}")]
    Validation {
        /// The offending field.
        field: &'static str,
        /// User-visible message.
        message: String,
    },

    /// A decoded QR payload was rejected before it reached the history.
    #[error("invalid scan: {message}")]
    InvalidScan {
        /// Description of the rejection.
        message: String,
    },

    /// The QR encoder failed to render the content.
    #[error("failed to generate QR code: {message}")]
    Encode {
        /// Description of what went wrong.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for quickqr operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a field validation error.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a scan rejection error.
    #[must_use]
    pub fn invalid_scan(message: impl Into<String>) -> Self {
        Self::InvalidScan {
            message: message.into(),
        }
    }

    /// Create an encoder error.
    #[must_use]
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error is a form validation failure.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error was caused by user input rather than the environment.
    ///
    /// These are the failures surfaced as an inline message; no history entry
    /// is created for any of them.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::InvalidScan { .. } | Self::Encode { .. }
        )
    }
}
