//! Core error types for happyday-core.
//!
//! Permission denial, missed fire windows and corrupt persisted records are
//! deliberately NOT errors: the scheduler recovers from them locally. The
//! only condition surfaced to callers of `set_reminder` is invalid input.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the scheduler.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// Persistence failures (reading or writing the reminder store).
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid caller input.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Persistence-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The data directory could not be determined or created.
    #[error("Failed to prepare data directory: {0}")]
    DataDir(String),

    /// Reading a namespace file failed at the IO level.
    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing a namespace file failed at the IO level.
    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be encoded for storage.
    #[error("Failed to encode record '{id}': {message}")]
    EncodeFailed { id: String, message: String },
}

/// Invalid caller input.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Time of day was not `HH:MM` or was out of range.
    #[error("Invalid time of day '{input}': expected HH:MM between 00:00 and 23:59")]
    InvalidTimeOfDay { input: String },

    /// Reminder kind slug was empty or contained invalid characters.
    #[error("Invalid reminder kind '{input}': {message}")]
    InvalidKind { input: String, message: String },
}

/// Result type alias for SchedulerError.
pub type Result<T, E = SchedulerError> = std::result::Result<T, E>;
