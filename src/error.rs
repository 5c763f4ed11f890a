//! Error types for drive.

use thiserror::Error;

/// Common error type for drive.
#[derive(Error, Debug)]
pub enum DriveError {
    /// Logical path is malformed, escapes the namespace, or misuses the root.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Owner identifier cannot be used as a namespace directory.
    #[error("invalid owner: {0}")]
    InvalidOwner(String),

    /// Path names the root or a directory where a file was expected.
    #[error("not a file: {0}")]
    NotAFile(String),

    /// Attempt to delete an owner's namespace root.
    #[error("cannot delete root")]
    RootDeletionDenied,

    /// Upload payload exceeds the per-file ceiling.
    #[error("file {filename} exceeds {limit_mb}MB limit")]
    TooLarge {
        /// Name of the offending file.
        filename: String,
        /// Ceiling in megabytes.
        limit_mb: u64,
    },

    /// Upload batch contains more files than allowed.
    #[error("too many files (max {0})")]
    TooManyFiles(usize),

    /// Upload batch contains no file parts.
    #[error("no files to upload")]
    NoFiles,

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configured storage backend kind is not recognized.
    #[error("unknown drive storage backend: {0}")]
    UnknownBackend(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),
}

impl DriveError {
    /// Translate an I/O error, mapping `NotFound` onto the named resource.
    pub(crate) fn from_io(err: std::io::Error, what: &str) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            DriveError::NotFound(what.to_string())
        } else {
            DriveError::Io(err)
        }
    }
}

/// Result type alias for drive operations.
pub type Result<T> = std::result::Result<T, DriveError>;
