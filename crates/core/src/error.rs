//! Error types for ufs-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for ufs-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// A single failed delete batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// Zero-based index of the batch in submission order
    pub batch: usize,
    /// Keys in the batch that were not deleted
    pub keys: Vec<String>,
    /// Reason reported by the store (request error or per-key error)
    pub reason: String,
}

/// Error types for ufs-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid path format, or a path whose trailing separator contradicts its role
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Path scheme is neither a local absolute path nor an object-store URL
    #[error("Unrecognized path scheme: {0}")]
    UnrecognizedScheme(String),

    /// Requested archive format does not match the destination extension
    #[error("Archive format '{format}' requires a '{expected}' destination, got '{path}'")]
    FormatMismatch {
        format: String,
        expected: String,
        path: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Archive encoding error
    #[error("Archive error: {0}")]
    Archive(String),

    /// Request was rejected for lack of permission
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Destination already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Network error (retryable)
    #[error("Network error: {0}")]
    Network(String),

    /// Operation not implemented for this backend or backend pair
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// A symbolic link points back into its own ancestry
    #[error("Symbolic link loop at {0}")]
    SymlinkLoop(String),

    /// One or more delete batches failed; the remaining batches were still issued
    #[error("{} of {total_batches} delete batch(es) failed ({} key(s) not deleted)", .failures.len(), failed_key_count(.failures))]
    PartialDelete {
        total_batches: usize,
        failures: Vec<BatchFailure>,
    },

    /// One or more files of a recursive transfer failed
    #[error("{} of {total} file transfer(s) failed: {}", .failed.len(), describe_failed(.failed))]
    Transfer {
        total: usize,
        failed: Vec<(String, String)>,
    },

    /// Operation was cancelled before completion
    #[error("Operation cancelled")]
    Cancelled,

    /// General error
    #[error("{0}")]
    General(String),
}

fn failed_key_count(failures: &[BatchFailure]) -> usize {
    failures.iter().map(|f| f.keys.len()).sum()
}

fn describe_failed(failed: &[(String, String)]) -> String {
    failed
        .iter()
        .map(|(path, reason)| format!("{path} ({reason})"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidPath(_)
            | Error::UnrecognizedScheme(_)
            | Error::FormatMismatch { .. }
            | Error::Config(_) => 2, // UsageError
            Error::Network(_) => 3,      // NetworkError
            Error::AccessDenied(_) => 4, // AuthError
            Error::NotFound(_) => 5,     // NotFound
            Error::AlreadyExists(_) => 6, // Conflict
            Error::Unsupported(_) => 7,  // UnsupportedFeature
            Error::Cancelled => 130,     // Interrupted
            _ => 1,                      // GeneralError
        }
    }

    /// Whether this error means the addressed object or directory does not exist
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Whether this error is an authorization rejection
    pub const fn is_access_denied(&self) -> bool {
        matches!(self, Error::AccessDenied(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::InvalidPath("test".into()).exit_code(), 2);
        assert_eq!(Error::UnrecognizedScheme("gs://x".into()).exit_code(), 2);
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(Error::Network("test".into()).exit_code(), 3);
        assert_eq!(Error::AccessDenied("test".into()).exit_code(), 4);
        assert_eq!(Error::NotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::AlreadyExists("test".into()).exit_code(), 6);
        assert_eq!(Error::Unsupported("test".into()).exit_code(), 7);
        assert_eq!(Error::Cancelled.exit_code(), 130);
        assert_eq!(Error::General("test".into()).exit_code(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = Error::UnrecognizedScheme("gs://bucket/key".into());
        assert_eq!(err.to_string(), "Unrecognized path scheme: gs://bucket/key");

        let err = Error::InvalidPath("/bad/path".into());
        assert_eq!(err.to_string(), "Invalid path: /bad/path");
    }

    #[test]
    fn test_partial_delete_display_counts_keys() {
        let err = Error::PartialDelete {
            total_batches: 3,
            failures: vec![BatchFailure {
                batch: 1,
                keys: vec!["a".into(), "b".into()],
                reason: "SlowDown".into(),
            }],
        };
        assert_eq!(
            err.to_string(),
            "1 of 3 delete batch(es) failed (2 key(s) not deleted)"
        );
    }

    #[test]
    fn test_transfer_display_names_files() {
        let err = Error::Transfer {
            total: 4,
            failed: vec![("/tmp/a.txt".into(), "denied".into())],
        };
        assert!(err.to_string().contains("/tmp/a.txt (denied)"));
        assert!(err.to_string().starts_with("1 of 4"));
    }

    #[test]
    fn test_not_found_is_distinct_from_access_denied() {
        assert!(Error::NotFound("x".into()).is_not_found());
        assert!(!Error::NotFound("x".into()).is_access_denied());
        assert!(Error::AccessDenied("x".into()).is_access_denied());
        assert!(!Error::AccessDenied("x".into()).is_not_found());
    }
}
