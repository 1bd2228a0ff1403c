//! Executor error types.
//!
//! Every variant is fatal: a benchmark run that hits any of them is
//! abandoned and the error is handed to the caller's top-level handler.

use thiserror::Error;

/// Boxed error produced by a storage backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Benchmark run errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The backend failed while executing an operation.
    #[error("{operation} failed: {source}")]
    Backend {
        operation: String,
        #[source]
        source: BoxError,
    },

    /// A correctness gate between phases did not hold.
    #[error("invalid number of objects returned by {operation} - {actual} instead of {expected}")]
    CountMismatch {
        operation: String,
        expected: usize,
        actual: usize,
    },

    /// A run was requested before the backend was initialized.
    #[error("executor is not initialized")]
    NotInitialized,

    /// Filesystem error outside of the backend.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Profiler could not be started or its report written.
    #[error("profiler error: {0}")]
    Profiler(String),

    /// Report serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap a backend error with the name of the operation that produced it.
    pub fn backend<E>(operation: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Backend {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    /// Name of the failing operation, if the error is tied to one.
    pub fn operation(&self) -> Option<&str> {
        match self {
            Error::Backend { operation, .. } | Error::CountMismatch { operation, .. } => {
                Some(operation)
            }
            _ => None,
        }
    }
}

/// Result alias for executor operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_mismatch_message() {
        let err = Error::CountMismatch {
            operation: "ReadAll".to_string(),
            expected: 10,
            actual: 9,
        };
        assert_eq!(
            err.to_string(),
            "invalid number of objects returned by ReadAll - 9 instead of 10"
        );
        assert_eq!(err.operation(), Some("ReadAll"));
    }

    #[test]
    fn test_backend_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = Error::backend("PutBulk", io);
        assert_eq!(err.to_string(), "PutBulk failed: disk full");
        assert!(std::error::Error::source(&err).is_some());
    }
}
