//! Error types for the linegraph toolkit
//!
//! Only construction and I/O problems are errors. A query that finds no route
//! is reported as `None` by the routing layer, never through this type.

use thiserror::Error;

/// Main error type for linegraph operations
#[derive(Debug, Error)]
pub enum Error {
    /// The compacted graph has no intersections or dead-ends to route between
    #[error("compacted graph contains no forks (topology has no intersections)")]
    NoForks,

    /// Malformed input network, coordinate or option value
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type for linegraph operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert_and_keep_source() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "graph.json").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.to_string(), "I/O error: graph.json");
    }

    #[test]
    fn no_forks_message_names_the_problem() {
        assert!(Error::NoForks.to_string().contains("no forks"));
    }
}
