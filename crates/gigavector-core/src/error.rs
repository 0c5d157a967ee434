//! Error types for `GigaVector`.
//!
//! A single error type is used for every core operation. Each variant
//! corresponds to one of the error kinds named in the specification's error
//! handling design, and carries a short code (`GIGA-XXX`) for debugging.

use thiserror::Error;

/// Result type alias for `GigaVector` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in `GigaVector` operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The filter DSL failed to parse (GIGA-001).
    #[error("[GIGA-001] filter parse error")]
    ParseError,

    /// A vector's dimension disagreed with the collection's declared
    /// dimension (GIGA-002).
    #[error("[GIGA-002] dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension declared at collection creation.
        expected: usize,
        /// Dimension actually supplied.
        actual: usize,
    },

    /// An id, key, or namespace could not be found (GIGA-003).
    #[error("[GIGA-003] not found: {0}")]
    NotFound(String),

    /// A null handle or an out-of-range argument was supplied where a
    /// valid one was required (GIGA-004).
    #[error("[GIGA-004] invalid argument: {0}")]
    InvalidArgument(String),

    /// An allocation or resource request could not be satisfied (GIGA-005).
    #[error("[GIGA-005] resource exhausted: {0}")]
    ResourceExhausted(String),

    /// A vacuum or migration was already running when `start`/`run` was
    /// called again (GIGA-006).
    #[error("[GIGA-006] operation already in progress")]
    Busy,

    /// A migration observed its cancel flag and stopped early (GIGA-007).
    #[error("[GIGA-007] operation cancelled")]
    Cancelled,

    /// An invariant that should be unreachable was violated (GIGA-008).
    #[error("[GIGA-008] internal error: {0}")]
    Internal(String),

    /// Configuration could not be loaded or parsed (GIGA-009).
    #[error("[GIGA-009] configuration error: {0}")]
    Config(String),

    /// IO error surfaced by the ambient stack (config files, TLS material).
    #[error("[GIGA-010] IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the error code (e.g. `"GIGA-001"`).
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ParseError => "GIGA-001",
            Self::DimensionMismatch { .. } => "GIGA-002",
            Self::NotFound(_) => "GIGA-003",
            Self::InvalidArgument(_) => "GIGA-004",
            Self::ResourceExhausted(_) => "GIGA-005",
            Self::Busy => "GIGA-006",
            Self::Cancelled => "GIGA-007",
            Self::Internal(_) => "GIGA-008",
            Self::Config(_) => "GIGA-009",
            Self::Io(_) => "GIGA-010",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(Error::ParseError.code(), "GIGA-001");
        assert_eq!(
            Error::DimensionMismatch {
                expected: 4,
                actual: 8
            }
            .code(),
            "GIGA-002"
        );
        assert_eq!(Error::Busy.code(), "GIGA-006");
    }
}
