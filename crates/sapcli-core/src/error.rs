//! Error types for sapcli core.

/// Core error type for sapcli infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum SapCliError {
    /// A name that cannot be used as an XML element name.
    #[error("invalid identifier: {0:?} (must be a non-empty XML element name)")]
    InvalidIdentifier(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result type for sapcli operations.
pub type SapCliResult<T> = Result<T, SapCliError>;
