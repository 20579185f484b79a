//! Error types for nav-output.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A trace row parsed but does not describe a usable fix.
    #[error("trace row {row}: {reason}")]
    InvalidFix { row: usize, reason: String },
}

/// Alias for `Result<T, OutputError>`.
pub type OutputResult<T> = Result<T, OutputError>;
