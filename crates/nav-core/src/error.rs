//! Framework error type.
//!
//! Sub-crates define their own error enums and convert `NavError` into them
//! via `From` impls where a core failure can surface (invalid configuration
//! is the common case).

use thiserror::Error;

/// The top-level error type for `nav-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum NavError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `nav-*` crates.
pub type NavResult<T> = Result<T, NavError>;
