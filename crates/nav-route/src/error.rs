//! Route-construction error type.

use thiserror::Error;

/// Errors produced while building a [`RouteGeometry`][crate::RouteGeometry].
///
/// All of them are load-time failures: a route that produced one of these is
/// never installed, so queries on a built geometry cannot fail this way.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error("degenerate route: {0}")]
    Degenerate(String),

    #[error("leg {leg} step {step} has {count} spoken instructions (max {max})")]
    TooManyInstructions {
        leg:   usize,
        step:  usize,
        count: usize,
        max:   usize,
    },
}

pub type RouteResult<T> = Result<T, RouteError>;
