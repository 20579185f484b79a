//! Reroute error type.

use nav_route::RouteError;
use thiserror::Error;

/// Why a reroute attempt produced no route.
///
/// Cloneable so it can travel inside a `DidFailToReroute` event.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RerouteError {
    /// The route service failed (network, no route found, …).
    #[error("route request failed: {0}")]
    RequestFailed(String),

    /// The service answered with a route that cannot be installed.
    #[error("received unusable route: {0}")]
    Degenerate(#[from] RouteError),

    /// The requester dropped the request without answering.
    #[error("route request cancelled")]
    Cancelled,
}

pub type RerouteResult<T> = Result<T, RerouteError>;
