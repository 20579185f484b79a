use nav_core::NavError;
use nav_route::RouteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] NavError),

    #[error("route rejected: {0}")]
    Route(#[from] RouteError),

    #[error("no route is loaded")]
    NoActiveRoute,
}

pub type EngineResult<T> = Result<T, EngineError>;
