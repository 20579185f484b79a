//! `nav-reroute` — deciding when to reroute, and fencing the answers.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`state`]       | `RerouteState`, `RerouteCause`                             |
//! | [`request`]     | `RouteRequester` trait, `RouteRequest`, `RouteCompletion`, `CompletionSender`, `QueuedRequester`, `TokioRequester` |
//! | [`coordinator`] | `RerouteCoordinator`, proactive offer evaluation           |
//! | [`error`]       | `RerouteError`, `RerouteResult<T>`                         |
//!
//! # Concurrency
//!
//! The route request is the only thing that runs out of line.  Its answer
//! comes back over an unbounded `tokio::sync::mpsc` channel and is merged by
//! the coordinator's owner on its own thread, one completion at a time.
//! Every request carries a fresh [`RequestSeq`][nav_core::RequestSeq]; an
//! answer whose sequence number is not the one currently in flight is stale
//! and dropped.

pub mod coordinator;
pub mod error;
pub mod request;
pub mod state;


pub use coordinator::{
    CompletionOutcome, DepartureDecision, ProactiveDecision, ProactiveOffer, ProactiveRejection,
    RequestContext, RerouteCoordinator,
};
pub use error::{RerouteError, RerouteResult};
pub use request::{
    CompletionSender, QueuedRequester, RouteCompletion, RouteRequest, RouteRequester, TokioRequester,
};
pub use state::{RerouteCause, RerouteState};
