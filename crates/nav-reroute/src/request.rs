//! The route-request capability and its completion channel.
//!
//! # Pluggability
//!
//! The coordinator never computes routes itself.  It hands a
//! [`RouteRequest`] plus a [`CompletionSender`] to a [`RouteRequester`] and
//! moves on.  The requester answers whenever it likes, from any thread, by
//! calling [`CompletionSender::send`].  Two implementations ship here:
//!
//! - [`TokioRequester`] runs an async closure on a tokio runtime.
//! - [`QueuedRequester`] parks requests until the host answers them by hand
//!   (UI event loops, tests, replay tools).

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};

use nav_core::{GeoPoint, RequestSeq, Timestamp};
use nav_route::{RouteGeometry, Waypoint};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::{RerouteCause, RerouteError, RerouteResult};

// ── Request / completion ──────────────────────────────────────────────────────

/// Everything a route service needs to compute a replacement route.
#[derive(Clone, Debug)]
pub struct RouteRequest {
    pub seq:        RequestSeq,
    pub cause:      RerouteCause,
    /// Current idealized (or, when off route, raw) position.
    pub origin:     GeoPoint,
    pub course:     Option<f64>,
    /// Waypoints still to visit, final destination last.
    pub waypoints:  Vec<Waypoint>,
    pub leg_index:  usize,
    pub step_index: usize,
    pub issued_at:  Timestamp,
    /// For proactive requests, the alternative being adopted.  A requester
    /// may return it unchanged or refresh it from `origin`.
    pub alternative: Option<Arc<RouteGeometry>>,
}

/// A route service's answer to one request.
#[derive(Debug)]
pub struct RouteCompletion {
    pub seq:    RequestSeq,
    pub result: RerouteResult<RouteGeometry>,
}

/// One-shot reply handle for a single request.
///
/// Dropping it without calling [`send`](Self::send) answers the request with
/// [`RerouteError::Cancelled`], so the coordinator never waits forever on a
/// requester that lost a request.
#[derive(Debug)]
pub struct CompletionSender {
    seq:  RequestSeq,
    tx:   UnboundedSender<RouteCompletion>,
    sent: bool,
}

impl CompletionSender {
    pub(crate) fn new(seq: RequestSeq, tx: UnboundedSender<RouteCompletion>) -> Self {
        Self { seq, tx, sent: false }
    }

    pub fn seq(&self) -> RequestSeq {
        self.seq
    }

    /// Deliver the answer.  Silently dropped if the coordinator is gone.
    pub fn send(mut self, result: RerouteResult<RouteGeometry>) {
        self.sent = true;
        self.deliver(result);
    }

    fn deliver(&self, result: RerouteResult<RouteGeometry>) {
        if self.tx.send(RouteCompletion { seq: self.seq, result }).is_err() {
            debug!(seq = %self.seq, "completion dropped: coordinator gone");
        }
    }
}

impl Drop for CompletionSender {
    fn drop(&mut self) {
        if !self.sent {
            self.deliver(Err(RerouteError::Cancelled));
        }
    }
}

// ── RouteRequester trait ──────────────────────────────────────────────────────

/// Pluggable route-computation capability.
///
/// `request_route` must not block: it starts the computation and returns.
/// Bounded waits, retries, and deduplication are the implementation's
/// business.
pub trait RouteRequester {
    fn request_route(&self, request: RouteRequest, reply: CompletionSender);
}

impl<Q: RouteRequester + ?Sized> RouteRequester for Box<Q> {
    fn request_route(&self, request: RouteRequest, reply: CompletionSender) {
        (**self).request_route(request, reply)
    }
}

// ── TokioRequester ────────────────────────────────────────────────────────────

/// Runs `compute(request)` as a task on a tokio runtime and sends its output
/// back as the completion.
pub struct TokioRequester<F> {
    handle:  Handle,
    compute: F,
}

impl<F> TokioRequester<F> {
    pub fn new(handle: Handle, compute: F) -> Self {
        Self { handle, compute }
    }
}

impl<F, Fut> RouteRequester for TokioRequester<F>
where
    F: Fn(RouteRequest) -> Fut,
    Fut: Future<Output = RerouteResult<RouteGeometry>> + Send + 'static,
{
    fn request_route(&self, request: RouteRequest, reply: CompletionSender) {
        let fut = (self.compute)(request);
        self.handle.spawn(async move {
            reply.send(fut.await);
        });
    }
}

// ── QueuedRequester ───────────────────────────────────────────────────────────

/// Parks every request in a shared queue for the host to answer later.
///
/// Clones share the queue, so one clone can be moved into the engine while
/// another stays with the host.
#[derive(Clone, Default)]
pub struct QueuedRequester {
    queue: Arc<Mutex<VecDeque<(RouteRequest, CompletionSender)>>>,
}

impl QueuedRequester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest unanswered request, with its reply handle.
    pub fn take(&self) -> Option<(RouteRequest, CompletionSender)> {
        self.lock().pop_front()
    }

    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<(RouteRequest, CompletionSender)>> {
        // A panic while holding the lock cannot leave the deque half-updated.
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RouteRequester for QueuedRequester {
    fn request_route(&self, request: RouteRequest, reply: CompletionSender) {
        self.lock().push_back((request, reply));
    }
}
