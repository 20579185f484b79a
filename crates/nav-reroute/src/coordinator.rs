//! Reroute arbitration.
//!
//! [`RerouteCoordinator`] is the only owner of [`RerouteState`].  Starting a
//! reroute is two-phase so the caller can announce it before the request
//! leaves:
//!
//! 1. [`on_departure`](RerouteCoordinator::on_departure) or
//!    [`offer_proactive`](RerouteCoordinator::offer_proactive) moves `Idle`
//!    to a `Pending*` state;
//! 2. the caller emits its "will reroute" signal, then calls
//!    [`issue`](RerouteCoordinator::issue), which assigns a sequence number,
//!    hands the request to the requester, and moves to `InFlight`.
//!
//! Answers are pulled with [`poll_completion`](RerouteCoordinator::poll_completion)
//! and merged with [`complete`](RerouteCoordinator::complete).  Only the
//! answer whose sequence number matches the in-flight one is accepted;
//! everything else is [`CompletionOutcome::Stale`].

use std::sync::Arc;

use nav_core::{GeoPoint, RequestSeq, RerouteConfig, Timestamp};
use nav_route::{RouteGeometry, Waypoint};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::request::CompletionSender;
use crate::{RerouteCause, RerouteError, RerouteState, RouteCompletion, RouteRequest, RouteRequester};

// ── Decisions and outcomes ────────────────────────────────────────────────────

/// What a departure edge did to the state machine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DepartureDecision {
    /// Now `PendingReactive`: announce, then [`RerouteCoordinator::issue`].
    Begin,
    /// A reactive reroute is already pending or in flight.
    Coalesced,
    /// Cooling down; retried when the cooldown ends if still off route.
    Deferred,
}

/// The per-request data the coordinator cannot know by itself.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub origin:      GeoPoint,
    pub course:      Option<f64>,
    pub waypoints:   Vec<Waypoint>,
    pub leg_index:   usize,
    pub step_index:  usize,
    pub alternative: Option<Arc<RouteGeometry>>,
}

/// Result of merging one completion.
#[derive(Debug)]
pub enum CompletionOutcome {
    /// Install `route`; the state is now `Cooldown`.
    Install { seq: RequestSeq, cause: RerouteCause, route: RouteGeometry },
    /// Keep the current route; the state is now `Cooldown`.
    Failed { seq: RequestSeq, cause: RerouteCause, error: RerouteError },
    /// Superseded or unexpected.  Nothing changed.
    Stale { seq: RequestSeq },
}

/// Inputs to a proactive ("faster route") evaluation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ProactiveOffer {
    pub current_duration_remaining_secs:      f64,
    pub current_step_duration_remaining_secs: f64,
    pub candidate_duration_secs:              f64,
    /// Whether the latest match was on route.
    pub on_route:                             bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProactiveRejection {
    Disabled,
    /// A reroute is pending, in flight, or cooling down.
    Busy,
    OffRoute,
    /// The final waypoint has been reached.
    Arrived,
    /// Evaluated too recently.
    TooSoon,
    RouteNearlyDone,
    ManeuverImminent,
    NotFaster,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProactiveDecision {
    /// Now `PendingProactive`: announce, then [`RerouteCoordinator::issue`].
    Accepted,
    Rejected(ProactiveRejection),
}

// ── RerouteCoordinator ────────────────────────────────────────────────────────

pub struct RerouteCoordinator<Q> {
    config:            RerouteConfig,
    requester:         Q,
    state:             RerouteState,
    next_seq:          RequestSeq,
    tx:                UnboundedSender<RouteCompletion>,
    rx:                UnboundedReceiver<RouteCompletion>,
    /// A reactive reroute is owed once the cooldown ends.
    deferred_reactive: bool,
    last_proactive:    Option<Timestamp>,
}

impl<Q: RouteRequester> RerouteCoordinator<Q> {
    pub fn new(config: RerouteConfig, requester: Q) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            config,
            requester,
            state: RerouteState::Idle,
            next_seq: RequestSeq::FIRST,
            tx,
            rx,
            deferred_reactive: false,
            last_proactive: None,
        }
    }

    pub fn state(&self) -> RerouteState {
        self.state
    }

    pub fn config(&self) -> &RerouteConfig {
        &self.config
    }

    pub fn requester(&self) -> &Q {
        &self.requester
    }

    pub fn has_deferred_reactive(&self) -> bool {
        self.deferred_reactive
    }

    /// Sequence number the next issued request will carry.
    pub fn next_seq(&self) -> RequestSeq {
        self.next_seq
    }

    // ── Triggers ──────────────────────────────────────────────────────────

    /// React to a confirmed departure edge.
    pub fn on_departure(&mut self) -> DepartureDecision {
        match self.state {
            RerouteState::Idle => {
                self.transition(RerouteState::PendingReactive);
                DepartureDecision::Begin
            }
            RerouteState::InFlight { seq, cause: RerouteCause::Proactive } => {
                info!(superseded = %seq, "departure supersedes proactive reroute");
                self.transition(RerouteState::PendingReactive);
                DepartureDecision::Begin
            }
            RerouteState::Cooldown { .. } => {
                debug!("departure during cooldown; deferring");
                self.deferred_reactive = true;
                DepartureDecision::Deferred
            }
            RerouteState::PendingReactive
            | RerouteState::PendingProactive
            | RerouteState::InFlight { .. } => {
                debug!(state = %self.state, "departure coalesced");
                DepartureDecision::Coalesced
            }
        }
    }

    /// Decide whether a known alternative is worth switching to.
    pub fn offer_proactive(&mut self, offer: ProactiveOffer, now: Timestamp) -> ProactiveDecision {
        use ProactiveRejection::*;

        let decision = self.evaluate_proactive(&offer, now);
        match decision {
            Ok(()) => {
                info!(
                    current_secs = offer.current_duration_remaining_secs,
                    candidate_secs = offer.candidate_duration_secs,
                    "faster route accepted"
                );
                self.transition(RerouteState::PendingProactive);
                ProactiveDecision::Accepted
            }
            Err(reason) => {
                if !matches!(reason, Disabled | Busy | OffRoute) {
                    debug!(?reason, "faster route rejected");
                }
                ProactiveDecision::Rejected(reason)
            }
        }
    }

    fn evaluate_proactive(&mut self, offer: &ProactiveOffer, now: Timestamp) -> Result<(), ProactiveRejection> {
        use ProactiveRejection::*;
        let cfg = &self.config;

        if !cfg.proactive_enabled {
            return Err(Disabled);
        }
        if !self.state.is_idle() {
            return Err(Busy);
        }
        if !offer.on_route {
            return Err(OffRoute);
        }
        if let Some(last) = self.last_proactive {
            if now.since(last) < cfg.proactive_check_interval_secs {
                return Err(TooSoon);
            }
        }
        self.last_proactive = Some(now);

        if offer.current_duration_remaining_secs <= cfg.proactive_min_duration_remaining_secs {
            return Err(RouteNearlyDone);
        }
        if offer.current_step_duration_remaining_secs <= cfg.proactive_min_step_duration_remaining_secs {
            return Err(ManeuverImminent);
        }
        let saved = offer.current_duration_remaining_secs - offer.candidate_duration_secs;
        let fraction = saved / offer.current_duration_remaining_secs;
        if saved < cfg.proactive_min_improvement_secs || fraction < cfg.proactive_min_improvement_fraction {
            return Err(NotFaster);
        }
        Ok(())
    }

    /// Send the pending request.  Returns its sequence number, or `None` if
    /// nothing was pending.
    pub fn issue(&mut self, ctx: RequestContext, now: Timestamp) -> Option<RequestSeq> {
        let cause = self.state.pending_cause()?;
        let seq = self.next_seq;
        self.next_seq = seq.next();

        let request = RouteRequest {
            seq,
            cause,
            origin: ctx.origin,
            course: ctx.course,
            waypoints: ctx.waypoints,
            leg_index: ctx.leg_index,
            step_index: ctx.step_index,
            issued_at: now,
            alternative: ctx.alternative,
        };
        self.transition(RerouteState::InFlight { seq, cause });
        info!(%seq, %cause, origin = %request.origin, "route requested");
        self.requester
            .request_route(request, CompletionSender::new(seq, self.tx.clone()));
        Some(seq)
    }

    // ── Completions ───────────────────────────────────────────────────────

    /// Next queued answer, without waiting.
    pub fn poll_completion(&mut self) -> Option<RouteCompletion> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next answer.  For async hosts that want to wake on it.
    pub async fn next_completion(&mut self) -> Option<RouteCompletion> {
        self.rx.recv().await
    }

    /// Merge one answer into the state machine.
    pub fn complete(&mut self, completion: RouteCompletion, now: Timestamp) -> CompletionOutcome {
        let RouteCompletion { seq, result } = completion;
        let cause = match self.state {
            RerouteState::InFlight { seq: current, cause } if current == seq => cause,
            _ => {
                debug!(%seq, state = %self.state, "stale completion discarded");
                return CompletionOutcome::Stale { seq };
            }
        };

        self.transition(RerouteState::Cooldown { until: now + self.config.cooldown_secs });
        match result {
            Ok(route) => {
                info!(%seq, %cause, distance_m = route.total_distance_m(), "reroute succeeded");
                CompletionOutcome::Install { seq, cause, route }
            }
            Err(error) => {
                warn!(%seq, %cause, %error, "reroute failed");
                if cause == RerouteCause::Reactive {
                    self.deferred_reactive = true;
                }
                CompletionOutcome::Failed { seq, cause, error }
            }
        }
    }

    // ── Time ──────────────────────────────────────────────────────────────

    /// Advance time.  Ends an elapsed cooldown; if a reactive reroute was
    /// deferred and the traveler is still off route, moves to
    /// `PendingReactive` and returns `true` (announce, then issue).
    pub fn tick(&mut self, now: Timestamp, off_route: bool) -> bool {
        if let RerouteState::Cooldown { until } = self.state {
            if now >= until {
                self.transition(RerouteState::Idle);
            }
        }
        if self.state.is_idle() && self.deferred_reactive {
            self.deferred_reactive = false;
            if off_route {
                info!("retrying deferred reactive reroute");
                self.transition(RerouteState::PendingReactive);
                return true;
            }
        }
        false
    }

    /// Abandon whatever is pending or in flight (a new route was loaded by
    /// the host).  Late answers become stale.
    pub fn cancel(&mut self) {
        if !self.state.is_idle() {
            info!(state = %self.state, "reroute cancelled");
        }
        self.deferred_reactive = false;
        self.transition(RerouteState::Idle);
    }

    fn transition(&mut self, next: RerouteState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "reroute state");
        }
        self.state = next;
    }
}
