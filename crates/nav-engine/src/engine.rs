//! The guidance engine: one location update at a time.

use std::sync::Arc;

use nav_core::{GuidanceConfig, IdealizedLocation, Location, RouteId, Timestamp};
use nav_match::{DepartureDetector, DepartureSignal, LocationMatcher, MatchResult};
use nav_progress::{
    InstructionCursor, InstructionFire, InstructionScheduler, ProgressTracker, RouteProgress,
};
use nav_reroute::{
    CompletionOutcome, DepartureDecision, ProactiveDecision, ProactiveOffer, ProactiveRejection,
    RequestContext, RerouteCause, RerouteCoordinator, RerouteState, RouteRequester,
};
use nav_route::{RouteGeometry, RouteLeg};
use tracing::{debug, info};

use crate::{EngineError, EngineResult, GuidanceEvent, GuidanceObserver};

/// Everything bound to one installed route.  Replaced as a unit.
struct ActiveRoute {
    tracker:   ProgressTracker,
    scheduler: InstructionScheduler,
}

/// Turn-by-turn guidance over a stream of location fixes.
///
/// Construct with [`GuidanceEngineBuilder`][crate::GuidanceEngineBuilder].
/// Every public method runs to completion before returning; route requests
/// are the only work that happens elsewhere, and their answers are merged at
/// the start of the next call.
pub struct GuidanceEngine<Q: RouteRequester> {
    config:         GuidanceConfig,
    matcher:        LocationMatcher,
    detector:       DepartureDetector,
    coordinator:    RerouteCoordinator<Q>,
    active:         Option<ActiveRoute>,
    next_route_id:  RouteId,
    last_raw:       Option<Location>,
    last_match:     Option<MatchResult>,
    seen_qualified: bool,
    now:            Timestamp,
}

impl<Q: RouteRequester> GuidanceEngine<Q> {
    pub(crate) fn new(config: GuidanceConfig, requester: Q) -> Self {
        Self {
            matcher:        LocationMatcher::new(config.matcher),
            detector:       DepartureDetector::new(config.departure),
            coordinator:    RerouteCoordinator::new(config.reroute, requester),
            config,
            active:         None,
            next_route_id:  RouteId::FIRST,
            last_raw:       None,
            last_match:     None,
            seen_qualified: false,
            now:            Timestamp::ZERO,
        }
    }

    // ── Route loading ─────────────────────────────────────────────────────

    /// Make `route` the active route, abandoning any reroute in progress.
    pub fn load_route(&mut self, route: RouteGeometry) -> RouteId {
        self.coordinator.cancel();
        let id = self.install(Arc::new(route));
        info!(route = %id, "route loaded");
        id
    }

    /// Validate `legs` and load them.  A degenerate route is rejected and the
    /// current route (if any) stays active.
    pub fn load_legs(&mut self, legs: Vec<RouteLeg>) -> EngineResult<RouteId> {
        let route = RouteGeometry::from_legs(legs)?;
        Ok(self.load_route(route))
    }

    /// Swap in `route` together with fresh progress, instruction markers,
    /// and departure history.
    fn install(&mut self, route: Arc<RouteGeometry>) -> RouteId {
        let id = self.next_route_id;
        self.next_route_id = id.next();
        self.active = Some(ActiveRoute {
            tracker:   ProgressTracker::new(route, id, self.config.arrival),
            scheduler: InstructionScheduler::new(self.config.instructions),
        });
        self.detector.reset();
        self.last_match = None;
        id
    }

    // ── Per-fix processing ────────────────────────────────────────────────

    /// Process one location fix.
    ///
    /// Order: merge reroute answers, end cooldown, match, advance progress,
    /// detect departure, arbitrate reroute, schedule instructions, emit.
    pub fn update_location<O: GuidanceObserver>(&mut self, location: Location, observer: &mut O) {
        self.advance_clock(location.timestamp);
        self.drain_completions(observer);

        if location.is_qualified() {
            self.seen_qualified = true;
        } else if self.seen_qualified {
            debug!(point = %location.point, accuracy = ?location.horizontal_accuracy, "unqualified fix discarded");
            return;
        }
        self.last_raw = Some(location);

        if self.active.is_none() {
            return;
        }
        self.end_cooldown(observer);

        let Some(active) = self.active.as_mut() else { return };
        let route = active.tracker.route().clone();
        let hint = Some(active.tracker.progress().cursor());
        let Some(m) = self.matcher.match_location(&location, hint, &route) else {
            debug!("fix could not be matched");
            return;
        };
        self.last_match = Some(m);

        let update = active.tracker.update(&m);
        let progress = *active.tracker.progress();
        let arrived = active.tracker.has_arrived();

        let mut events = Vec::new();
        for leg in update.arrived_legs {
            if let Some(waypoint) = route.waypoint(leg) {
                events.push(GuidanceEvent::DidArriveAtWaypoint { leg_index: leg, waypoint: waypoint.clone() });
            }
        }
        events.push(GuidanceEvent::ProgressDidChange { progress, idealized: m.idealized(), raw: location });
        if update.accepted {
            let fires = active.scheduler.evaluate(&route, &progress);
            events.extend(fires.into_iter().map(|f| instruction_event(f, progress)));
        }

        let signal = self.detector.observe(&m);
        if signal == DepartureSignal::Departed
            && !self.reroutes_suppressed(arrived)
            && self.coordinator.on_departure() == DepartureDecision::Begin
        {
            self.begin_reroute(observer);
        }

        for event in &events {
            observer.on_event(event);
        }
    }

    /// Merge reroute answers and advance time without a location.
    pub fn poll<O: GuidanceObserver>(&mut self, now: Timestamp, observer: &mut O) {
        self.advance_clock(now);
        self.drain_completions(observer);
        if self.active.is_some() {
            self.end_cooldown(observer);
        }
    }

    /// Wait for the in-flight route request, if any, and merge its answer.
    /// Returns `false` when nothing was in flight.
    pub async fn settle_reroute<O: GuidanceObserver>(&mut self, observer: &mut O) -> bool {
        if self.coordinator.state().in_flight_seq().is_none() {
            return false;
        }
        match self.coordinator.next_completion().await {
            Some(completion) => {
                self.merge(completion, observer);
                true
            }
            None => false,
        }
    }

    // ── Proactive rerouting ───────────────────────────────────────────────

    /// Offer a known alternative route.  If it is meaningfully faster and
    /// the engine is idle and on route, a proactive reroute onto it starts.
    pub fn offer_alternative<O: GuidanceObserver>(
        &mut self,
        candidate: RouteGeometry,
        observer: &mut O,
    ) -> EngineResult<ProactiveDecision> {
        self.drain_completions(observer);
        if self.active.is_none() {
            return Err(EngineError::NoActiveRoute);
        }
        self.end_cooldown(observer);
        let active = self.active.as_ref().ok_or(EngineError::NoActiveRoute)?;
        let progress = *active.tracker.progress();
        if self.reroutes_suppressed(active.tracker.has_arrived()) {
            return Ok(ProactiveDecision::Rejected(ProactiveRejection::Arrived));
        }

        let offer = ProactiveOffer {
            current_duration_remaining_secs:      progress.duration_remaining_secs,
            current_step_duration_remaining_secs: progress.step_duration_remaining_secs,
            candidate_duration_secs:              candidate.total_duration_secs(),
            on_route: self.last_match.is_some_and(|m| m.is_on_route) && !self.detector.is_departed(),
        };
        let decision = self.coordinator.offer_proactive(offer, self.now);
        if decision == ProactiveDecision::Accepted {
            let candidate = Arc::new(candidate);
            observer.on_event(&GuidanceEvent::WillRerouteAlong { candidate: candidate.clone() });
            let ctx = self.request_context(Some(candidate));
            self.coordinator.issue(ctx, self.now);
        }
        Ok(decision)
    }

    // ── Manual leg control ────────────────────────────────────────────────

    /// Move to the start of the next leg (e.g. the traveler confirmed the
    /// stop).  Returns `false` on the final leg or without a route.
    pub fn advance_leg<O: GuidanceObserver>(&mut self, observer: &mut O) -> bool {
        let now = self.now;
        let last_raw = self.last_raw;
        let Some(active) = self.active.as_mut() else { return false };
        if !active.tracker.advance_leg() {
            return false;
        }
        self.detector.reset();
        self.last_match = None;

        let route = active.tracker.route().clone();
        let progress = *active.tracker.progress();
        let d = progress.distance_traveled_m;
        let idealized = IdealizedLocation {
            point:     route.point_at(d),
            course:    route.bearing_at(d),
            speed:     None,
            timestamp: now,
        };
        if let Some(raw) = last_raw {
            observer.on_event(&GuidanceEvent::ProgressDidChange { progress, idealized, raw });
        }
        for fire in active.scheduler.evaluate(&route, &progress) {
            observer.on_event(&instruction_event(fire, progress));
        }
        true
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &GuidanceConfig {
        &self.config
    }

    pub fn route(&self) -> Option<&Arc<RouteGeometry>> {
        self.active.as_ref().map(|a| a.tracker.route())
    }

    pub fn route_id(&self) -> Option<RouteId> {
        self.active.as_ref().map(|a| a.tracker.route_id())
    }

    pub fn progress(&self) -> Option<&RouteProgress> {
        self.active.as_ref().map(|a| a.tracker.progress())
    }

    pub fn instruction_cursor(&self) -> Option<&InstructionCursor> {
        self.active.as_ref().map(|a| a.scheduler.cursor())
    }

    pub fn last_match(&self) -> Option<&MatchResult> {
        self.last_match.as_ref()
    }

    pub fn reroute_state(&self) -> RerouteState {
        self.coordinator.state()
    }

    pub fn is_off_route(&self) -> bool {
        self.detector.is_departed()
    }

    pub fn has_arrived(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.tracker.has_arrived())
    }

    pub fn requester(&self) -> &Q {
        self.coordinator.requester()
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn advance_clock(&mut self, t: Timestamp) {
        if t > self.now {
            self.now = t;
        }
    }

    fn reroutes_suppressed(&self, arrived: bool) -> bool {
        arrived && self.config.arrival.prevent_reroute_after_arrival
    }

    fn drain_completions<O: GuidanceObserver>(&mut self, observer: &mut O) {
        while let Some(completion) = self.coordinator.poll_completion() {
            self.merge(completion, observer);
        }
    }

    fn merge<O: GuidanceObserver>(&mut self, completion: nav_reroute::RouteCompletion, observer: &mut O) {
        match self.coordinator.complete(completion, self.now) {
            CompletionOutcome::Install { cause, route, .. } => {
                let route = Arc::new(route);
                let route_id = self.install(route.clone());
                let idealized = self.idealized_on(&route);
                observer.on_event(&GuidanceEvent::DidReroute {
                    route_id,
                    idealized,
                    is_proactive: cause.is_proactive(),
                });
            }
            CompletionOutcome::Failed { cause, error, .. } => {
                observer.on_event(&GuidanceEvent::DidFailToReroute {
                    error,
                    is_proactive: cause.is_proactive(),
                });
            }
            CompletionOutcome::Stale { .. } => {}
        }
    }

    /// The last raw fix projected onto `route`, or the route's start.
    fn idealized_on(&self, route: &RouteGeometry) -> IdealizedLocation {
        let snapped = self.last_raw.and_then(|raw| {
            self.matcher
                .match_location(&raw, None, route)
                .map(|m| m.idealized())
        });
        snapped.unwrap_or(IdealizedLocation {
            point:     route.origin(),
            course:    route.bearing_at(0.0),
            speed:     None,
            timestamp: self.now,
        })
    }

    fn end_cooldown<O: GuidanceObserver>(&mut self, observer: &mut O) {
        let off_route = self.detector.is_departed();
        let arrived = self.has_arrived();
        if self.coordinator.tick(self.now, off_route && !self.reroutes_suppressed(arrived)) {
            self.begin_reroute(observer);
        }
    }

    /// Announce and issue the pending reactive request.
    fn begin_reroute<O: GuidanceObserver>(&mut self, observer: &mut O) {
        debug_assert_eq!(self.coordinator.state().pending_cause(), Some(RerouteCause::Reactive));
        if let Some(raw) = self.last_raw {
            observer.on_event(&GuidanceEvent::WillReroute { raw });
        }
        let ctx = self.request_context(None);
        self.coordinator.issue(ctx, self.now);
    }

    fn request_context(&self, alternative: Option<Arc<RouteGeometry>>) -> RequestContext {
        let (waypoints, leg_index, step_index) = match &self.active {
            Some(a) => {
                let p = a.tracker.progress();
                (a.tracker.route().remaining_waypoints(p.leg_index), p.leg_index, p.step_index)
            }
            None => (Vec::new(), 0, 0),
        };
        // Off route the snapped point lies on the route being left.
        let origin = self
            .last_match
            .map(|m| m.idealized().point)
            .or(self.last_raw.map(|l| l.point))
            .or(self.active.as_ref().map(|a| a.tracker.route().origin()))
            .unwrap_or(nav_core::GeoPoint::new(0.0, 0.0));
        RequestContext {
            origin,
            course: self.last_raw.and_then(|l| l.qualified_course()),
            waypoints,
            leg_index,
            step_index,
            alternative,
        }
    }
}

fn instruction_event(fire: InstructionFire, progress: RouteProgress) -> GuidanceEvent {
    match fire {
        InstructionFire::Spoken { index, instruction, .. } => {
            GuidanceEvent::DidPassSpokenInstructionPoint { progress, index, instruction }
        }
        InstructionFire::Visual { instruction, .. } => {
            GuidanceEvent::DidPassVisualInstructionPoint { progress, instruction }
        }
    }
}
