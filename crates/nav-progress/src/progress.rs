//! Cumulative progress along one installed route.
//!
//! Progress is a single route-wide offset, `distance_traveled_m`.  Every
//! other field of [`RouteProgress`] is derived from it and the route's
//! precomputed metrics, so the struct can never be internally inconsistent.
//!
//! The offset only moves forward: each on-route match is clamped to
//! `max(previous, new)`, and off-route matches leave it untouched.

use std::sync::Arc;

use nav_core::{ArrivalConfig, RouteId};
use nav_match::MatchResult;
use nav_route::{RouteCursor, RouteGeometry};
use tracing::{debug, info};

/// Snapshot of progress along the active route.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteProgress {
    pub route_id:                     RouteId,
    pub leg_index:                    usize,
    pub step_index:                   usize,
    /// Route-wide distance travelled since the route was installed.
    pub distance_traveled_m:          f64,
    pub distance_remaining_m:         f64,
    pub duration_remaining_secs:      f64,
    /// `distance_traveled_m / total`, in `[0, 1]`.
    pub fraction_traveled:            f64,
    pub leg_distance_traveled_m:      f64,
    pub leg_distance_remaining_m:     f64,
    pub leg_duration_remaining_secs:  f64,
    pub distance_remaining_in_step_m: f64,
    pub step_duration_remaining_secs: f64,
}

impl RouteProgress {
    /// Progress at route-wide offset `distance_m` on `route`.
    pub fn at(route: &RouteGeometry, route_id: RouteId, distance_m: f64) -> Self {
        let total = route.total_distance_m();
        let d = distance_m.clamp(0.0, total);
        let (leg, step) = route.locate(d);
        Self::with_indices(route, route_id, d, leg, step)
    }

    fn with_indices(route: &RouteGeometry, route_id: RouteId, d: f64, leg: usize, step: usize) -> Self {
        let total = route.total_distance_m();
        let leg_start = route.leg_start_m(leg);
        let leg_end = route.leg_end_m(leg);
        Self {
            route_id,
            leg_index: leg,
            step_index: step,
            distance_traveled_m: d,
            distance_remaining_m: (total - d).max(0.0),
            duration_remaining_secs: route.duration_remaining_secs(d),
            fraction_traveled: if total > 0.0 { d / total } else { 1.0 },
            leg_distance_traveled_m: (d - leg_start).max(0.0),
            leg_distance_remaining_m: (leg_end - d).max(0.0),
            leg_duration_remaining_secs: route.leg_duration_remaining_secs(leg, d),
            distance_remaining_in_step_m: (route.step_end_m(leg, step) - d).max(0.0),
            step_duration_remaining_secs: route.step_duration_remaining_secs(d),
        }
    }

    /// Hint for the next nearest-point query.
    pub fn cursor(&self) -> RouteCursor {
        RouteCursor {
            leg_index:        self.leg_index,
            step_index:       self.step_index,
            distance_along_m: self.distance_traveled_m,
        }
    }
}

/// What one match did to progress.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgressUpdate {
    /// `false` when the match was off route and progress stayed frozen.
    pub accepted:     bool,
    pub step_changed: bool,
    pub leg_changed:  bool,
    /// Legs whose waypoint was reached by this update, in order.
    pub arrived_legs: Vec<usize>,
}

/// Owns the installed route and the progress along it.
pub struct ProgressTracker {
    route:    Arc<RouteGeometry>,
    progress: RouteProgress,
    config:   ArrivalConfig,
    /// `arrived[i]` is set once leg `i`'s waypoint has been reported.
    arrived:  Vec<bool>,
}

impl ProgressTracker {
    /// Start at the beginning of `route`.
    pub fn new(route: Arc<RouteGeometry>, route_id: RouteId, config: ArrivalConfig) -> Self {
        let progress = RouteProgress::at(&route, route_id, 0.0);
        let arrived = vec![false; route.leg_count()];
        Self { route, progress, config, arrived }
    }

    pub fn route(&self) -> &Arc<RouteGeometry> {
        &self.route
    }

    pub fn route_id(&self) -> RouteId {
        self.progress.route_id
    }

    pub fn progress(&self) -> &RouteProgress {
        &self.progress
    }

    pub fn has_arrived_at_leg(&self, leg: usize) -> bool {
        self.arrived.get(leg).copied().unwrap_or(false)
    }

    /// `true` once the final waypoint has been reached.
    pub fn has_arrived(&self) -> bool {
        self.arrived.last().copied().unwrap_or(false)
    }

    /// Apply one match.  Off-route matches freeze progress.
    pub fn update(&mut self, m: &MatchResult) -> ProgressUpdate {
        if !m.is_on_route {
            return ProgressUpdate::default();
        }

        let prev = self.progress;
        let d = prev.distance_traveled_m.max(m.distance_along_m);
        self.progress = RouteProgress::at(&self.route, prev.route_id, d);

        let mut update = ProgressUpdate {
            accepted:     true,
            step_changed: (prev.leg_index, prev.step_index)
                != (self.progress.leg_index, self.progress.step_index),
            leg_changed:  prev.leg_index != self.progress.leg_index,
            arrived_legs: Vec::new(),
        };
        if update.step_changed {
            debug!(
                leg = self.progress.leg_index,
                step = self.progress.step_index,
                "step advanced"
            );
        }

        // A sparse update can skip over a whole leg; report each waypoint.
        for leg in prev.leg_index..=self.progress.leg_index {
            let remaining = self.route.leg_end_m(leg) - d;
            if !self.arrived[leg] && remaining <= self.config.arrival_radius_m {
                self.arrived[leg] = true;
                info!(leg, remaining_m = remaining, "arrived at waypoint");
                update.arrived_legs.push(leg);
            }
        }
        update
    }

    /// Jump to the start of the next leg.  Returns `false` on the final leg.
    pub fn advance_leg(&mut self) -> bool {
        let next = self.progress.leg_index + 1;
        if next >= self.route.leg_count() {
            return false;
        }
        let d = self.route.leg_start_m(next).max(self.progress.distance_traveled_m);
        self.arrived[next - 1] = true;
        self.progress = RouteProgress::with_indices(&self.route, self.progress.route_id, d, next, 0);
        info!(leg = next, "advanced to next leg");
        true
    }
}
