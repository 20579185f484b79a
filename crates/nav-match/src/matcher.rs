//! Projection of raw fixes onto the route, with a confidence score.

use nav_core::{IdealizedLocation, Location, MatcherConfig, bearing_difference};
use nav_route::{RouteCursor, RouteGeometry};

// Confidence blend weights.  Each row sums to 1.
const W_ACCURACY: f64 = 0.25;
const W_DISTANCE: f64 = 0.50;
const W_COURSE: f64 = 0.25;
const W_ACCURACY_NO_COURSE: f64 = 0.35;
const W_DISTANCE_NO_COURSE: f64 = 0.65;

/// Outcome of matching one fix against the active route.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchResult {
    pub raw:                          Location,
    /// Projection onto the route, whether or not the fix is on route.
    pub snapped:                      IdealizedLocation,
    pub distance_from_route_m:        f64,
    pub leg_index:                    usize,
    pub step_index:                   usize,
    /// Route-wide distance along the polyline to the snapped point.
    pub distance_along_m:             f64,
    pub distance_remaining_in_step_m: f64,
    /// Deviation threshold that was applied to this fix.
    pub allowed_deviation_m:          f64,
    /// Course vs route bearing, when the course was evaluated.
    pub course_deviation_deg:         Option<f64>,
    pub in_maneuver_zone:             bool,
    /// 0 (no trust) ..= 1 (certainly on the route here).
    pub confidence:                   f64,
    pub is_on_route:                  bool,
}

impl MatchResult {
    pub fn cursor(&self) -> RouteCursor {
        RouteCursor {
            leg_index:        self.leg_index,
            step_index:       self.step_index,
            distance_along_m: self.distance_along_m,
        }
    }

    /// Where the traveler should be shown: the snapped point while on
    /// route, the raw fix otherwise.
    pub fn idealized(&self) -> IdealizedLocation {
        if self.is_on_route {
            return self.snapped;
        }
        IdealizedLocation {
            point:     self.raw.point,
            course:    self.raw.qualified_course(),
            speed:     self.raw.speed,
            timestamp: self.raw.timestamp,
        }
    }
}

/// Stateless matcher: all policy comes from [`MatcherConfig`].
#[derive(Clone, Debug, Default)]
pub struct LocationMatcher {
    config: MatcherConfig,
}

impl LocationMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Match `location` against `route`, biased towards `hint` (the previous
    /// match on this route, if any).
    ///
    /// Returns `None` only when the fix has no usable coordinates.
    pub fn match_location(
        &self,
        location: &Location,
        hint: Option<RouteCursor>,
        route: &RouteGeometry,
    ) -> Option<MatchResult> {
        let cfg = &self.config;
        let snap = route.nearest_point(location.point, hint, cfg.search_radius_m, &cfg.locality)?;

        let accuracy = location
            .horizontal_accuracy
            .filter(|a| a.is_finite() && *a >= 0.0);
        let in_maneuver_zone = snap.distance_remaining_in_step_m <= cfg.maneuver_zone_radius_m;
        let allowed = cfg.allowed_deviation_m(accuracy, in_maneuver_zone);

        // Stationary fixes have meaningless headings.
        let moving = location
            .speed
            .is_some_and(|s| s.is_finite() && s >= cfg.min_moving_speed_mps);
        let course_deviation_deg = location
            .qualified_course()
            .filter(|_| moving)
            .map(|c| bearing_difference(c, snap.bearing));

        let course_ok = course_deviation_deg.is_none_or(|d| d <= cfg.bearing_tolerance_deg);
        let is_on_route = snap.distance_from_route_m <= allowed && course_ok;

        let acc = accuracy.unwrap_or(cfg.default_accuracy_m);
        let accuracy_score = if acc <= cfg.reference_accuracy_m {
            1.0
        } else {
            cfg.reference_accuracy_m / acc
        };
        let distance_score = (1.0 - snap.distance_from_route_m / allowed).clamp(0.0, 1.0);
        let confidence = match course_deviation_deg {
            Some(d) => {
                let course_score = 1.0 - d / 180.0;
                W_ACCURACY * accuracy_score + W_DISTANCE * distance_score + W_COURSE * course_score
            }
            None => W_ACCURACY_NO_COURSE * accuracy_score + W_DISTANCE_NO_COURSE * distance_score,
        }
        .clamp(0.0, 1.0);

        Some(MatchResult {
            raw: *location,
            snapped: IdealizedLocation {
                point:     snap.point,
                course:    snap.bearing,
                speed:     location.speed,
                timestamp: location.timestamp,
            },
            distance_from_route_m: snap.distance_from_route_m,
            leg_index: snap.leg_index,
            step_index: snap.step_index,
            distance_along_m: snap.distance_along_m,
            distance_remaining_in_step_m: snap.distance_remaining_in_step_m,
            allowed_deviation_m: allowed,
            course_deviation_deg,
            in_maneuver_zone,
            confidence,
            is_on_route,
        })
    }
}
