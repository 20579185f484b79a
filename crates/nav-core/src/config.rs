//! Guidance policy configuration.
//!
//! Every threshold the engine uses to decide "on route", "departed", "reroute"
//! or "announce" lives here.  None of them is a physical constant; they are
//! tuning knobs with defaults chosen to pass the engine's behavioural tests.
//!
//! With the `serde` feature every section deserializes with
//! `#[serde(default)]`, so a config file only needs the fields it overrides:
//!
//! ```json
//! { "departure": { "window_size": 8 }, "reroute": { "cooldown_secs": 10.0 } }
//! ```

use crate::{NavError, NavResult};

// ── GuidanceConfig ────────────────────────────────────────────────────────────

/// Top-level configuration, one section per engine component.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct GuidanceConfig {
    pub matcher:      MatcherConfig,
    pub departure:    DepartureConfig,
    pub reroute:      RerouteConfig,
    pub instructions: InstructionConfig,
    pub arrival:      ArrivalConfig,
}

impl GuidanceConfig {
    /// Check cross-field consistency.  Called by the engine builder; a config
    /// that fails here is never installed.
    pub fn validate(&self) -> NavResult<()> {
        self.matcher.validate()?;
        self.departure.validate()?;
        // Fixes within the deviation ceiling count as on route, so a lower
        // hard ceiling could never fire.
        ensure(self.departure.hard_ceiling_m >= self.matcher.max_deviation_m, || {
            format!(
                "departure.hard_ceiling_m ({}) must be at least matcher.max_deviation_m ({})",
                self.departure.hard_ceiling_m, self.matcher.max_deviation_m
            )
        })?;
        self.reroute.validate()?;
        self.instructions.validate()?;
        self.arrival.validate()
    }
}

fn ensure(cond: bool, msg: impl FnOnce() -> String) -> NavResult<()> {
    if cond { Ok(()) } else { Err(NavError::Config(msg())) }
}

fn ensure_non_negative(name: &str, value: f64) -> NavResult<()> {
    ensure(value.is_finite() && value >= 0.0, || {
        format!("{name} must be a finite non-negative number, got {value}")
    })
}

// ── LocalityBias ──────────────────────────────────────────────────────────────

/// How strongly nearest-point queries prefer candidates close to the current
/// progress over globally nearer ones.
///
/// A candidate at distance-along `a`, queried with a hint at `h`, is scored
///
/// ```text
/// lateral + backward_weight * max(0, h - a - backtrack_tolerance_m)
///         + forward_weight  * max(0, a - h - forward_window_m)
/// ```
///
/// and the lowest score wins.  Backtracking is penalised hard so a route that
/// revisits an area never makes progress jump backwards.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct LocalityBias {
    pub backtrack_tolerance_m: f64,
    pub backward_weight:       f64,
    pub forward_window_m:      f64,
    pub forward_weight:        f64,
}

impl Default for LocalityBias {
    fn default() -> Self {
        Self {
            backtrack_tolerance_m: 15.0,
            backward_weight:       1.0,
            forward_window_m:      500.0,
            forward_weight:        0.05,
        }
    }
}

impl LocalityBias {
    /// No bias at all: plain globally-nearest matching.
    pub const NONE: LocalityBias = LocalityBias {
        backtrack_tolerance_m: 0.0,
        backward_weight:       0.0,
        forward_window_m:      0.0,
        forward_weight:        0.0,
    };

    /// Score of a candidate `lateral_m` from the fix at `along_m`, given the
    /// previous match at `hint_m`.  Lower is better.
    pub fn score(&self, lateral_m: f64, along_m: f64, hint_m: f64) -> f64 {
        let behind = (hint_m - along_m - self.backtrack_tolerance_m).max(0.0);
        let ahead = (along_m - hint_m - self.forward_window_m).max(0.0);
        lateral_m + self.backward_weight * behind + self.forward_weight * ahead
    }

    fn validate(&self) -> NavResult<()> {
        ensure_non_negative("locality.backtrack_tolerance_m", self.backtrack_tolerance_m)?;
        ensure_non_negative("locality.backward_weight", self.backward_weight)?;
        ensure_non_negative("locality.forward_window_m", self.forward_window_m)?;
        ensure_non_negative("locality.forward_weight", self.forward_weight)
    }
}

// ── MatcherConfig ─────────────────────────────────────────────────────────────

/// Location-to-route matching thresholds.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct MatcherConfig {
    /// Allowed deviation = reported accuracy × this factor, before clamping.
    pub accuracy_multiplier: f64,
    /// Lower clamp of the allowed deviation (metres).
    pub min_deviation_m: f64,
    /// Upper clamp of the allowed deviation (metres).
    pub max_deviation_m: f64,
    /// Accuracy assumed for fixes that report none (metres).
    pub default_accuracy_m: f64,
    /// Accuracy that earns a full accuracy score in the confidence blend.
    pub reference_accuracy_m: f64,
    /// Below this speed (m/s) the course is ignored; stationary fixes have
    /// meaningless headings.
    pub min_moving_speed_mps: f64,
    /// Maximum course vs route-bearing difference still counted as on route.
    pub bearing_tolerance_deg: f64,
    /// Radius around the upcoming maneuver where the tolerance tightens.
    pub maneuver_zone_radius_m: f64,
    /// Factor applied to the allowed deviation inside the maneuver zone.
    pub maneuver_zone_factor: f64,
    /// Radius of the candidate search around the fix (metres).
    pub search_radius_m: f64,
    pub locality: LocalityBias,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            accuracy_multiplier:    1.5,
            min_deviation_m:        25.0,
            max_deviation_m:        100.0,
            default_accuracy_m:     20.0,
            reference_accuracy_m:   10.0,
            min_moving_speed_mps:   2.0,
            bearing_tolerance_deg:  60.0,
            maneuver_zone_radius_m: 40.0,
            maneuver_zone_factor:   0.5,
            search_radius_m:        250.0,
            locality:               LocalityBias::default(),
        }
    }
}

impl MatcherConfig {
    /// Allowed deviation from the route for a fix with `accuracy_m`
    /// (`None` = unreported), optionally inside the maneuver zone.
    pub fn allowed_deviation_m(&self, accuracy_m: Option<f64>, in_maneuver_zone: bool) -> f64 {
        let accuracy = accuracy_m.unwrap_or(self.default_accuracy_m);
        let mut allowed = accuracy * self.accuracy_multiplier;
        if in_maneuver_zone {
            allowed *= self.maneuver_zone_factor;
        }
        allowed.clamp(self.min_deviation_m, self.max_deviation_m)
    }

    fn validate(&self) -> NavResult<()> {
        ensure_non_negative("matcher.accuracy_multiplier", self.accuracy_multiplier)?;
        ensure_non_negative("matcher.min_deviation_m", self.min_deviation_m)?;
        ensure(self.max_deviation_m >= self.min_deviation_m, || {
            format!(
                "matcher.max_deviation_m ({}) must be >= matcher.min_deviation_m ({})",
                self.max_deviation_m, self.min_deviation_m
            )
        })?;
        ensure(self.reference_accuracy_m > 0.0, || {
            "matcher.reference_accuracy_m must be positive".into()
        })?;
        ensure_non_negative("matcher.default_accuracy_m", self.default_accuracy_m)?;
        ensure_non_negative("matcher.min_moving_speed_mps", self.min_moving_speed_mps)?;
        ensure((0.0..=180.0).contains(&self.bearing_tolerance_deg), || {
            format!("matcher.bearing_tolerance_deg must be in [0, 180], got {}", self.bearing_tolerance_deg)
        })?;
        ensure_non_negative("matcher.maneuver_zone_radius_m", self.maneuver_zone_radius_m)?;
        ensure((0.0..=1.0).contains(&self.maneuver_zone_factor), || {
            "matcher.maneuver_zone_factor must be in [0, 1]".into()
        })?;
        ensure(self.search_radius_m >= self.max_deviation_m, || {
            "matcher.search_radius_m must cover matcher.max_deviation_m".into()
        })?;
        self.locality.validate()
    }
}

// ── DepartureConfig ───────────────────────────────────────────────────────────

/// Off-route debounce policy.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct DepartureConfig {
    /// Number of recent match results kept in the sliding window.
    pub window_size: usize,
    /// Consecutive off-route matches that confirm a departure.
    pub min_consecutive_off_route: usize,
    /// Fraction of a full window that must be off route (with the latest
    /// match off route) to confirm a departure.
    pub min_off_route_fraction: f64,
    /// A single match farther than this from the route departs immediately.
    pub hard_ceiling_m: f64,
}

impl Default for DepartureConfig {
    fn default() -> Self {
        Self {
            window_size:               6,
            min_consecutive_off_route: 3,
            min_off_route_fraction:    0.66,
            hard_ceiling_m:            300.0,
        }
    }
}

impl DepartureConfig {
    fn validate(&self) -> NavResult<()> {
        ensure(self.window_size > 0, || "departure.window_size must be > 0".into())?;
        ensure(
            (1..=self.window_size).contains(&self.min_consecutive_off_route),
            || {
                format!(
                    "departure.min_consecutive_off_route must be in 1..={}, got {}",
                    self.window_size, self.min_consecutive_off_route
                )
            },
        )?;
        ensure(
            self.min_off_route_fraction > 0.0 && self.min_off_route_fraction <= 1.0,
            || "departure.min_off_route_fraction must be in (0, 1]".into(),
        )?;
        ensure_non_negative("departure.hard_ceiling_m", self.hard_ceiling_m)
    }
}

// ── RerouteConfig ─────────────────────────────────────────────────────────────

/// Reroute arbitration policy.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct RerouteConfig {
    /// Minimum time between the end of one reroute attempt and the next.
    pub cooldown_secs: f64,
    /// Accept "faster route" offers at all.
    pub proactive_enabled: bool,
    /// A faster route must save at least this fraction of the remaining
    /// duration …
    pub proactive_min_improvement_fraction: f64,
    /// … and at least this many seconds.
    pub proactive_min_improvement_secs: f64,
    /// Ignore offers when less than this much of the route remains.
    pub proactive_min_duration_remaining_secs: f64,
    /// Ignore offers while the next maneuver is closer than this (seconds).
    pub proactive_min_step_duration_remaining_secs: f64,
    /// Minimum interval between two proactive evaluations.
    pub proactive_check_interval_secs: f64,
}

impl Default for RerouteConfig {
    fn default() -> Self {
        Self {
            cooldown_secs:                              5.0,
            proactive_enabled:                          true,
            proactive_min_improvement_fraction:         0.10,
            proactive_min_improvement_secs:             60.0,
            proactive_min_duration_remaining_secs:      600.0,
            proactive_min_step_duration_remaining_secs: 70.0,
            proactive_check_interval_secs:              120.0,
        }
    }
}

impl RerouteConfig {
    fn validate(&self) -> NavResult<()> {
        ensure_non_negative("reroute.cooldown_secs", self.cooldown_secs)?;
        ensure((0.0..1.0).contains(&self.proactive_min_improvement_fraction), || {
            "reroute.proactive_min_improvement_fraction must be in [0, 1)".into()
        })?;
        ensure_non_negative("reroute.proactive_min_improvement_secs", self.proactive_min_improvement_secs)?;
        ensure_non_negative(
            "reroute.proactive_min_duration_remaining_secs",
            self.proactive_min_duration_remaining_secs,
        )?;
        ensure_non_negative(
            "reroute.proactive_min_step_duration_remaining_secs",
            self.proactive_min_step_duration_remaining_secs,
        )?;
        ensure_non_negative("reroute.proactive_check_interval_secs", self.proactive_check_interval_secs)
    }
}

// ── InstructionConfig ─────────────────────────────────────────────────────────

/// Instruction trigger policy.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct InstructionConfig {
    /// Cap on spoken instructions fired in one update.  `None` fires every
    /// crossed trigger (farthest first); `Some(1)` spreads them over ticks.
    pub max_spoken_per_tick: Option<usize>,
    /// Fire the first spoken and visual instruction of a leg's first step
    /// immediately, regardless of distance.
    pub announce_first_on_leg_start: bool,
}

impl InstructionConfig {
    fn validate(&self) -> NavResult<()> {
        ensure(self.max_spoken_per_tick != Some(0), || {
            "instructions.max_spoken_per_tick must be at least 1 when set".into()
        })
    }
}

// ── ArrivalConfig ─────────────────────────────────────────────────────────────

/// Waypoint arrival policy.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct ArrivalConfig {
    /// Remaining leg distance at which the leg's waypoint counts as reached.
    pub arrival_radius_m: f64,
    /// Stop rerouting once the final waypoint has been reached.
    pub prevent_reroute_after_arrival: bool,
}

impl Default for ArrivalConfig {
    fn default() -> Self {
        Self {
            arrival_radius_m:              15.0,
            prevent_reroute_after_arrival: true,
        }
    }
}

impl ArrivalConfig {
    fn validate(&self) -> NavResult<()> {
        ensure_non_negative("arrival.arrival_radius_m", self.arrival_radius_m)
    }
}
