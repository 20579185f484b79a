//! Plain route data: legs, steps, waypoints, and instructions.
//!
//! These are the values a directions service hands back.  They carry no
//! derived metrics; [`RouteGeometry`][crate::RouteGeometry] validates them
//! and precomputes everything the engine queries.

use nav_core::GeoPoint;

// ── Instructions ──────────────────────────────────────────────────────────────

/// What a spoken instruction announces.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SpokenInstructionKind {
    /// An upcoming maneuver.
    #[default]
    Maneuver,
    /// Entering a zone where driving controls may occur.
    ControlZoneEnter,
    /// Leaving such a zone.
    ControlZoneExit,
}

impl std::fmt::Display for SpokenInstructionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SpokenInstructionKind::Maneuver         => "maneuver",
            SpokenInstructionKind::ControlZoneEnter => "control_zone_enter",
            SpokenInstructionKind::ControlZoneExit  => "control_zone_exit",
        })
    }
}

/// A voice announcement, surfaced when the distance remaining in its step
/// drops to `trigger_distance_m`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpokenInstruction {
    pub trigger_distance_m: f64,
    pub text:               String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ssml:               Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub kind:               SpokenInstructionKind,
}

impl SpokenInstruction {
    pub fn new(trigger_distance_m: f64, text: impl Into<String>) -> Self {
        Self {
            trigger_distance_m,
            text: text.into(),
            ssml: None,
            kind: SpokenInstructionKind::Maneuver,
        }
    }

    pub fn with_kind(mut self, kind: SpokenInstructionKind) -> Self {
        self.kind = kind;
        self
    }
}

/// A banner instruction.  One per step.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisualInstruction {
    pub trigger_distance_m: f64,
    pub primary:            String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub secondary:          Option<String>,
}

impl VisualInstruction {
    pub fn new(trigger_distance_m: f64, primary: impl Into<String>) -> Self {
        Self { trigger_distance_m, primary: primary.into(), secondary: None }
    }

    pub fn with_secondary(mut self, secondary: impl Into<String>) -> Self {
        self.secondary = Some(secondary.into());
        self
    }
}

// ── Steps and legs ────────────────────────────────────────────────────────────

/// One maneuver-to-maneuver stretch of a leg.
///
/// `geometry` runs from this step's maneuver to the next one.  Instruction
/// trigger distances are measured backwards from the end of `geometry`, i.e.
/// against the distance still to travel in this step.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteStep {
    /// Where this step's maneuver takes place (normally `geometry[0]`).
    pub maneuver:      GeoPoint,
    pub geometry:      Vec<GeoPoint>,
    /// Expected travel time for the whole step.
    pub duration_secs: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name:          Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub spoken:        Vec<SpokenInstruction>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub visual:        Option<VisualInstruction>,
}

impl RouteStep {
    /// A step over `geometry` with no instructions.  The maneuver point is the
    /// first vertex (or the origin for an empty polyline, which the geometry
    /// builder rejects anyway).
    pub fn new(geometry: Vec<GeoPoint>, duration_secs: f64) -> Self {
        let maneuver = geometry.first().copied().unwrap_or(GeoPoint::new(0.0, 0.0));
        Self {
            maneuver,
            geometry,
            duration_secs,
            name: None,
            spoken: Vec::new(),
            visual: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_spoken(mut self, instruction: SpokenInstruction) -> Self {
        self.spoken.push(instruction);
        self
    }

    pub fn with_visual(mut self, instruction: VisualInstruction) -> Self {
        self.visual = Some(instruction);
        self
    }

    /// Polyline length in metres.
    pub fn length_m(&self) -> f64 {
        self.geometry.windows(2).map(|w| w[0].distance_m(w[1])).sum()
    }
}

/// A named stop at the end of a leg.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Waypoint {
    pub point: GeoPoint,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name:  Option<String>,
}

impl Waypoint {
    pub fn new(point: GeoPoint) -> Self {
        Self { point, name: None }
    }

    pub fn named(point: GeoPoint, name: impl Into<String>) -> Self {
        Self { point, name: Some(name.into()) }
    }
}

/// The part of a route between two consecutive waypoints.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteLeg {
    pub steps:       Vec<RouteStep>,
    pub destination: Waypoint,
}

impl RouteLeg {
    pub fn new(steps: Vec<RouteStep>, destination: Waypoint) -> Self {
        Self { steps, destination }
    }
}
