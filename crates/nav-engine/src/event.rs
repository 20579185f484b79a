//! Outward events and the observer that receives them.

use std::fmt;
use std::sync::Arc;

use nav_core::{IdealizedLocation, Location, RouteId};
use nav_progress::RouteProgress;
use nav_reroute::RerouteError;
use nav_route::{RouteGeometry, SpokenInstruction, VisualInstruction, Waypoint};

/// Everything the engine tells the outside world, each with a typed payload.
#[derive(Clone, Debug)]
pub enum GuidanceEvent {
    /// A fix was processed.  `progress` is frozen while off route.
    ProgressDidChange {
        progress:  RouteProgress,
        idealized: IdealizedLocation,
        raw:       Location,
    },
    /// A reactive reroute is about to be requested.
    WillReroute { raw: Location },
    /// A proactive reroute onto `candidate` is about to be requested.
    WillRerouteAlong { candidate: Arc<RouteGeometry> },
    /// A new route was installed; progress restarted at its beginning.
    DidReroute {
        route_id:     RouteId,
        idealized:    IdealizedLocation,
        is_proactive: bool,
    },
    /// The route request failed; guidance continues on the old route.
    DidFailToReroute { error: RerouteError, is_proactive: bool },
    DidPassSpokenInstructionPoint {
        progress:    RouteProgress,
        index:       usize,
        instruction: SpokenInstruction,
    },
    DidPassVisualInstructionPoint {
        progress:    RouteProgress,
        instruction: VisualInstruction,
    },
    DidArriveAtWaypoint { leg_index: usize, waypoint: Waypoint },
}

impl GuidanceEvent {
    /// Stable snake_case name, used as the `kind` column of event logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GuidanceEvent::ProgressDidChange { .. }             => "progress_did_change",
            GuidanceEvent::WillReroute { .. }                   => "will_reroute",
            GuidanceEvent::WillRerouteAlong { .. }              => "will_reroute_along",
            GuidanceEvent::DidReroute { .. }                    => "did_reroute",
            GuidanceEvent::DidFailToReroute { .. }              => "did_fail_to_reroute",
            GuidanceEvent::DidPassSpokenInstructionPoint { .. } => "did_pass_spoken_instruction_point",
            GuidanceEvent::DidPassVisualInstructionPoint { .. } => "did_pass_visual_instruction_point",
            GuidanceEvent::DidArriveAtWaypoint { .. }           => "did_arrive_at_waypoint",
        }
    }
}

impl fmt::Display for GuidanceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuidanceEvent::ProgressDidChange { progress, .. } => write!(
                f,
                "progress leg {} step {} traveled {:.0} m remaining {:.0} m",
                progress.leg_index,
                progress.step_index,
                progress.distance_traveled_m,
                progress.distance_remaining_m
            ),
            GuidanceEvent::WillReroute { raw } => write!(f, "will reroute from {}", raw.point),
            GuidanceEvent::WillRerouteAlong { candidate } => write!(
                f,
                "will reroute along faster route ({:.0} s)",
                candidate.total_duration_secs()
            ),
            GuidanceEvent::DidReroute { route_id, is_proactive, .. } => {
                let kind = if *is_proactive { "proactive" } else { "reactive" };
                write!(f, "did reroute ({kind}) onto {route_id}")
            }
            GuidanceEvent::DidFailToReroute { error, .. } => write!(f, "reroute failed: {error}"),
            GuidanceEvent::DidPassSpokenInstructionPoint { instruction, .. } => {
                write!(f, "say \"{}\"", instruction.text)
            }
            GuidanceEvent::DidPassVisualInstructionPoint { instruction, .. } => {
                write!(f, "show \"{}\"", instruction.primary)
            }
            GuidanceEvent::DidArriveAtWaypoint { leg_index, waypoint } => match &waypoint.name {
                Some(name) => write!(f, "arrived at {name} (leg {leg_index})"),
                None => write!(f, "arrived at {} (leg {leg_index})", waypoint.point),
            },
        }
    }
}

/// Receives engine events, in emission order, on the caller's thread.
///
/// # Example — voice prompter
///
/// ```rust,ignore
/// struct Voice;
///
/// impl GuidanceObserver for Voice {
///     fn on_event(&mut self, event: &GuidanceEvent) {
///         if let GuidanceEvent::DidPassSpokenInstructionPoint { instruction, .. } = event {
///             speak(&instruction.text);
///         }
///     }
/// }
/// ```
pub trait GuidanceObserver {
    fn on_event(&mut self, _event: &GuidanceEvent) {}
}

impl<O: GuidanceObserver + ?Sized> GuidanceObserver for &mut O {
    fn on_event(&mut self, event: &GuidanceEvent) {
        (**self).on_event(event)
    }
}

/// Fan out to two observers, first `A` then `B`.
impl<A: GuidanceObserver, B: GuidanceObserver> GuidanceObserver for (A, B) {
    fn on_event(&mut self, event: &GuidanceEvent) {
        self.0.on_event(event);
        self.1.on_event(event);
    }
}

/// A [`GuidanceObserver`] that does nothing.
pub struct NoopObserver;

impl GuidanceObserver for NoopObserver {}

/// Keeps every event.  Handy in tests and for batch post-processing.
#[derive(Default)]
pub struct EventCollector {
    pub events: Vec<GuidanceEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of collected events of `kind` (see [`GuidanceEvent::kind`]).
    pub fn count(&self, kind: &str) -> usize {
        self.events.iter().filter(|e| e.kind() == kind).count()
    }

    /// Drop and return everything collected so far.
    pub fn drain(&mut self) -> Vec<GuidanceEvent> {
        std::mem::take(&mut self.events)
    }
}

impl GuidanceObserver for EventCollector {
    fn on_event(&mut self, event: &GuidanceEvent) {
        self.events.push(event.clone());
    }
}
