//! The reroute state machine's states.

use std::fmt;

use nav_core::{RequestSeq, Timestamp};

/// What started a reroute.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RerouteCause {
    /// The traveler left the route.
    Reactive,
    /// A faster alternative was found while on route.
    Proactive,
}

impl RerouteCause {
    pub fn is_proactive(self) -> bool {
        self == RerouteCause::Proactive
    }
}

impl fmt::Display for RerouteCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RerouteCause::Reactive  => "reactive",
            RerouteCause::Proactive => "proactive",
        })
    }
}

/// ```text
/// Idle ──departed──▶ PendingReactive ──issue──▶ InFlight ──done──▶ Cooldown ──elapsed──▶ Idle
///   └──faster──▶ PendingProactive ──issue──┘
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum RerouteState {
    #[default]
    Idle,
    PendingReactive,
    PendingProactive,
    InFlight { seq: RequestSeq, cause: RerouteCause },
    Cooldown { until: Timestamp },
}

impl RerouteState {
    pub fn is_idle(&self) -> bool {
        matches!(self, RerouteState::Idle)
    }

    pub fn in_flight_seq(&self) -> Option<RequestSeq> {
        match self {
            RerouteState::InFlight { seq, .. } => Some(*seq),
            _ => None,
        }
    }

    pub fn pending_cause(&self) -> Option<RerouteCause> {
        match self {
            RerouteState::PendingReactive  => Some(RerouteCause::Reactive),
            RerouteState::PendingProactive => Some(RerouteCause::Proactive),
            _ => None,
        }
    }
}

impl fmt::Display for RerouteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RerouteState::Idle                    => f.write_str("idle"),
            RerouteState::PendingReactive         => f.write_str("pending(reactive)"),
            RerouteState::PendingProactive        => f.write_str("pending(proactive)"),
            RerouteState::InFlight { seq, cause } => write!(f, "in_flight({cause}, {seq})"),
            RerouteState::Cooldown { until }      => write!(f, "cooldown(until {until})"),
        }
    }
}
