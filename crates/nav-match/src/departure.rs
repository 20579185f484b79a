//! Debounced off-route detection.
//!
//! The detector keeps the last `window_size` match outcomes and confirms a
//! departure when any one of these holds:
//!
//! 1. the latest fix is farther from the route than `hard_ceiling_m`;
//! 2. the last `min_consecutive_off_route` fixes were all off route;
//! 3. the window is full, the latest fix is off route, and at least
//!    `min_off_route_fraction` of the window is off route.
//!
//! Confirmation is reported once, as [`DepartureSignal::Departed`].  The
//! detector then stays latched (`StillDeparted`) until an on-route fix
//! (`Recovered`) or [`DepartureDetector::reset`] on a route swap.

use std::collections::VecDeque;

use nav_core::DepartureConfig;
use tracing::{debug, info};

use crate::MatchResult;

/// What a single observation meant for the departure decision.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DepartureSignal {
    /// On route, and no departure was latched.
    OnRoute,
    /// Off route but not (yet) confirmed.
    Suspect { consecutive_off_route: usize },
    /// Edge: departure confirmed by this observation.
    Departed,
    /// Off route while a departure is already latched.
    StillDeparted,
    /// Edge: first on-route observation after a latched departure.
    Recovered,
}

impl DepartureSignal {
    /// `true` only for the rising edge.
    pub fn is_departure_edge(self) -> bool {
        matches!(self, DepartureSignal::Departed)
    }
}

#[derive(Copy, Clone, Debug)]
struct Sample {
    on_route:   bool,
    distance_m: f64,
}

#[derive(Clone, Debug)]
pub struct DepartureDetector {
    config:      DepartureConfig,
    window:      VecDeque<Sample>,
    consecutive: usize,
    departed:    bool,
}

impl DepartureDetector {
    pub fn new(config: DepartureConfig) -> Self {
        Self {
            window: VecDeque::with_capacity(config.window_size),
            config,
            consecutive: 0,
            departed: false,
        }
    }

    pub fn observe(&mut self, m: &MatchResult) -> DepartureSignal {
        self.record(m.is_on_route, m.distance_from_route_m)
    }

    /// Feed one outcome directly.
    pub fn record(&mut self, is_on_route: bool, distance_from_route_m: f64) -> DepartureSignal {
        if self.window.len() == self.config.window_size {
            self.window.pop_front();
        }
        self.window.push_back(Sample { on_route: is_on_route, distance_m: distance_from_route_m });

        if is_on_route {
            self.consecutive = 0;
            if self.departed {
                self.departed = false;
                info!(distance_m = distance_from_route_m, "back on route");
                return DepartureSignal::Recovered;
            }
            return DepartureSignal::OnRoute;
        }

        self.consecutive += 1;
        if self.departed {
            return DepartureSignal::StillDeparted;
        }

        if let Some(rule) = self.confirming_rule() {
            self.departed = true;
            info!(
                rule,
                distance_m = distance_from_route_m,
                consecutive = self.consecutive,
                off_in_window = self.off_route_count(),
                "departure confirmed"
            );
            return DepartureSignal::Departed;
        }

        debug!(consecutive = self.consecutive, distance_m = distance_from_route_m, "off-route suspect");
        DepartureSignal::Suspect { consecutive_off_route: self.consecutive }
    }

    fn confirming_rule(&self) -> Option<&'static str> {
        let latest = self.window.back()?;
        if latest.distance_m > self.config.hard_ceiling_m {
            return Some("hard_ceiling");
        }
        if self.consecutive >= self.config.min_consecutive_off_route {
            return Some("consecutive");
        }
        if self.window.len() == self.config.window_size {
            let fraction = self.off_route_count() as f64 / self.window.len() as f64;
            if fraction >= self.config.min_off_route_fraction {
                return Some("window_fraction");
            }
        }
        None
    }

    /// Forget all history.  Called when a new route is installed.
    pub fn reset(&mut self) {
        self.window.clear();
        self.consecutive = 0;
        self.departed = false;
    }

    pub fn is_departed(&self) -> bool {
        self.departed
    }

    pub fn consecutive_off_route(&self) -> usize {
        self.consecutive
    }

    pub fn off_route_count(&self) -> usize {
        self.window.iter().filter(|s| !s.on_route).count()
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }
}
