//! Fluent builder for constructing a [`GuidanceEngine`].

use nav_core::GuidanceConfig;
use nav_reroute::RouteRequester;
use nav_route::{RouteGeometry, RouteLeg};

use crate::{EngineResult, GuidanceEngine};

/// Fluent builder for [`GuidanceEngine<Q>`].
///
/// # Required inputs
///
/// - `Q: RouteRequester` — computes replacement routes (e.g.
///   [`nav_reroute::TokioRequester`])
///
/// # Optional inputs (have defaults)
///
/// | Method          | Default                       |
/// |-----------------|-------------------------------|
/// | `.config(c)`    | `GuidanceConfig::default()`   |
/// | `.route(r)`     | no route; load one later      |
/// | `.legs(v)`      | no route; validated at build  |
///
/// # Example
///
/// ```rust,ignore
/// let mut engine = GuidanceEngineBuilder::new(QueuedRequester::new())
///     .config(config)
///     .route(route)
///     .build()?;
/// engine.update_location(fix, &mut NoopObserver);
/// ```
pub struct GuidanceEngineBuilder<Q: RouteRequester> {
    config:    GuidanceConfig,
    requester: Q,
    route:     Option<RouteGeometry>,
    legs:      Option<Vec<RouteLeg>>,
}

impl<Q: RouteRequester> GuidanceEngineBuilder<Q> {
    pub fn new(requester: Q) -> Self {
        Self {
            config: GuidanceConfig::default(),
            requester,
            route: None,
            legs: None,
        }
    }

    pub fn config(mut self, config: GuidanceConfig) -> Self {
        self.config = config;
        self
    }

    /// Start with an already-validated route.
    pub fn route(mut self, route: RouteGeometry) -> Self {
        self.route = Some(route);
        self.legs = None;
        self
    }

    /// Start with raw legs; they are validated by [`build`](Self::build).
    pub fn legs(mut self, legs: Vec<RouteLeg>) -> Self {
        self.legs = Some(legs);
        self.route = None;
        self
    }

    /// Validate the configuration (and legs, if given) and return a ready
    /// engine.
    pub fn build(self) -> EngineResult<GuidanceEngine<Q>> {
        self.config.validate()?;
        let route = match (self.route, self.legs) {
            (Some(route), _) => Some(route),
            (None, Some(legs)) => Some(RouteGeometry::from_legs(legs)?),
            (None, None) => None,
        };

        let mut engine = GuidanceEngine::new(self.config, self.requester);
        if let Some(route) = route {
            engine.load_route(route);
        }
        Ok(engine)
    }
}
