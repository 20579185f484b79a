//! Unit tests for matching and departure detection.

#[cfg(test)]
mod helpers {
    use nav_core::{GeoPoint, Location, Timestamp};
    use nav_route::{RouteBuilder, RouteGeometry, RouteStep};

    pub fn origin() -> GeoPoint {
        GeoPoint::new(52.0, 13.0)
    }

    /// Two 1 km steps due north.
    pub fn route() -> RouteGeometry {
        let a = origin();
        let b = a.destination(0.0, 1_000.0);
        let c = b.destination(0.0, 1_000.0);
        RouteBuilder::new()
            .step(RouteStep::new(vec![a, b], 100.0))
            .step(RouteStep::new(vec![b, c], 100.0))
            .build()
            .unwrap()
    }

    /// A fix `along` metres north of the origin and `east` metres to the side.
    pub fn fix(along: f64, east: f64) -> Location {
        let p = origin().destination(0.0, along).destination(90.0, east);
        Location::new(p, Timestamp(0.0))
    }
}

#[cfg(test)]
mod matcher_tests {
    use nav_core::MatcherConfig;

    use super::helpers::*;
    use crate::LocationMatcher;

    fn matcher() -> LocationMatcher {
        LocationMatcher::new(MatcherConfig::default())
    }

    #[test]
    fn close_fix_is_on_route() {
        let m = matcher().match_location(&fix(500.0, 10.0), None, &route()).unwrap();
        assert!(m.is_on_route);
        assert!((m.distance_from_route_m - 10.0).abs() < 0.5);
        assert!((m.distance_along_m - 500.0).abs() < 1.0);
        assert_eq!(m.allowed_deviation_m, 30.0);
        assert!(!m.in_maneuver_zone);
        assert!(m.confidence > 0.5 && m.confidence <= 1.0);
    }

    #[test]
    fn far_fix_is_off_route() {
        let m = matcher().match_location(&fix(500.0, 50.0), None, &route()).unwrap();
        assert!(!m.is_on_route);
        assert!((m.distance_from_route_m - 50.0).abs() < 0.5);
    }

    #[test]
    fn idealized_follows_raw_off_route() {
        let r = route();
        let on = matcher().match_location(&fix(500.0, 10.0), None, &r).unwrap();
        assert_eq!(on.idealized(), on.snapped);

        let off = matcher().match_location(&fix(500.0, 200.0).with_course(90.0), None, &r).unwrap();
        assert!(!off.is_on_route);
        assert_eq!(off.idealized().point, off.raw.point);
        assert_eq!(off.idealized().course, Some(90.0));
        // The projection itself is still on the route.
        assert!(off.snapped.point.distance_m(origin().destination(0.0, 500.0)) < 1.0);
    }

    #[test]
    fn opposing_course_is_off_route_when_moving() {
        let loc = fix(500.0, 5.0).with_speed(10.0).with_course(180.0);
        let m = matcher().match_location(&loc, None, &route()).unwrap();
        assert!(!m.is_on_route);
        assert!(m.course_deviation_deg.unwrap() > 170.0);
    }

    #[test]
    fn stationary_fix_skips_course() {
        let loc = fix(500.0, 5.0).with_speed(0.5).with_course(180.0);
        let m = matcher().match_location(&loc, None, &route()).unwrap();
        assert!(m.is_on_route);
        assert_eq!(m.course_deviation_deg, None);
    }

    #[test]
    fn maneuver_zone_tightens_tolerance() {
        let r = route();
        let mid = matcher().match_location(&fix(500.0, 27.0), None, &r).unwrap();
        assert!(mid.is_on_route);

        let near_turn = matcher().match_location(&fix(980.0, 27.0), None, &r).unwrap();
        assert!(near_turn.in_maneuver_zone);
        assert_eq!(near_turn.allowed_deviation_m, 25.0);
        assert!(!near_turn.is_on_route);
    }

    #[test]
    fn better_accuracy_means_more_confidence() {
        let r = route();
        let sharp = matcher().match_location(&fix(500.0, 10.0).with_accuracy(5.0), None, &r).unwrap();
        let vague = matcher().match_location(&fix(500.0, 10.0).with_accuracy(50.0), None, &r).unwrap();
        assert!(sharp.confidence > vague.confidence);
    }

    #[test]
    fn snapped_location_carries_route_bearing() {
        let loc = fix(300.0, 4.0).with_speed(12.0).with_course(10.0);
        let m = matcher().match_location(&loc, None, &route()).unwrap();
        assert!(m.snapped.course < 0.5 || m.snapped.course > 359.5);
        assert_eq!(m.snapped.speed, Some(12.0));
        assert_eq!(m.raw, loc);
    }

    #[test]
    fn seeded_noise_stays_on_route() {
        use rand::{Rng, SeedableRng, rngs::SmallRng};

        let r = route();
        let mut rng = SmallRng::seed_from_u64(7);
        for i in 0..190 {
            let along = i as f64 * 10.0;
            let loc = fix(along, rng.gen_range(-8.0..8.0)).with_accuracy(10.0);
            let m = matcher().match_location(&loc, None, &r).unwrap();
            assert!(m.is_on_route, "fix {i} at {along} m went off route");
        }
    }
}

#[cfg(test)]
mod departure_tests {
    use nav_core::DepartureConfig;

    use crate::{DepartureDetector, DepartureSignal};

    fn detector() -> DepartureDetector {
        DepartureDetector::new(DepartureConfig::default())
    }

    #[test]
    fn single_outlier_is_debounced() {
        let mut d = detector();
        let signals: Vec<_> = [true, true, false, true, true, true]
            .iter()
            .map(|&on| d.record(on, if on { 5.0 } else { 150.0 }))
            .collect();
        assert!(!signals.iter().any(|s| s.is_departure_edge()));
        assert!(!d.is_departed());
    }

    #[test]
    fn consecutive_off_route_fires_once() {
        let mut d = detector();
        let signals: Vec<_> = (0..10).map(|_| d.record(false, 60.0)).collect();
        assert_eq!(signals[0], DepartureSignal::Suspect { consecutive_off_route: 1 });
        assert_eq!(signals[2], DepartureSignal::Departed);
        assert_eq!(signals.iter().filter(|s| s.is_departure_edge()).count(), 1);
        assert!(signals[3..].iter().all(|s| *s == DepartureSignal::StillDeparted));
    }

    #[test]
    fn hard_ceiling_departs_immediately() {
        let mut d = detector();
        assert_eq!(d.record(false, 500.0), DepartureSignal::Departed);
    }

    #[test]
    fn recovery_before_threshold_clears_suspicion() {
        let mut d = detector();
        d.record(false, 60.0);
        d.record(false, 60.0);
        assert_eq!(d.record(true, 5.0), DepartureSignal::OnRoute);
        assert_eq!(d.consecutive_off_route(), 0);
        assert!(matches!(d.record(false, 60.0), DepartureSignal::Suspect { .. }));
    }

    #[test]
    fn recovery_after_departure_is_an_edge() {
        let mut d = detector();
        for _ in 0..3 {
            d.record(false, 60.0);
        }
        assert_eq!(d.record(true, 5.0), DepartureSignal::Recovered);
        assert_eq!(d.record(true, 5.0), DepartureSignal::OnRoute);
    }

    #[test]
    fn window_fraction_catches_intermittent_drift() {
        let mut d = detector();
        let pattern = [false, false, true, false, false, true, false];
        let last = pattern.iter().map(|&on| d.record(on, 60.0)).last().unwrap();
        // Final window: off, on, off, off, on, off → 4/6 ≥ 0.66.
        assert_eq!(last, DepartureSignal::Departed);
    }

    #[test]
    fn reset_clears_latch() {
        let mut d = detector();
        d.record(false, 500.0);
        d.reset();
        assert!(!d.is_departed());
        assert_eq!(d.window_len(), 0);
        assert!(matches!(d.record(false, 60.0), DepartureSignal::Suspect { .. }));
    }
}

#[cfg(test)]
mod properties {
    use nav_core::DepartureConfig;
    use proptest::prelude::*;

    use crate::{DepartureDetector, DepartureSignal};

    proptest! {
        /// Departure edges are separated by a recovery: the detector never
        /// fires twice for the same excursion.
        #[test]
        fn departure_is_edge_triggered(samples in prop::collection::vec((any::<bool>(), 0.0f64..400.0), 0..64)) {
            let mut d = DepartureDetector::new(DepartureConfig::default());
            let mut latched = false;
            for (on, dist) in samples {
                match d.record(on, dist) {
                    DepartureSignal::Departed => {
                        prop_assert!(!latched);
                        latched = true;
                    }
                    DepartureSignal::Recovered => {
                        prop_assert!(latched);
                        latched = false;
                    }
                    DepartureSignal::StillDeparted => prop_assert!(latched),
                    DepartureSignal::OnRoute | DepartureSignal::Suspect { .. } => prop_assert!(!latched),
                }
            }
        }
    }
}
