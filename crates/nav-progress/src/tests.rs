//! Unit tests for progress tracking and instruction scheduling.

#[cfg(test)]
mod helpers {
    use std::sync::Arc;

    use nav_core::{ArrivalConfig, GeoPoint, IdealizedLocation, Location, RouteId, Timestamp};
    use nav_match::MatchResult;
    use nav_route::{
        RouteBuilder, RouteGeometry, RouteStep, SpokenInstruction, VisualInstruction, Waypoint,
    };

    use crate::ProgressTracker;

    pub fn origin() -> GeoPoint {
        GeoPoint::new(40.0, -3.7)
    }

    /// Two legs due north.
    ///
    /// Leg 0: step 0 (1000 m, spoken at 300/150/50 m, visual at 150 m),
    /// step 1 (500 m).  Leg 1: step 0 (1000 m).
    pub fn two_leg_route() -> Arc<RouteGeometry> {
        let a = origin();
        let b = a.destination(0.0, 1_000.0);
        let c = b.destination(0.0, 500.0);
        let d = c.destination(0.0, 1_000.0);
        let first = RouteStep::new(vec![a, b], 100.0)
            .with_spoken(SpokenInstruction::new(50.0, "turn left now"))
            .with_spoken(SpokenInstruction::new(300.0, "in 300 metres turn left"))
            .with_spoken(SpokenInstruction::new(150.0, "in 150 metres turn left"))
            .with_visual(VisualInstruction::new(150.0, "Turn left"));
        let route = RouteBuilder::new()
            .step(first)
            .step(RouteStep::new(vec![b, c], 50.0))
            .end_leg(Waypoint::named(c, "stop"))
            .step(RouteStep::new(vec![c, d], 100.0).with_spoken(SpokenInstruction::new(900.0, "continue")))
            .end_leg(Waypoint::named(d, "home"))
            .build()
            .unwrap();
        Arc::new(route)
    }

    pub fn tracker() -> ProgressTracker {
        ProgressTracker::new(two_leg_route(), RouteId(1), ArrivalConfig::default())
    }

    /// A match at route-wide offset `along`.
    pub fn matched(route: &RouteGeometry, along: f64, on_route: bool) -> MatchResult {
        let (leg, step) = route.locate(along);
        let point = route.point_at(along);
        MatchResult {
            raw: Location::new(point, Timestamp(0.0)),
            snapped: IdealizedLocation {
                point,
                course: route.bearing_at(along),
                speed: None,
                timestamp: Timestamp(0.0),
            },
            distance_from_route_m: if on_route { 3.0 } else { 80.0 },
            leg_index: leg,
            step_index: step,
            distance_along_m: along,
            distance_remaining_in_step_m: route.step_end_m(leg, step) - along,
            allowed_deviation_m: 30.0,
            course_deviation_deg: None,
            in_maneuver_zone: false,
            confidence: if on_route { 0.9 } else { 0.1 },
            is_on_route: on_route,
        }
    }
}

#[cfg(test)]
mod progress_tests {
    use super::helpers::*;
    use crate::RouteProgress;

    #[test]
    fn starts_at_zero() {
        let t = tracker();
        let p = t.progress();
        assert_eq!((p.leg_index, p.step_index), (0, 0));
        assert_eq!(p.distance_traveled_m, 0.0);
        assert!((p.distance_remaining_m - 2_500.0).abs() < 1.0);
        assert_eq!(p.duration_remaining_secs, 250.0);
        assert_eq!(p.fraction_traveled, 0.0);
    }

    #[test]
    fn jitter_never_regresses_progress() {
        let mut t = tracker();
        let route = t.route().clone();
        for (along, expect) in [(100.0, 100.0), (90.0, 100.0), (150.0, 150.0), (149.0, 150.0)] {
            let u = t.update(&matched(&route, along, true));
            assert!(u.accepted);
            assert_eq!(t.progress().distance_traveled_m, expect);
        }
    }

    #[test]
    fn off_route_freezes_progress() {
        let mut t = tracker();
        let route = t.route().clone();
        t.update(&matched(&route, 200.0, true));
        let before = *t.progress();
        let u = t.update(&matched(&route, 600.0, false));
        assert!(!u.accepted);
        assert_eq!(*t.progress(), before);
    }

    #[test]
    fn crossing_step_boundary_advances_step() {
        let mut t = tracker();
        let route = t.route().clone();
        t.update(&matched(&route, 990.0, true));
        let u = t.update(&matched(&route, 1_010.0, true));
        assert!(u.step_changed && !u.leg_changed);
        assert_eq!((t.progress().leg_index, t.progress().step_index), (0, 1));
        assert!((t.progress().distance_remaining_in_step_m - 490.0).abs() < 1.0);
    }

    #[test]
    fn arrival_fires_once_per_leg() {
        let mut t = tracker();
        let route = t.route().clone();
        let leg_end = route.leg_end_m(0);
        let u = t.update(&matched(&route, leg_end - 10.0, true));
        assert_eq!(u.arrived_legs, vec![0]);
        let u = t.update(&matched(&route, leg_end - 5.0, true));
        assert!(u.arrived_legs.is_empty());
        assert!(t.has_arrived_at_leg(0));
        assert!(!t.has_arrived());

        let u = t.update(&matched(&route, route.total_distance_m(), true));
        assert_eq!(u.arrived_legs, vec![1]);
        assert!(t.has_arrived());
    }

    #[test]
    fn sparse_update_reports_skipped_waypoint() {
        let mut t = tracker();
        let route = t.route().clone();
        let u = t.update(&matched(&route, route.leg_start_m(1) + 300.0, true));
        assert!(u.leg_changed);
        assert_eq!(u.arrived_legs, vec![0]);
    }

    #[test]
    fn advance_leg_moves_to_next_leg_start() {
        let mut t = tracker();
        let route = t.route().clone();
        assert!(t.advance_leg());
        let p = t.progress();
        assert_eq!((p.leg_index, p.step_index), (1, 0));
        assert_eq!(p.distance_traveled_m, route.leg_start_m(1));
        assert_eq!(p.leg_distance_traveled_m, 0.0);
        assert!(!t.advance_leg());
    }

    #[test]
    fn leg_metrics_are_relative_to_the_leg() {
        let route = two_leg_route();
        let p = RouteProgress::at(&route, nav_core::RouteId(1), route.leg_start_m(1) + 250.0);
        assert_eq!(p.leg_index, 1);
        assert!((p.leg_distance_traveled_m - 250.0).abs() < 1e-6);
        assert!((p.leg_distance_remaining_m - 750.0).abs() < 1.0);
        assert!((p.leg_duration_remaining_secs - 75.0).abs() < 0.5);
    }
}

#[cfg(test)]
mod instruction_tests {
    use nav_core::{InstructionConfig, RouteId};

    use super::helpers::*;
    use crate::{InstructionFire, InstructionScheduler, RouteProgress};

    /// Progress with `remaining` metres left in leg 0, step 0.
    fn at_remaining(remaining: f64) -> RouteProgress {
        let route = two_leg_route();
        RouteProgress::at(&route, RouteId(1), route.step_end_m(0, 0) - remaining)
    }

    fn spoken_triggers(fires: &[InstructionFire]) -> Vec<f64> {
        fires
            .iter()
            .filter_map(|f| match f {
                InstructionFire::Spoken { instruction, .. } => Some(instruction.trigger_distance_m),
                _ => None,
            })
            .collect()
    }

    fn visual_count(fires: &[InstructionFire]) -> usize {
        fires.iter().filter(|f| matches!(f, InstructionFire::Visual { .. })).count()
    }

    #[test]
    fn sequence_320_280_100_40() {
        let route = two_leg_route();
        let mut s = InstructionScheduler::new(InstructionConfig::default());

        let f = s.evaluate(&route, &at_remaining(320.0));
        assert!(f.is_empty());

        let f = s.evaluate(&route, &at_remaining(280.0));
        assert_eq!(spoken_triggers(&f), vec![300.0]);
        assert_eq!(visual_count(&f), 0);

        let f = s.evaluate(&route, &at_remaining(100.0));
        assert_eq!(spoken_triggers(&f), vec![150.0]);
        assert_eq!(visual_count(&f), 1);

        let f = s.evaluate(&route, &at_remaining(40.0));
        assert_eq!(spoken_triggers(&f), vec![50.0]);
        assert_eq!(visual_count(&f), 0);

        assert!(s.evaluate(&route, &at_remaining(10.0)).is_empty());
    }

    #[test]
    fn three_thresholds_in_one_tick_fire_in_order() {
        let route = two_leg_route();
        let mut s = InstructionScheduler::new(InstructionConfig::default());
        s.evaluate(&route, &at_remaining(320.0));
        let f = s.evaluate(&route, &at_remaining(40.0));
        assert_eq!(spoken_triggers(&f), vec![300.0, 150.0, 50.0]);
        assert_eq!(visual_count(&f), 1);
    }

    #[test]
    fn per_tick_cap_spreads_fires_over_ticks() {
        let route = two_leg_route();
        let config = InstructionConfig { max_spoken_per_tick: Some(1), ..Default::default() };
        let mut s = InstructionScheduler::new(config);
        let mut order = Vec::new();
        for _ in 0..4 {
            order.extend(spoken_triggers(&s.evaluate(&route, &at_remaining(40.0))));
        }
        assert_eq!(order, vec![300.0, 150.0, 50.0]);
    }

    #[test]
    fn step_change_resets_cursor() {
        let route = two_leg_route();
        let mut s = InstructionScheduler::new(InstructionConfig::default());
        s.evaluate(&route, &at_remaining(40.0));
        assert!(!s.cursor().is_clear());

        let next_step = RouteProgress::at(&route, RouteId(1), route.step_start_m(0, 1) + 10.0);
        assert!(s.evaluate(&route, &next_step).is_empty());
        assert_eq!((s.cursor().leg_index, s.cursor().step_index), (0, 1));
        assert!(s.cursor().is_clear());
    }

    #[test]
    fn reset_clears_all_markers() {
        let route = two_leg_route();
        let mut s = InstructionScheduler::new(InstructionConfig::default());
        s.evaluate(&route, &at_remaining(40.0));
        s.reset();
        assert!(s.cursor().is_clear());
        assert_eq!((s.cursor().leg_index, s.cursor().step_index), (0, 0));
    }

    #[test]
    fn announce_first_on_leg_start() {
        let route = two_leg_route();
        let config = InstructionConfig { announce_first_on_leg_start: true, ..Default::default() };
        let mut s = InstructionScheduler::new(config);
        let f = s.evaluate(&route, &at_remaining(1_000.0));
        assert_eq!(spoken_triggers(&f), vec![300.0]);
        assert_eq!(visual_count(&f), 1);
        // The rest still wait for their distances.
        assert!(s.evaluate(&route, &at_remaining(200.0)).is_empty());
    }
}

#[cfg(test)]
mod properties {
    use nav_core::{InstructionConfig, RouteId};
    use proptest::prelude::*;

    use super::helpers::*;
    use crate::{InstructionFire, InstructionScheduler, RouteProgress};

    proptest! {
        #[test]
        fn traveled_is_non_decreasing(
            updates in prop::collection::vec((0.0f64..2_500.0, any::<bool>()), 1..50)
        ) {
            let mut t = tracker();
            let route = t.route().clone();
            let mut last = t.progress().distance_traveled_m;
            let mut last_idx = (0, 0);
            for (along, on) in updates {
                t.update(&matched(&route, along, on));
                let p = t.progress();
                prop_assert!(p.distance_traveled_m >= last);
                prop_assert!((p.leg_index, p.step_index) >= last_idx);
                last = p.distance_traveled_m;
                last_idx = (p.leg_index, p.step_index);
            }
        }

        #[test]
        fn spoken_fire_once_in_descending_order(
            remaining in prop::collection::vec(0.0f64..1_000.0, 1..20)
        ) {
            let route = two_leg_route();
            let mut s = InstructionScheduler::new(InstructionConfig::default());
            let mut sorted = remaining;
            sorted.sort_by(|a, b| b.total_cmp(a));

            let mut fired = Vec::new();
            for r in sorted {
                let p = RouteProgress::at(&route, RouteId(1), route.step_end_m(0, 0) - r);
                for f in s.evaluate(&route, &p) {
                    if let InstructionFire::Spoken { instruction, .. } = f {
                        fired.push(instruction.trigger_distance_m);
                    }
                }
            }
            let mut expected = fired.clone();
            expected.sort_by(|a, b| b.total_cmp(a));
            expected.dedup();
            prop_assert_eq!(fired, expected);
        }
    }
}
