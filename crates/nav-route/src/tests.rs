//! Unit tests for route construction and queries.

#[cfg(test)]
pub(crate) mod fixtures {
    use nav_core::GeoPoint;

    use crate::{RouteBuilder, RouteGeometry, RouteStep, SpokenInstruction, Waypoint};

    pub fn origin() -> GeoPoint {
        GeoPoint::new(45.0, 5.0)
    }

    /// Two 1 km steps due north, then a single-point arrive step.
    pub fn straight_north() -> RouteGeometry {
        let a = origin();
        let b = a.destination(0.0, 1_000.0);
        let c = b.destination(0.0, 1_000.0);
        RouteBuilder::new()
            .step(
                RouteStep::new(vec![a, b], 100.0)
                    .with_spoken(SpokenInstruction::new(100.0, "turn now"))
                    .with_spoken(SpokenInstruction::new(800.0, "in 800 metres")),
            )
            .step(RouteStep::new(vec![b, c], 50.0))
            .step(RouteStep::new(vec![c], 0.0))
            .end_leg(Waypoint::named(c, "end"))
            .build()
            .unwrap()
    }

    /// North 1 km, 10 m east, then back south on a parallel line.
    pub fn out_and_back() -> RouteGeometry {
        let a = origin();
        let b = a.destination(0.0, 1_000.0);
        let b2 = b.destination(90.0, 10.0);
        let a2 = a.destination(90.0, 10.0);
        RouteBuilder::new()
            .step(RouteStep::new(vec![a, b], 100.0))
            .step(RouteStep::new(vec![b, b2], 5.0))
            .step(RouteStep::new(vec![b2, a2], 100.0))
            .build()
            .unwrap()
    }
}

#[cfg(test)]
mod construction {
    use nav_core::GeoPoint;

    use super::fixtures::*;
    use crate::{
        MAX_SPOKEN_PER_STEP, RouteBuilder, RouteError, RouteGeometry, RouteLeg, RouteStep,
        SpokenInstruction, Waypoint,
    };

    #[test]
    fn empty_route_is_degenerate() {
        assert!(matches!(RouteGeometry::from_legs(vec![]), Err(RouteError::Degenerate(_))));
        let leg = RouteLeg::new(vec![], Waypoint::new(origin()));
        assert!(matches!(RouteGeometry::from_legs(vec![leg]), Err(RouteError::Degenerate(_))));
    }

    #[test]
    fn zero_length_is_degenerate() {
        let r = RouteBuilder::new()
            .step(RouteStep::new(vec![origin(), origin()], 10.0))
            .build();
        assert!(matches!(r, Err(RouteError::Degenerate(_))));
    }

    #[test]
    fn invalid_coordinate_is_degenerate() {
        let r = RouteBuilder::new()
            .step(RouteStep::new(vec![origin(), GeoPoint::new(f64::NAN, 5.0)], 10.0))
            .build();
        assert!(matches!(r, Err(RouteError::Degenerate(_))));
    }

    #[test]
    fn negative_trigger_is_degenerate() {
        let b = origin().destination(0.0, 100.0);
        let r = RouteBuilder::new()
            .step(RouteStep::new(vec![origin(), b], 10.0).with_spoken(SpokenInstruction::new(-1.0, "x")))
            .build();
        assert!(matches!(r, Err(RouteError::Degenerate(_))));
    }

    #[test]
    fn too_many_spoken_instructions() {
        let b = origin().destination(0.0, 100.0);
        let mut step = RouteStep::new(vec![origin(), b], 10.0);
        for i in 0..=MAX_SPOKEN_PER_STEP {
            step = step.with_spoken(SpokenInstruction::new(i as f64, format!("#{i}")));
        }
        let r = RouteBuilder::new().step(step).build();
        assert!(matches!(r, Err(RouteError::TooManyInstructions { count: 65, .. })));
    }

    #[test]
    fn spoken_sorted_farthest_first() {
        let route = straight_north();
        let triggers: Vec<f64> =
            route.step(0, 0).unwrap().spoken.iter().map(|s| s.trigger_distance_m).collect();
        assert_eq!(triggers, vec![800.0, 100.0]);
    }

    #[test]
    fn trailing_steps_form_final_leg() {
        let route = out_and_back();
        assert_eq!(route.leg_count(), 1);
        assert_eq!(route.step_count(0), 3);
        assert!(route.final_destination().point.distance_m(origin()) < 11.0);
    }
}

#[cfg(test)]
mod metrics {
    use super::fixtures::*;

    #[test]
    fn offsets_accumulate() {
        let route = straight_north();
        assert!((route.total_distance_m() - 2_000.0).abs() < 1.0);
        assert!((route.step_start_m(0, 1) - 1_000.0).abs() < 1.0);
        assert!((route.step_end_m(0, 1) - 2_000.0).abs() < 1.0);
        assert_eq!(route.leg_start_m(0), 0.0);
        assert_eq!(route.leg_end_m(0), route.total_distance_m());
        assert_eq!(route.total_duration_secs(), 150.0);
    }

    #[test]
    fn locate_boundaries_belong_to_later_step() {
        let route = straight_north();
        let boundary = route.step_start_m(0, 1);
        assert_eq!(route.locate(0.0), (0, 0));
        assert_eq!(route.locate(boundary - 0.5), (0, 0));
        assert_eq!(route.locate(boundary), (0, 1));
        // The zero-length arrive step is reached only at the very end.
        assert_eq!(route.locate(route.total_distance_m()), (0, 2));
        assert_eq!(route.locate(-5.0), (0, 0));
    }

    #[test]
    fn duration_interpolates_within_step() {
        let route = straight_north();
        let half = route.step_end_m(0, 0) / 2.0;
        assert!((route.duration_remaining_secs(0.0) - 150.0).abs() < 1e-6);
        assert!((route.duration_remaining_secs(half) - 100.0).abs() < 1e-6);
        assert!((route.step_duration_remaining_secs(half) - 50.0).abs() < 1e-6);
        assert_eq!(route.duration_remaining_secs(route.total_distance_m()), 0.0);
    }

    #[test]
    fn point_and_bearing_at_offset() {
        let route = straight_north();
        let p = route.point_at(500.0);
        assert!((p.distance_m(origin()) - 500.0).abs() < 1.0);
        assert!(route.bearing_at(500.0) < 0.1 || route.bearing_at(500.0) > 359.9);
    }
}

#[cfg(test)]
mod nearest {
    use nav_core::{GeoPoint, LocalityBias};

    use super::fixtures::*;
    use crate::RouteCursor;

    #[test]
    fn lateral_offset_is_measured() {
        let route = straight_north();
        let p = origin().destination(0.0, 400.0).destination(90.0, 20.0);
        let snap = route.nearest_point(p, None, 250.0, &LocalityBias::default()).unwrap();
        assert!((snap.distance_from_route_m - 20.0).abs() < 0.5);
        assert!((snap.distance_along_m - 400.0).abs() < 1.0);
        assert_eq!((snap.leg_index, snap.step_index), (0, 0));
        assert!((snap.distance_remaining_in_step_m - 600.0).abs() < 1.0);
    }

    #[test]
    fn falls_back_to_nearest_outside_radius() {
        let route = straight_north();
        let p = origin().destination(90.0, 1_000.0);
        let snap = route.nearest_point(p, None, 250.0, &LocalityBias::default()).unwrap();
        assert!((snap.distance_from_route_m - 1_000.0).abs() < 2.0);
    }

    #[test]
    fn invalid_point_has_no_snap() {
        let route = straight_north();
        let p = GeoPoint::new(f64::NAN, 0.0);
        assert!(route.nearest_point(p, None, 250.0, &LocalityBias::default()).is_none());
    }

    #[test]
    fn locality_prefers_the_current_pass() {
        let route = out_and_back();
        // 3 m east of the outbound line, 7 m west of the return line.
        let p = origin().destination(0.0, 300.0).destination(90.0, 3.0);
        let bias = LocalityBias::default();

        let outbound = RouteCursor { leg_index: 0, step_index: 0, distance_along_m: 290.0 };
        let snap = route.nearest_point(p, Some(outbound), 250.0, &bias).unwrap();
        assert_eq!(snap.step_index, 0);

        let inbound = RouteCursor { leg_index: 0, step_index: 2, distance_along_m: 1_700.0 };
        let snap = route.nearest_point(p, Some(inbound), 250.0, &bias).unwrap();
        assert_eq!(snap.step_index, 2);
        assert!((snap.distance_along_m - 1_710.0).abs() < 2.0);

        // Without bias the geometrically nearest line wins.
        let snap = route.nearest_point(p, Some(inbound), 250.0, &LocalityBias::NONE).unwrap();
        assert_eq!(snap.step_index, 0);
    }
}

#[cfg(test)]
mod properties {
    use proptest::prelude::*;

    use super::fixtures::*;

    proptest! {
        #[test]
        fn duration_remaining_is_non_increasing(a in 0.0f64..2_000.0, b in 0.0f64..2_000.0) {
            let route = straight_north();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(route.duration_remaining_secs(hi) <= route.duration_remaining_secs(lo) + 1e-9);
        }
    }
}
