//! Built-in drive used when no route/trace files are given.
//!
//! An L-shaped route through central Madrid: 1.2 km north, then 900 m east.
//! The trace follows it for a while, misses the turn, and keeps going north.

use nav_core::{GeoPoint, Location, Timestamp};
use nav_route::{
    RouteLeg, RouteStep, SpokenInstruction, SpokenInstructionKind, VisualInstruction, Waypoint,
};

const START:     GeoPoint = GeoPoint { lat: 40.4100, lon: -3.7035 };
const SPEED_MPS: f64      = 12.0;

pub fn route() -> Vec<RouteLeg> {
    let corner = START.destination(0.0, 1_200.0);
    let end = corner.destination(90.0, 900.0);

    let north = RouteStep::new(vec![START, START.destination(0.0, 600.0), corner], 1_200.0 / SPEED_MPS)
        .with_name("Calle de Toledo")
        .with_spoken(SpokenInstruction::new(500.0, "In 500 metres, turn right onto Gran Via"))
        .with_spoken(SpokenInstruction::new(100.0, "Turn right onto Gran Via"))
        .with_spoken(
            SpokenInstruction::new(300.0, "Entering low emission zone")
                .with_kind(SpokenInstructionKind::ControlZoneEnter),
        )
        .with_visual(VisualInstruction::new(500.0, "Turn right").with_secondary("Gran Via"));
    let east = RouteStep::new(vec![corner, end], 900.0 / SPEED_MPS)
        .with_name("Gran Via")
        .with_spoken(SpokenInstruction::new(150.0, "Your destination is ahead"));

    vec![RouteLeg::new(vec![north, east], Waypoint::named(end, "Plaza de Cibeles"))]
}

/// One fix per second.  Overshoots the corner by 400 m before turning.
pub fn trace() -> Vec<Location> {
    let mut fixes = Vec::new();
    let mut t = 0.0;
    let mut push = |p: GeoPoint, course: f64| {
        fixes.push(
            Location::new(p, Timestamp(t))
                .with_course(course)
                .with_speed(SPEED_MPS)
                .with_accuracy(8.0),
        );
        t += 1.0;
    };

    let mut along = 0.0;
    while along <= 1_600.0 {
        push(START.destination(0.0, along), 0.0);
        along += SPEED_MPS;
    }
    let overshoot = START.destination(0.0, 1_600.0);
    let mut east = SPEED_MPS;
    while east <= 900.0 {
        push(overshoot.destination(90.0, east), 90.0);
        east += SPEED_MPS;
    }
    fixes
}
