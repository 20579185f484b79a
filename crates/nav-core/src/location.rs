//! Raw and idealized locations.
//!
//! A [`Location`] is exactly what the sensor stack reported.  An
//! [`IdealizedLocation`] is a fix projected onto the active route.  They are
//! separate types so a snapped position can never be passed where a raw fix
//! is expected, or the other way round.

use crate::{GeoPoint, Timestamp};

/// A raw location fix.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub point: GeoPoint,
    /// Direction of travel in degrees from true north, if known.
    pub course: Option<f64>,
    /// Ground speed in m/s, if known.
    pub speed: Option<f64>,
    /// Radius of 68 % confidence in metres, if known.
    pub horizontal_accuracy: Option<f64>,
    pub timestamp: Timestamp,
}

impl Location {
    /// A fix with position and time only.
    pub fn new(point: GeoPoint, timestamp: Timestamp) -> Self {
        Self {
            point,
            course: None,
            speed: None,
            horizontal_accuracy: None,
            timestamp,
        }
    }

    pub fn with_course(mut self, course: f64) -> Self {
        self.course = Some(course);
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.horizontal_accuracy = Some(accuracy_m);
        self
    }

    /// `true` if the fix can be trusted for matching: finite coordinates and,
    /// when present, a finite non-negative accuracy.  Negative accuracy is the
    /// conventional "invalid fix" marker of most location providers.
    pub fn is_qualified(&self) -> bool {
        self.point.is_valid()
            && self
                .horizontal_accuracy
                .is_none_or(|acc| acc.is_finite() && acc >= 0.0)
    }

    /// The course, but only when it is a usable bearing.
    pub fn qualified_course(&self) -> Option<f64> {
        self.course.filter(|c| c.is_finite() && *c >= 0.0)
    }
}

/// A location projected onto the route polyline.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IdealizedLocation {
    pub point: GeoPoint,
    /// Route bearing at the snapped point.
    pub course: f64,
    pub speed: Option<f64>,
    pub timestamp: Timestamp,
}
