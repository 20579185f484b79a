//! Time model.
//!
//! The engine has no clock of its own.  Time advances only through the
//! timestamps of incoming location fixes (and explicit `poll(now)` calls),
//! which keeps every decision reproducible from a recorded trace.

use std::fmt;

/// Seconds since an arbitrary epoch (usually Unix time), as carried by a
/// location fix.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(pub f64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0.0);

    /// Seconds elapsed from `earlier` to `self`, clamped at zero so an
    /// out-of-order fix never yields a negative interval.
    #[inline]
    pub fn since(self, earlier: Timestamp) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }
}

impl std::ops::Add<f64> for Timestamp {
    type Output = Timestamp;
    #[inline]
    fn add(self, rhs: f64) -> Timestamp {
        Timestamp(self.0 + rhs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={:.3}s", self.0)
    }
}
