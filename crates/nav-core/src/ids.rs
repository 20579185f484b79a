//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be compared, logged and used as
//! map keys without ceremony.  Both kinds of ID are issued from monotonically
//! increasing counters, so ordering carries meaning: a larger `RequestSeq` was
//! issued later.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// The first ID handed out by a fresh counter.
            pub const FIRST: $name = $name(0);

            /// The ID issued right after `self`.
            #[inline]
            pub fn next(self) -> $name {
                $name(self.0.wrapping_add(1))
            }

            #[inline]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

typed_id! {
    /// Identity of one installed route.  A reroute installs a new `RouteId`,
    /// so progress snapshots can be tied to the geometry they index into.
    pub struct RouteId(u32);
}

typed_id! {
    /// Sequence number of a route-computation request.  Completions carrying
    /// anything but the sequence currently in flight are stale.
    pub struct RequestSeq(u64);
}
