//! `nav-route` — route model, validation, and spatial queries.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                      |
//! |--------------|---------------------------------------------------------------|
//! | [`route`]    | `RouteLeg`, `RouteStep`, `Waypoint`, spoken/visual instructions |
//! | [`geometry`] | `RouteGeometry` (offsets + R-tree), `RouteBuilder`, `RouteSnap` |
//! | [`error`]    | `RouteError`, `RouteResult<T>`                                |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on the route data types.   |

pub mod error;
pub mod geometry;
pub mod route;

#[cfg(test)]
mod tests;

pub use error::{RouteError, RouteResult};
pub use geometry::{MAX_SPOKEN_PER_STEP, RouteBuilder, RouteCursor, RouteGeometry, RouteSnap};
pub use route::{
    RouteLeg, RouteStep, SpokenInstruction, SpokenInstructionKind, VisualInstruction, Waypoint,
};
