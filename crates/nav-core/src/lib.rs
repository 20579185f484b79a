//! `nav-core` — foundational types for the `rust_nav` guidance engine.
//!
//! This crate is a dependency of every other `nav-*` crate.  It intentionally
//! has no `nav-*` dependencies and minimal external ones (only `thiserror`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`ids`]        | `RouteId`, `RequestSeq`                                   |
//! | [`geo`]        | `GeoPoint`, haversine distance, bearings, local projection |
//! | [`location`]   | `Location` (raw fix), `IdealizedLocation` (snapped)       |
//! | [`time`]       | `Timestamp`                                               |
//! | [`config`]     | `GuidanceConfig` and its per-component sections           |
//! | [`error`]      | `NavError`, `NavResult`                                   |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |
//!           | Config sections use `#[serde(default)]`.                   |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod location;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{
    ArrivalConfig, DepartureConfig, GuidanceConfig, InstructionConfig, LocalityBias,
    MatcherConfig, RerouteConfig,
};
pub use error::{NavError, NavResult};
pub use geo::{GeoPoint, LocalFrame, bearing_difference, normalize_bearing};
pub use ids::{RequestSeq, RouteId};
pub use location::{IdealizedLocation, Location};
pub use time::Timestamp;
