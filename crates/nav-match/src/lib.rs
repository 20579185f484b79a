//! `nav-match` — where is the traveler relative to the route?
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`matcher`]   | `LocationMatcher`, `MatchResult`                          |
//! | [`departure`] | `DepartureDetector`, `DepartureSignal`                    |
//!
//! Matching is a pure function of (fix, hint, route); all memory of past
//! fixes lives in the departure detector's bounded window.

pub mod departure;
pub mod matcher;

#[cfg(test)]
mod tests;

pub use departure::{DepartureDetector, DepartureSignal};
pub use matcher::{LocationMatcher, MatchResult};
