//! `nav-progress` — how far along the route the traveler is, and what to say.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                |
//! |-----------------|---------------------------------------------------------|
//! | [`progress`]    | `RouteProgress`, `ProgressTracker`, `ProgressUpdate`    |
//! | [`instruction`] | `InstructionScheduler`, `InstructionCursor`, `InstructionFire` |
//!
//! Both components are bound to one installed route.  A reroute replaces
//! them wholesale rather than mutating them field by field.

pub mod instruction;
pub mod progress;

#[cfg(test)]
mod tests;

pub use instruction::{InstructionCursor, InstructionFire, InstructionScheduler};
pub use progress::{ProgressTracker, ProgressUpdate, RouteProgress};
