//! `nav-engine` — the turn-by-turn guidance orchestrator.
//!
//! # Per-fix pipeline
//!
//! ```text
//! update_location(fix):
//!   ① Merge     — drain route-request answers; install or report failure
//!                 (stale answers are dropped by sequence number).
//!   ② Cooldown  — end an elapsed cooldown; retry a deferred reactive reroute.
//!   ③ Match     — LocationMatcher projects the fix onto the active route.
//!   ④ Progress  — ProgressTracker advances (monotonic) or freezes.
//!   ⑤ Departure — DepartureDetector updates its window; edge-triggered.
//!   ⑥ Reroute   — RerouteCoordinator decides; WillReroute, then request.
//!   ⑦ Instr.    — InstructionScheduler fires crossed triggers.
//!   ⑧ Emit      — arrival, progress, and instruction events.
//! ```
//!
//! A route swap replaces geometry, progress, instruction markers, and
//! departure history in one assignment; observers never see a mix.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use nav_engine::{EventCollector, GuidanceEngineBuilder};
//! use nav_reroute::QueuedRequester;
//!
//! let mut engine = GuidanceEngineBuilder::new(QueuedRequester::new())
//!     .route(route)
//!     .build()?;
//! let mut events = EventCollector::new();
//! for fix in trace {
//!     engine.update_location(fix, &mut events);
//! }
//! ```

pub mod builder;
pub mod engine;
pub mod error;
pub mod event;


pub use builder::GuidanceEngineBuilder;
pub use engine::GuidanceEngine;
pub use error::{EngineError, EngineResult};
pub use event::{EventCollector, GuidanceEvent, GuidanceObserver, NoopObserver};
