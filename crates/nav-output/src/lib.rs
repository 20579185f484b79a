//! `nav-output` — recorders and trace loading for the rust_nav framework.
//!
//! | Item                      | Files                          |
//! |---------------------------|--------------------------------|
//! | [`CsvEventWriter`]        | `progress.csv`, `events.csv`   |
//! | [`LocationHistoryWriter`] | any CSV path or `io::Write`    |
//! | [`load_trace_csv`]        | reads what the history writer wrote |
//!
//! [`GuidanceRecorder`] implements `nav_engine::GuidanceObserver` on top of
//! any [`EventWriter`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use nav_output::{CsvEventWriter, GuidanceRecorder, load_trace_csv};
//!
//! let mut recorder = GuidanceRecorder::new(CsvEventWriter::new(Path::new("./out"))?);
//! for fix in load_trace_csv(Path::new("drive.csv"))? {
//!     engine.update_location(fix, &mut recorder);
//! }
//! recorder.finish()?;
//! ```

pub mod csv;
pub mod error;
pub mod history;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(test)]
mod tests;

pub use csv::CsvEventWriter;
pub use error::{OutputError, OutputResult};
pub use history::{LocationHistoryWriter, LocationRow, load_trace_csv, load_trace_reader};
pub use observer::GuidanceRecorder;
pub use row::{EventRow, ProgressRow};
pub use writer::EventWriter;
