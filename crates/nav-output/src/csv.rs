//! CSV recorder backend.
//!
//! Creates two files in the configured output directory:
//! - `progress.csv`
//! - `events.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::EventWriter;
use crate::{EventRow, OutputResult, ProgressRow};

pub const PROGRESS_HEADER: [&str; 12] = [
    "time_secs",
    "route_id",
    "leg_index",
    "step_index",
    "distance_traveled_m",
    "distance_remaining_m",
    "duration_remaining_secs",
    "fraction_traveled",
    "lat",
    "lon",
    "raw_lat",
    "raw_lon",
];

pub const EVENTS_HEADER: [&str; 4] = ["time_secs", "route_id", "kind", "detail"];

/// Writes guidance output to two CSV files.
pub struct CsvEventWriter {
    progress: Writer<File>,
    events:   Writer<File>,
    finished: bool,
}

impl CsvEventWriter {
    /// Create the two CSV files in `dir` and write their header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut progress = Writer::from_path(dir.join("progress.csv"))?;
        progress.write_record(PROGRESS_HEADER)?;

        let mut events = Writer::from_path(dir.join("events.csv"))?;
        events.write_record(EVENTS_HEADER)?;

        Ok(Self { progress, events, finished: false })
    }
}

impl EventWriter for CsvEventWriter {
    fn write_progress(&mut self, row: &ProgressRow) -> OutputResult<()> {
        self.progress.write_record(&[
            format!("{:.3}", row.time_secs),
            row.route_id.to_string(),
            row.leg_index.to_string(),
            row.step_index.to_string(),
            format!("{:.2}", row.distance_traveled_m),
            format!("{:.2}", row.distance_remaining_m),
            format!("{:.1}", row.duration_remaining_secs),
            format!("{:.4}", row.fraction_traveled),
            format!("{:.7}", row.lat),
            format!("{:.7}", row.lon),
            format!("{:.7}", row.raw_lat),
            format!("{:.7}", row.raw_lon),
        ])?;
        Ok(())
    }

    fn write_event(&mut self, row: &EventRow) -> OutputResult<()> {
        self.events.write_record(&[
            format!("{:.3}", row.time_secs),
            row.route_id.to_string(),
            row.kind.to_owned(),
            row.detail.clone(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.progress.flush()?;
        self.events.flush()?;
        Ok(())
    }
}
