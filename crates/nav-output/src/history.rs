//! Location history: record raw fixes to CSV and load them back as a trace.
//!
//! Columns: `time_secs,lat,lon,accuracy_m,course_deg,speed_mps`.  The last
//! three may be empty.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use nav_core::{GeoPoint, Location, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{OutputError, OutputResult};

/// On-disk shape of one fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationRow {
    pub time_secs:  f64,
    pub lat:        f64,
    pub lon:        f64,
    #[serde(default)]
    pub accuracy_m: Option<f64>,
    #[serde(default)]
    pub course_deg: Option<f64>,
    #[serde(default)]
    pub speed_mps:  Option<f64>,
}

impl From<&Location> for LocationRow {
    fn from(l: &Location) -> Self {
        Self {
            time_secs:  l.timestamp.0,
            lat:        l.point.lat,
            lon:        l.point.lon,
            accuracy_m: l.horizontal_accuracy,
            course_deg: l.course,
            speed_mps:  l.speed,
        }
    }
}

impl LocationRow {
    fn into_location(self) -> Location {
        Location {
            point:               GeoPoint::new(self.lat, self.lon),
            course:              self.course_deg,
            speed:               self.speed_mps,
            horizontal_accuracy: self.accuracy_m,
            timestamp:           Timestamp(self.time_secs),
        }
    }
}

// ── Recording ─────────────────────────────────────────────────────────────────

/// Appends raw fixes to a CSV stream.
pub struct LocationHistoryWriter<W: Write> {
    inner:    csv::Writer<W>,
    recorded: usize,
}

impl LocationHistoryWriter<File> {
    /// Create (or truncate) `path`.
    pub fn create(path: &Path) -> OutputResult<Self> {
        Ok(Self::from_writer(File::create(path)?))
    }
}

impl<W: Write> LocationHistoryWriter<W> {
    pub fn from_writer(writer: W) -> Self {
        Self { inner: csv::Writer::from_writer(writer), recorded: 0 }
    }

    /// Record one fix exactly as reported, qualified or not.
    pub fn record(&mut self, location: &Location) -> OutputResult<()> {
        self.inner.serialize(LocationRow::from(location))?;
        self.recorded += 1;
        Ok(())
    }

    pub fn recorded(&self) -> usize {
        self.recorded
    }

    pub fn flush(&mut self) -> OutputResult<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and hand back the underlying stream.
    pub fn into_inner(self) -> OutputResult<W> {
        self.inner.into_inner().map_err(|e| {
            let io = e.error();
            OutputError::Io(std::io::Error::new(io.kind(), io.to_string()))
        })
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Load a recorded trace from `path`.  See [`load_trace_reader`].
pub fn load_trace_csv(path: &Path) -> OutputResult<Vec<Location>> {
    load_trace_reader(File::open(path)?)
}

/// Parse a trace from any reader.
///
/// Rows must have finite coordinates within lat/lon range and non-decreasing
/// timestamps.  Accuracy is passed through untouched: a negative accuracy is
/// a valid "unqualified fix" and is left for the engine to discard.
pub fn load_trace_reader<R: Read>(reader: R) -> OutputResult<Vec<Location>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut trace: Vec<Location> = Vec::new();

    for (i, result) in rdr.deserialize::<LocationRow>().enumerate() {
        let row_no = i + 1;
        let location = result?.into_location();
        if !location.point.is_valid() {
            return Err(OutputError::InvalidFix {
                row:    row_no,
                reason: format!("coordinate {} out of range", location.point),
            });
        }
        if let Some(prev) = trace.last() {
            if location.timestamp < prev.timestamp {
                return Err(OutputError::InvalidFix {
                    row:    row_no,
                    reason: format!("timestamp {} is earlier than {}", location.timestamp, prev.timestamp),
                });
            }
        }
        trace.push(location);
    }
    debug!(fixes = trace.len(), "trace loaded");
    Ok(trace)
}
