//! `GuidanceRecorder<W>`: bridges `GuidanceObserver` to an `EventWriter`.

use nav_core::{RouteId, Timestamp};
use nav_engine::{GuidanceEvent, GuidanceObserver};
use tracing::warn;

use crate::row::{EventRow, ProgressRow};
use crate::writer::EventWriter;
use crate::{OutputError, OutputResult};

/// A [`GuidanceObserver`] that writes every event to an [`EventWriter`].
///
/// Progress events become [`ProgressRow`]s; everything else becomes an
/// [`EventRow`] stamped with the time of the latest processed fix.  Observer
/// callbacks cannot fail, so the first write error is stored and returned by
/// [`take_error`][Self::take_error].
pub struct GuidanceRecorder<W: EventWriter> {
    writer:     W,
    route_id:   RouteId,
    last_time:  Timestamp,
    last_error: Option<OutputError>,
}

impl<W: EventWriter> GuidanceRecorder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            route_id:   RouteId::INVALID,
            last_time:  Timestamp::ZERO,
            last_error: None,
        }
    }

    /// Take the stored write error, if any.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Flush the writer.  Returns the first error seen during recording, or
    /// the flush error.
    pub fn finish(&mut self) -> OutputResult<()> {
        let result = self.writer.finish();
        self.store_err(result);
        match self.last_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            if self.last_error.is_none() {
                warn!(error = %e, "recording failed; further errors suppressed");
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: EventWriter> GuidanceObserver for GuidanceRecorder<W> {
    fn on_event(&mut self, event: &GuidanceEvent) {
        let result = match event {
            GuidanceEvent::ProgressDidChange { progress, idealized, raw } => {
                self.last_time = raw.timestamp;
                self.route_id = progress.route_id;
                self.writer.write_progress(&ProgressRow {
                    time_secs:               raw.timestamp.0,
                    route_id:                progress.route_id.0,
                    leg_index:               progress.leg_index,
                    step_index:              progress.step_index,
                    distance_traveled_m:     progress.distance_traveled_m,
                    distance_remaining_m:    progress.distance_remaining_m,
                    duration_remaining_secs: progress.duration_remaining_secs,
                    fraction_traveled:       progress.fraction_traveled,
                    lat:                     idealized.point.lat,
                    lon:                     idealized.point.lon,
                    raw_lat:                 raw.point.lat,
                    raw_lon:                 raw.point.lon,
                })
            }
            other => {
                if let GuidanceEvent::DidReroute { route_id, .. } = other {
                    self.route_id = *route_id;
                }
                self.writer.write_event(&EventRow {
                    time_secs: self.last_time.0,
                    route_id:  self.route_id.0,
                    kind:      other.kind(),
                    detail:    other.to_string(),
                })
            }
        };
        self.store_err(result);
    }
}
