//! The `EventWriter` trait implemented by recorder backends.

use crate::{EventRow, OutputResult, ProgressRow};

/// A sink for recorded guidance output.
///
/// [`GuidanceRecorder`][crate::GuidanceRecorder] calls these from observer
/// callbacks, which cannot fail; it keeps the first error for
/// [`take_error`][crate::GuidanceRecorder::take_error].
pub trait EventWriter {
    fn write_progress(&mut self, row: &ProgressRow) -> OutputResult<()>;

    fn write_event(&mut self, row: &EventRow) -> OutputResult<()>;

    /// Flush everything.  Safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
