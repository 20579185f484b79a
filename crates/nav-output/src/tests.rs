//! Tests for nav-output.

#[cfg(test)]
mod helpers {
    use nav_core::{GeoPoint, Location, Timestamp};
    use nav_route::{RouteBuilder, RouteGeometry, RouteStep, SpokenInstruction, Waypoint};

    pub fn origin() -> GeoPoint {
        GeoPoint::new(40.0, -3.7)
    }

    pub fn route() -> RouteGeometry {
        let a = origin();
        let b = a.destination(0.0, 800.0);
        RouteBuilder::new()
            .step(RouteStep::new(vec![a, b], 80.0).with_spoken(SpokenInstruction::new(200.0, "arrive soon")))
            .end_leg(Waypoint::named(b, "plaza"))
            .build()
            .unwrap()
    }

    pub fn fix(along: f64, t: f64) -> Location {
        Location::new(origin().destination(0.0, along), Timestamp(t)).with_accuracy(5.0)
    }
}

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use crate::csv::{CsvEventWriter, EVENTS_HEADER, PROGRESS_HEADER};
    use crate::row::{EventRow, ProgressRow};
    use crate::writer::EventWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn progress_row(t: f64) -> ProgressRow {
        ProgressRow {
            time_secs:               t,
            route_id:                0,
            leg_index:               0,
            step_index:              1,
            distance_traveled_m:     120.0,
            distance_remaining_m:    680.0,
            duration_remaining_secs: 68.0,
            fraction_traveled:       0.15,
            lat:                     40.001,
            lon:                     -3.7,
            raw_lat:                 40.0011,
            raw_lon:                 -3.7001,
        }
    }

    #[test]
    fn files_and_headers() {
        let dir = tmp();
        let mut w = CsvEventWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("progress.csv")).unwrap();
        let headers: Vec<_> = rdr.headers().unwrap().iter().map(str::to_owned).collect();
        assert_eq!(headers, PROGRESS_HEADER);

        let mut rdr = csv::Reader::from_path(dir.path().join("events.csv")).unwrap();
        let headers: Vec<_> = rdr.headers().unwrap().iter().map(str::to_owned).collect();
        assert_eq!(headers, EVENTS_HEADER);
    }

    #[test]
    fn rows_are_written() {
        let dir = tmp();
        let mut w = CsvEventWriter::new(dir.path()).unwrap();
        w.write_progress(&progress_row(3.0)).unwrap();
        w.write_event(&EventRow {
            time_secs: 3.0,
            route_id:  0,
            kind:      "did_reroute",
            detail:    "did reroute (reactive), onto RouteId(1)".into(),
        })
        .unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("progress.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "3.000");
        assert_eq!(&rows[0][3], "1"); // step_index
        assert_eq!(&rows[0][4], "120.00");

        let mut rdr = csv::Reader::from_path(dir.path().join("events.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[0][2], "did_reroute");
        // The comma survives quoting.
        assert_eq!(&rows[0][3], "did reroute (reactive), onto RouteId(1)");
    }

    #[test]
    fn finish_idempotent() {
        let dir = tmp();
        let mut w = CsvEventWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }
}

#[cfg(test)]
mod recorder_tests {
    use nav_engine::{GuidanceEngineBuilder, GuidanceEvent, GuidanceObserver};
    use nav_reroute::QueuedRequester;

    use super::helpers::*;
    use crate::{CsvEventWriter, EventRow, EventWriter, GuidanceRecorder, OutputError, OutputResult, ProgressRow};

    #[derive(Default)]
    struct MemoryWriter {
        progress: Vec<ProgressRow>,
        events:   Vec<EventRow>,
        finished: usize,
    }

    impl EventWriter for MemoryWriter {
        fn write_progress(&mut self, row: &ProgressRow) -> OutputResult<()> {
            self.progress.push(*row);
            Ok(())
        }

        fn write_event(&mut self, row: &EventRow) -> OutputResult<()> {
            self.events.push(row.clone());
            Ok(())
        }

        fn finish(&mut self) -> OutputResult<()> {
            self.finished += 1;
            Ok(())
        }
    }

    struct FailingWriter {
        calls: usize,
    }

    impl EventWriter for FailingWriter {
        fn write_progress(&mut self, _row: &ProgressRow) -> OutputResult<()> {
            self.calls += 1;
            Err(OutputError::Io(std::io::Error::other(format!("disk full #{}", self.calls))))
        }

        fn write_event(&mut self, _row: &EventRow) -> OutputResult<()> {
            Ok(())
        }

        fn finish(&mut self) -> OutputResult<()> {
            Ok(())
        }
    }

    #[test]
    fn drive_is_recorded() {
        let mut engine = GuidanceEngineBuilder::new(QueuedRequester::new())
            .route(route())
            .build()
            .unwrap();
        let mut recorder = GuidanceRecorder::new(MemoryWriter::default());
        for (i, along) in [0.0, 200.0, 650.0, 795.0].into_iter().enumerate() {
            engine.update_location(fix(along, i as f64 * 10.0), &mut recorder);
        }
        recorder.finish().unwrap();
        let w = recorder.into_writer();

        assert_eq!(w.progress.len(), 4);
        assert_eq!(w.finished, 1);
        assert!(w.progress.windows(2).all(|p| p[1].distance_traveled_m >= p[0].distance_traveled_m));

        let kinds: Vec<_> = w.events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, ["did_pass_spoken_instruction_point", "did_arrive_at_waypoint"]);
        assert_eq!(w.events[0].time_secs, 20.0);
        assert!(w.events[1].detail.contains("plaza"));
    }

    #[test]
    fn first_error_is_kept() {
        let mut recorder = GuidanceRecorder::new(FailingWriter { calls: 0 });
        let mut engine = GuidanceEngineBuilder::new(QueuedRequester::new())
            .route(route())
            .build()
            .unwrap();
        engine.update_location(fix(0.0, 0.0), &mut recorder);
        engine.update_location(fix(10.0, 1.0), &mut recorder);

        let err = recorder.take_error().unwrap();
        assert!(err.to_string().contains("#1"));
        assert!(recorder.take_error().is_none());
    }

    #[test]
    fn non_progress_events_use_last_fix_time() {
        let mut recorder = GuidanceRecorder::new(MemoryWriter::default());
        recorder.on_event(&GuidanceEvent::DidArriveAtWaypoint {
            leg_index: 0,
            waypoint:  nav_route::Waypoint::new(origin()),
        });
        let w = recorder.into_writer();
        assert_eq!(w.events[0].time_secs, 0.0);
        assert_eq!(w.events[0].route_id, u32::MAX);
    }

    #[test]
    fn csv_backend_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = GuidanceEngineBuilder::new(QueuedRequester::new())
            .route(route())
            .build()
            .unwrap();
        let mut recorder = GuidanceRecorder::new(CsvEventWriter::new(dir.path()).unwrap());
        for i in 0..5 {
            engine.update_location(fix(i as f64 * 150.0, i as f64), &mut recorder);
        }
        recorder.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("progress.csv")).unwrap();
        assert_eq!(rdr.records().count(), 5);
        let mut rdr = csv::Reader::from_path(dir.path().join("events.csv")).unwrap();
        assert_eq!(rdr.records().count(), 1);
    }
}

#[cfg(test)]
mod history_tests {
    use nav_core::{GeoPoint, Location, Timestamp};

    use super::helpers::*;
    use crate::{LocationHistoryWriter, OutputError, load_trace_csv, load_trace_reader};

    #[test]
    fn recorded_history_loads_back() {
        let trace = vec![
            fix(0.0, 0.0).with_course(0.0).with_speed(9.5),
            fix(10.0, 1.0),
            Location::new(GeoPoint::new(40.0002, -3.7), Timestamp(2.0)).with_accuracy(-1.0),
        ];
        let mut w = LocationHistoryWriter::from_writer(Vec::new());
        for l in &trace {
            w.record(l).unwrap();
        }
        assert_eq!(w.recorded(), 3);
        let bytes = w.into_inner().unwrap();

        let loaded = load_trace_reader(bytes.as_slice()).unwrap();
        assert_eq!(loaded, trace);
        assert!(!loaded[2].is_qualified());
    }

    #[test]
    fn optional_columns_may_be_missing() {
        let data = "time_secs, lat, lon\n0, 40.0, -3.7\n1.5, 40.0001, -3.7\n";
        let loaded = load_trace_reader(data.as_bytes()).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].timestamp, Timestamp(1.5));
        assert_eq!(loaded[1].horizontal_accuracy, None);
        assert_eq!(loaded[1].course, None);
    }

    #[test]
    fn empty_cells_are_none() {
        let data = "time_secs,lat,lon,accuracy_m,course_deg,speed_mps\n0,40,-3.7,,90,\n";
        let loaded = load_trace_reader(data.as_bytes()).unwrap();
        assert_eq!(loaded[0].horizontal_accuracy, None);
        assert_eq!(loaded[0].course, Some(90.0));
        assert_eq!(loaded[0].speed, None);
    }

    #[test]
    fn out_of_range_coordinate_is_rejected() {
        let data = "time_secs,lat,lon\n0,40,-3.7\n1,95,-3.7\n";
        let err = load_trace_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, OutputError::InvalidFix { row: 2, .. }));
    }

    #[test]
    fn backwards_time_is_rejected() {
        let data = "time_secs,lat,lon\n5,40,-3.7\n4,40,-3.7\n";
        assert!(matches!(
            load_trace_reader(data.as_bytes()),
            Err(OutputError::InvalidFix { row: 2, .. })
        ));
    }

    #[test]
    fn malformed_number_is_a_csv_error() {
        let data = "time_secs,lat,lon\nzero,40,-3.7\n";
        assert!(matches!(load_trace_reader(data.as_bytes()), Err(OutputError::Csv(_))));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drive.csv");
        let mut w = LocationHistoryWriter::create(&path).unwrap();
        w.record(&fix(0.0, 0.0)).unwrap();
        w.record(&fix(25.0, 2.0)).unwrap();
        w.flush().unwrap();
        drop(w);

        let loaded = load_trace_csv(&path).unwrap();
        assert_eq!(loaded, vec![fix(0.0, 0.0), fix(25.0, 2.0)]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_trace_csv(&dir.path().join("nope.csv")), Err(OutputError::Io(_))));
    }
}
