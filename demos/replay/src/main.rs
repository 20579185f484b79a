//! replay — run a recorded drive through the guidance engine.
//!
//! Reads a route (JSON array of legs), an optional `GuidanceConfig` JSON and
//! a location trace CSV, feeds every fix to the engine, and prints what the
//! traveler would have heard and seen.  Reroutes are answered by a
//! straight-line "router" running on a tokio runtime.  Without arguments a
//! built-in drive that misses a turn is replayed.
//!
//! ```text
//! RUST_LOG=nav_reroute=debug cargo run -p replay -- \
//!     --route route.json --trace drive.csv --output-dir out/
//! ```

mod scenario;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::runtime::Builder;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nav_core::{GuidanceConfig, Location};
use nav_engine::{GuidanceEngineBuilder, GuidanceEvent, GuidanceObserver};
use nav_output::{CsvEventWriter, GuidanceRecorder, load_trace_csv};
use nav_reroute::{RerouteError, RerouteResult, RouteRequest, TokioRequester};
use nav_route::{RouteBuilder, RouteGeometry, RouteLeg, RouteStep};

/// Speed assumed by the straight-line router when estimating durations.
const ROUTER_SPEED_MPS: f64 = 12.0;

#[derive(Parser, Debug)]
#[command(name = "replay")]
#[command(about = "Replay a location trace against a route", long_about = None)]
struct Args {
    /// Route file: JSON array of legs
    #[arg(long, requires = "trace")]
    route: Option<PathBuf>,

    /// Trace file: CSV with time_secs,lat,lon[,accuracy_m,course_deg,speed_mps]
    #[arg(long, requires = "route")]
    trace: Option<PathBuf>,

    /// GuidanceConfig JSON; fields not given keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write progress.csv and events.csv here
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Also print every progress update
    #[arg(long)]
    verbose: bool,
}

// ── Straight-line router ──────────────────────────────────────────────────────

/// Answers a request with straight lines from the origin through every
/// remaining waypoint, or with the offered alternative for proactive ones.
fn straight_line(request: RouteRequest) -> RerouteResult<RouteGeometry> {
    if let Some(alternative) = request.alternative {
        return Ok(RouteGeometry::from_legs(alternative.legs().to_vec())?);
    }
    if request.waypoints.is_empty() {
        return Err(RerouteError::RequestFailed("no waypoints left".into()));
    }

    let mut builder = RouteBuilder::new();
    let mut from = request.origin;
    for waypoint in request.waypoints {
        let length = from.distance_m(waypoint.point);
        let step = RouteStep::new(vec![from, waypoint.point], length / ROUTER_SPEED_MPS)
            .with_name("direct");
        from = waypoint.point;
        builder = builder.step(step).end_leg(waypoint);
    }
    Ok(builder.build()?)
}

// ── Console observer ──────────────────────────────────────────────────────────

/// Prints events and forwards them to an optional CSV recorder.
struct Console {
    recorder: Option<GuidanceRecorder<CsvEventWriter>>,
    verbose:  bool,
    progress: usize,
    reroutes: usize,
    spoken:   usize,
}

impl Console {
    fn new(recorder: Option<GuidanceRecorder<CsvEventWriter>>, verbose: bool) -> Self {
        Self { recorder, verbose, progress: 0, reroutes: 0, spoken: 0 }
    }
}

impl GuidanceObserver for Console {
    fn on_event(&mut self, event: &GuidanceEvent) {
        match event {
            GuidanceEvent::ProgressDidChange { raw, .. } => {
                self.progress += 1;
                if self.verbose {
                    println!("[{:>7.1}s] {event}", raw.timestamp.0);
                }
            }
            other => {
                match other {
                    GuidanceEvent::DidReroute { .. } => self.reroutes += 1,
                    GuidanceEvent::DidPassSpokenInstructionPoint { .. } => self.spoken += 1,
                    _ => {}
                }
                println!("           {other}");
            }
        }
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.on_event(event);
        }
    }
}

// ── Inputs ────────────────────────────────────────────────────────────────────

fn load_config(path: Option<&Path>) -> Result<GuidanceConfig> {
    let Some(path) = path else {
        return Ok(GuidanceConfig::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn load_inputs(args: &Args) -> Result<(Vec<RouteLeg>, Vec<Location>)> {
    match (&args.route, &args.trace) {
        (Some(route), Some(trace)) => {
            let text = fs::read_to_string(route).with_context(|| format!("reading {}", route.display()))?;
            let legs: Vec<RouteLeg> =
                serde_json::from_str(&text).with_context(|| format!("parsing {}", route.display()))?;
            let fixes = load_trace_csv(trace).with_context(|| format!("loading {}", trace.display()))?;
            Ok((legs, fixes))
        }
        _ => {
            println!("No route/trace given; replaying the built-in drive.");
            Ok((scenario::route(), scenario::trace()))
        }
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let (legs, fixes) = load_inputs(&args)?;

    let runtime = Builder::new_current_thread().build()?;
    let requester = TokioRequester::new(runtime.handle().clone(), |request: RouteRequest| async move {
        straight_line(request)
    });
    let mut engine = GuidanceEngineBuilder::new(requester)
        .config(config)
        .legs(legs)
        .build()?;

    let recorder = match &args.output_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            Some(GuidanceRecorder::new(CsvEventWriter::new(dir)?))
        }
        None => None,
    };
    let mut console = Console::new(recorder, args.verbose);

    println!("=== replay: {} fixes ===", fixes.len());
    let t0 = Instant::now();
    for fix in fixes {
        engine.update_location(fix, &mut console);
        if engine.reroute_state().in_flight_seq().is_some() {
            // The router answers instantly; merge before the next fix.
            runtime.block_on(engine.settle_reroute(&mut console));
        }
    }
    let elapsed = t0.elapsed();
    info!(secs = elapsed.as_secs_f64(), "replay finished");

    if let Some(recorder) = console.recorder.as_mut() {
        recorder.finish().context("writing output")?;
    }

    println!();
    println!("Replay complete in {:.3} s", elapsed.as_secs_f64());
    println!("  progress updates : {}", console.progress);
    println!("  spoken prompts   : {}", console.spoken);
    println!("  reroutes         : {}", console.reroutes);
    if let Some(p) = engine.progress() {
        println!(
            "  final            : leg {} step {}, {:.0} m to go, arrived: {}",
            p.leg_index,
            p.step_index,
            p.distance_remaining_m,
            engine.has_arrived()
        );
    }
    Ok(())
}
