//! Validated route geometry with precomputed metrics and a segment index.
//!
//! # Distances
//!
//! Every offset in this module is a *route-wide* distance along the polyline,
//! in metres from the start of leg 0.  Per-step and per-leg offsets are
//! precomputed at build time so that progress queries are O(log n).
//!
//! # Spatial index
//!
//! Each polyline segment is projected into a [`LocalFrame`] (metres east /
//! north of the route's first vertex) and stored in an `rstar` R-tree.  A
//! nearest-point query collects all segments within the search radius and
//! picks the best one under a [`LocalityBias`], so a route that crosses or
//! revisits itself still matches near the previous position.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use nav_core::{GeoPoint, LocalFrame, LocalityBias};

use crate::{RouteError, RouteLeg, RouteResult, RouteStep, Waypoint};

/// Spoken instructions per step are tracked in a `u64` bitset.
pub const MAX_SPOKEN_PER_STEP: usize = 64;

/// Segments shorter than this are dropped from the index.
const MIN_SEGMENT_M: f64 = 1e-6;

// ── R-tree segment entry ──────────────────────────────────────────────────────

/// Entry stored in the R-tree: one polyline segment in local metres.
#[derive(Clone, Debug)]
struct SegmentEntry {
    a:   [f64; 2],
    b:   [f64; 2],
    idx: usize, // into `RouteGeometry::segments`
}

impl SegmentEntry {
    /// Parameter `t ∈ [0, 1]` of the foot of the perpendicular from `p`, and
    /// the foot itself.
    fn project(&self, p: &[f64; 2]) -> (f64, [f64; 2]) {
        let dx = self.b[0] - self.a[0];
        let dy = self.b[1] - self.a[1];
        let len2 = dx * dx + dy * dy;
        let t = if len2 > 0.0 {
            (((p[0] - self.a[0]) * dx + (p[1] - self.a[1]) * dy) / len2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (t, [self.a[0] + t * dx, self.a[1] + t * dy])
    }
}

impl RTreeObject for SegmentEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.a, self.b)
    }
}

impl PointDistance for SegmentEntry {
    /// Squared distance from `point` to the closest point of the segment.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let (_, foot) = self.project(point);
        let dx = foot[0] - point[0];
        let dy = foot[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── Precomputed metrics ───────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct Segment {
    leg:      usize,
    step:     usize,
    a:        GeoPoint,
    b:        GeoPoint,
    start_m:  f64,
    length_m: f64,
    bearing:  f64,
}

#[derive(Copy, Clone, Debug)]
struct StepSpan {
    leg:                 usize,
    step:                usize,
    start_m:             f64,
    length_m:            f64,
    duration_secs:       f64,
    /// Sum of the durations of every later step on the route.
    duration_after_secs: f64,
}

// ── Query types ───────────────────────────────────────────────────────────────

/// Where the user was last matched: the hint for the next query.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteCursor {
    pub leg_index:        usize,
    pub step_index:       usize,
    pub distance_along_m: f64,
}

/// Result of projecting a point onto the route.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteSnap {
    /// Closest point on the polyline.
    pub point:                        GeoPoint,
    /// Great-circle distance from the query point to `point`.
    pub distance_from_route_m:        f64,
    pub leg_index:                    usize,
    pub step_index:                   usize,
    /// Route-wide distance along the polyline to `point`.
    pub distance_along_m:             f64,
    /// Bearing of the matched segment.
    pub bearing:                      f64,
    pub distance_remaining_in_step_m: f64,
}

impl RouteSnap {
    pub fn cursor(&self) -> RouteCursor {
        RouteCursor {
            leg_index:        self.leg_index,
            step_index:       self.step_index,
            distance_along_m: self.distance_along_m,
        }
    }
}

// ── RouteGeometry ─────────────────────────────────────────────────────────────

/// An immutable, validated route.
///
/// Construct with [`RouteGeometry::from_legs`] or [`RouteBuilder`].  Once
/// built, no query can fail on account of the route's shape.
pub struct RouteGeometry {
    legs:                Vec<RouteLeg>,
    frame:               LocalFrame,
    segments:            Vec<Segment>,
    spans:               Vec<StepSpan>,
    /// Index into `spans` of each leg's first step.  Length = legs + 1.
    leg_first_span:      Vec<usize>,
    total_distance_m:    f64,
    total_duration_secs: f64,
    spatial_idx:         RTree<SegmentEntry>,
}

impl std::fmt::Debug for RouteGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteGeometry")
            .field("legs", &self.legs.len())
            .field("steps", &self.spans.len())
            .field("segments", &self.segments.len())
            .field("total_distance_m", &self.total_distance_m)
            .field("total_duration_secs", &self.total_duration_secs)
            .finish()
    }
}

impl RouteGeometry {
    /// Validate `legs` and precompute offsets and the segment index.
    ///
    /// Spoken instructions of every step are re-sorted by descending trigger
    /// distance, which is the order they are crossed in.
    pub fn from_legs(mut legs: Vec<RouteLeg>) -> RouteResult<Self> {
        if legs.is_empty() {
            return Err(RouteError::Degenerate("route has no legs".into()));
        }
        for (li, leg) in legs.iter_mut().enumerate() {
            if leg.steps.is_empty() {
                return Err(RouteError::Degenerate(format!("leg {li} has no steps")));
            }
            if !leg.destination.point.is_valid() {
                return Err(RouteError::Degenerate(format!("leg {li} destination is not a valid coordinate")));
            }
            for (si, step) in leg.steps.iter_mut().enumerate() {
                validate_step(li, si, step)?;
                step.spoken.sort_by(|a, b| b.trigger_distance_m.total_cmp(&a.trigger_distance_m));
            }
        }

        let origin = legs[0].steps[0].geometry[0];
        let frame = LocalFrame::new(origin);

        let mut segments = Vec::new();
        let mut spans = Vec::new();
        let mut leg_first_span = Vec::with_capacity(legs.len() + 1);
        let mut offset = 0.0;

        for (li, leg) in legs.iter().enumerate() {
            leg_first_span.push(spans.len());
            for (si, step) in leg.steps.iter().enumerate() {
                let start_m = offset;
                for w in step.geometry.windows(2) {
                    let length_m = w[0].distance_m(w[1]);
                    if length_m < MIN_SEGMENT_M {
                        continue;
                    }
                    segments.push(Segment {
                        leg: li,
                        step: si,
                        a: w[0],
                        b: w[1],
                        start_m: offset,
                        length_m,
                        bearing: w[0].bearing_to(w[1]),
                    });
                    offset += length_m;
                }
                spans.push(StepSpan {
                    leg: li,
                    step: si,
                    start_m,
                    length_m: offset - start_m,
                    duration_secs: step.duration_secs,
                    duration_after_secs: 0.0,
                });
            }
        }
        leg_first_span.push(spans.len());

        if segments.is_empty() || offset <= 0.0 {
            return Err(RouteError::Degenerate("route has zero length".into()));
        }

        let mut after = 0.0;
        for span in spans.iter_mut().rev() {
            span.duration_after_secs = after;
            after += span.duration_secs;
        }
        let total_duration_secs = after;

        // Bulk-load for O(n log n) construction.
        let entries: Vec<SegmentEntry> = segments
            .iter()
            .enumerate()
            .map(|(idx, s)| SegmentEntry { a: frame.to_xy(s.a), b: frame.to_xy(s.b), idx })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        Ok(Self {
            legs,
            frame,
            segments,
            spans,
            leg_first_span,
            total_distance_m: offset,
            total_duration_secs,
            spatial_idx,
        })
    }

    // ── Structure ─────────────────────────────────────────────────────────

    pub fn legs(&self) -> &[RouteLeg] {
        &self.legs
    }

    pub fn leg_count(&self) -> usize {
        self.legs.len()
    }

    /// Number of steps in `leg`, or 0 for an out-of-range leg.
    pub fn step_count(&self, leg: usize) -> usize {
        self.legs.get(leg).map_or(0, |l| l.steps.len())
    }

    pub fn step(&self, leg: usize, step: usize) -> Option<&RouteStep> {
        self.legs.get(leg)?.steps.get(step)
    }

    /// The waypoint at the end of `leg`.
    pub fn waypoint(&self, leg: usize) -> Option<&Waypoint> {
        self.legs.get(leg).map(|l| &l.destination)
    }

    /// Waypoints still to visit when on `leg`, in order.
    pub fn remaining_waypoints(&self, leg: usize) -> Vec<Waypoint> {
        self.legs.iter().skip(leg).map(|l| l.destination.clone()).collect()
    }

    pub fn final_destination(&self) -> &Waypoint {
        // Non-empty by construction.
        &self.legs[self.legs.len() - 1].destination
    }

    pub fn origin(&self) -> GeoPoint {
        self.frame.origin()
    }

    // ── Metrics ───────────────────────────────────────────────────────────

    pub fn total_distance_m(&self) -> f64 {
        self.total_distance_m
    }

    pub fn total_duration_secs(&self) -> f64 {
        self.total_duration_secs
    }

    /// Route-wide offset where `leg` begins.
    pub fn leg_start_m(&self, leg: usize) -> f64 {
        self.leg_first_span
            .get(leg)
            .and_then(|&i| self.spans.get(i))
            .map_or(self.total_distance_m, |s| s.start_m)
    }

    /// Route-wide offset where `leg` ends.
    pub fn leg_end_m(&self, leg: usize) -> f64 {
        if leg + 1 >= self.legs.len() {
            self.total_distance_m
        } else {
            self.leg_start_m(leg + 1)
        }
    }

    pub fn step_start_m(&self, leg: usize, step: usize) -> f64 {
        self.span(leg, step).map_or(self.total_distance_m, |s| s.start_m)
    }

    pub fn step_end_m(&self, leg: usize, step: usize) -> f64 {
        self.span(leg, step)
            .map_or(self.total_distance_m, |s| s.start_m + s.length_m)
    }

    /// Which step contains the route-wide offset `distance_m`.
    ///
    /// An offset exactly on a step boundary belongs to the later step, and
    /// zero-length steps are only ever returned at the very end of the route.
    pub fn locate(&self, distance_m: f64) -> (usize, usize) {
        let i = self.span_index(distance_m);
        (self.spans[i].leg, self.spans[i].step)
    }

    /// Expected travel time from `distance_m` to the end of the route,
    /// interpolating linearly within the current step.
    pub fn duration_remaining_secs(&self, distance_m: f64) -> f64 {
        let span = &self.spans[self.span_index(distance_m)];
        self.step_remaining_secs(span, distance_m) + span.duration_after_secs
    }

    /// Expected travel time from `distance_m` to the end of its step.
    pub fn step_duration_remaining_secs(&self, distance_m: f64) -> f64 {
        let span = &self.spans[self.span_index(distance_m)];
        self.step_remaining_secs(span, distance_m)
    }

    /// Expected travel time from `distance_m` to the end of `leg`.
    pub fn leg_duration_remaining_secs(&self, leg: usize, distance_m: f64) -> f64 {
        let after_leg = self
            .leg_first_span
            .get(leg + 1)
            .and_then(|&i| self.spans.get(i))
            .map_or(0.0, |s| s.duration_secs + s.duration_after_secs);
        (self.duration_remaining_secs(distance_m) - after_leg).max(0.0)
    }

    /// The point on the polyline at route-wide offset `distance_m`.
    pub fn point_at(&self, distance_m: f64) -> GeoPoint {
        let seg = self.segment_at(distance_m);
        let t = ((distance_m - seg.start_m) / seg.length_m).clamp(0.0, 1.0);
        interpolate(seg.a, seg.b, t)
    }

    /// Bearing of the polyline at route-wide offset `distance_m`.
    pub fn bearing_at(&self, distance_m: f64) -> f64 {
        self.segment_at(distance_m).bearing
    }

    // ── Nearest-point query ───────────────────────────────────────────────

    /// Project `point` onto the route.
    ///
    /// Segments within `search_radius_m` are scored under `bias` relative to
    /// `hint` (pure lateral distance when there is no hint).  When nothing is
    /// within the radius the globally nearest segment is used, so callers
    /// always learn how far off the route the point is.
    ///
    /// Returns `None` only for a non-finite `point`.
    pub fn nearest_point(
        &self,
        point: GeoPoint,
        hint: Option<RouteCursor>,
        search_radius_m: f64,
        bias: &LocalityBias,
    ) -> Option<RouteSnap> {
        if !point.is_valid() {
            return None;
        }
        let q = self.frame.to_xy(point);

        let mut best: Option<(f64, Candidate)> = None;
        for entry in self.spatial_idx.locate_within_distance(q, search_radius_m * search_radius_m) {
            let cand = self.candidate(entry, &q);
            let score = match hint {
                Some(h) => bias.score(cand.lateral_m, cand.along_m, h.distance_along_m),
                None => cand.lateral_m,
            };
            let better = best.as_ref().is_none_or(|(s, b)| {
                score < *s || (score == *s && cand.along_m < b.along_m)
            });
            if better {
                best = Some((score, cand));
            }
        }

        let cand = match best {
            Some((_, cand)) => cand,
            None => self.candidate(self.spatial_idx.nearest_neighbor(&q)?, &q),
        };
        Some(self.snap(point, cand))
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn candidate(&self, entry: &SegmentEntry, q: &[f64; 2]) -> Candidate {
        let (t, foot) = entry.project(q);
        let seg = &self.segments[entry.idx];
        let dx = foot[0] - q[0];
        let dy = foot[1] - q[1];
        Candidate {
            seg:       entry.idx,
            t,
            lateral_m: (dx * dx + dy * dy).sqrt(),
            along_m:   seg.start_m + t * seg.length_m,
        }
    }

    fn snap(&self, point: GeoPoint, cand: Candidate) -> RouteSnap {
        let seg = &self.segments[cand.seg];
        let snapped = interpolate(seg.a, seg.b, cand.t);
        let step_end = self.step_end_m(seg.leg, seg.step);
        RouteSnap {
            point:                        snapped,
            distance_from_route_m:        point.distance_m(snapped),
            leg_index:                    seg.leg,
            step_index:                   seg.step,
            distance_along_m:             cand.along_m,
            bearing:                      seg.bearing,
            distance_remaining_in_step_m: (step_end - cand.along_m).max(0.0),
        }
    }

    fn span(&self, leg: usize, step: usize) -> Option<&StepSpan> {
        let first = *self.leg_first_span.get(leg)?;
        if step >= self.step_count(leg) {
            return None;
        }
        self.spans.get(first + step)
    }

    /// Last span whose start is ≤ `distance_m` and which has positive length,
    /// falling back to the final span at or past the end of the route.
    fn span_index(&self, distance_m: f64) -> usize {
        if distance_m >= self.total_distance_m {
            return self.spans.len() - 1;
        }
        let upper = self.spans.partition_point(|s| s.start_m <= distance_m);
        (0..upper)
            .rev()
            .find(|&i| self.spans[i].length_m > 0.0)
            .unwrap_or(0)
    }

    fn segment_at(&self, distance_m: f64) -> &Segment {
        let upper = self.segments.partition_point(|s| s.start_m <= distance_m);
        &self.segments[upper.saturating_sub(1)]
    }

    fn step_remaining_secs(&self, span: &StepSpan, distance_m: f64) -> f64 {
        if span.length_m <= 0.0 {
            return if distance_m >= self.total_distance_m { 0.0 } else { span.duration_secs };
        }
        let remaining = (span.start_m + span.length_m - distance_m).clamp(0.0, span.length_m);
        span.duration_secs * remaining / span.length_m
    }
}

#[derive(Copy, Clone, Debug)]
struct Candidate {
    seg:       usize,
    t:         f64,
    lateral_m: f64,
    along_m:   f64,
}

fn interpolate(a: GeoPoint, b: GeoPoint, t: f64) -> GeoPoint {
    GeoPoint::new(a.lat + (b.lat - a.lat) * t, a.lon + (b.lon - a.lon) * t)
}

fn validate_step(leg: usize, step: usize, s: &RouteStep) -> RouteResult<()> {
    let bad = |what: &str| RouteError::Degenerate(format!("leg {leg} step {step}: {what}"));

    if s.geometry.is_empty() {
        return Err(bad("empty geometry"));
    }
    if !s.geometry.iter().all(|p| p.is_valid()) || !s.maneuver.is_valid() {
        return Err(bad("invalid coordinate"));
    }
    if !(s.duration_secs.is_finite() && s.duration_secs >= 0.0) {
        return Err(bad("duration must be finite and non-negative"));
    }
    if s.spoken.len() > MAX_SPOKEN_PER_STEP {
        return Err(RouteError::TooManyInstructions {
            leg,
            step,
            count: s.spoken.len(),
            max: MAX_SPOKEN_PER_STEP,
        });
    }
    let triggers = s
        .spoken
        .iter()
        .map(|i| i.trigger_distance_m)
        .chain(s.visual.iter().map(|v| v.trigger_distance_m));
    for t in triggers {
        if !(t.is_finite() && t >= 0.0) {
            return Err(bad("instruction trigger distance must be finite and non-negative"));
        }
    }
    Ok(())
}

// ── RouteBuilder ──────────────────────────────────────────────────────────────

/// Incremental construction of a [`RouteGeometry`].
///
/// ```ignore
/// let route = RouteBuilder::new()
///     .step(RouteStep::new(vec![a, b], 30.0))
///     .step(RouteStep::new(vec![b, c], 20.0))
///     .end_leg(Waypoint::new(c))
///     .build()?;
/// ```
#[derive(Default)]
pub struct RouteBuilder {
    legs:    Vec<RouteLeg>,
    pending: Vec<RouteStep>,
}

impl RouteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step to the leg under construction.
    pub fn step(mut self, step: RouteStep) -> Self {
        self.pending.push(step);
        self
    }

    /// Close the leg under construction at `destination`.
    pub fn end_leg(mut self, destination: Waypoint) -> Self {
        let steps = std::mem::take(&mut self.pending);
        self.legs.push(RouteLeg::new(steps, destination));
        self
    }

    /// Validate and build.  Steps added after the last `end_leg` form a final
    /// leg ending at their last vertex.
    pub fn build(mut self) -> RouteResult<RouteGeometry> {
        if !self.pending.is_empty() {
            let end = self
                .pending
                .last()
                .and_then(|s| s.geometry.last().copied())
                .ok_or_else(|| RouteError::Degenerate("trailing step has empty geometry".into()))?;
            self = self.end_leg(Waypoint::new(end));
        }
        RouteGeometry::from_legs(self.legs)
    }
}
