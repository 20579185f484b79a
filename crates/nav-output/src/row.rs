//! Plain data rows written by recorder backends.

/// One processed fix: where guidance thinks the traveler is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressRow {
    pub time_secs:               f64,
    pub route_id:                u32,
    pub leg_index:               usize,
    pub step_index:              usize,
    pub distance_traveled_m:     f64,
    pub distance_remaining_m:    f64,
    pub duration_remaining_secs: f64,
    pub fraction_traveled:       f64,
    /// Snapped position.
    pub lat:                     f64,
    pub lon:                     f64,
    /// Position as reported.
    pub raw_lat:                 f64,
    pub raw_lon:                 f64,
}

/// Any non-progress event, flattened to its kind and a readable detail.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    pub time_secs: f64,
    /// Route that was active when the event fired (the new one for reroutes).
    pub route_id:  u32,
    pub kind:      &'static str,
    pub detail:    String,
}
