//! Geographic coordinate type and spatial utilities.
//!
//! `GeoPoint` uses `f64` latitude/longitude.  Route matching compares
//! lateral offsets of a few metres, so single precision (≈1 m at the
//! equator) is not enough here.
//!
//! Bearings are degrees clockwise from true north in `[0, 360)`.

/// Mean Earth radius, metres.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS-84 geographic coordinate.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// `true` if both components are finite and inside the WGS-84 ranges.
    pub fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Haversine great-circle distance in metres.
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());
        EARTH_RADIUS_M * c
    }

    /// Initial great-circle bearing from `self` towards `other`, in `[0, 360)`.
    pub fn bearing_to(self, other: GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let y = d_lon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

        normalize_bearing(y.atan2(x).to_degrees())
    }

    /// The point reached by travelling `distance_m` metres from `self` along
    /// the initial bearing `bearing_deg`.
    pub fn destination(self, bearing_deg: f64, distance_m: f64) -> GeoPoint {
        let delta = distance_m / EARTH_RADIUS_M;
        let theta = bearing_deg.to_radians();
        let lat1 = self.lat.to_radians();
        let lon1 = self.lon.to_radians();

        let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
        let lon2 = lon1
            + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

        GeoPoint::new(lat2.to_degrees(), (lon2.to_degrees() + 540.0) % 360.0 - 180.0)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

// ── Bearings ──────────────────────────────────────────────────────────────────

/// Wrap any angle in degrees into `[0, 360)`.
#[inline]
pub fn normalize_bearing(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Smallest absolute angle between two bearings, in `[0, 180]`.
///
/// `bearing_difference(359.0, 1.0) == 2.0`.
#[inline]
pub fn bearing_difference(a: f64, b: f64) -> f64 {
    let d = (normalize_bearing(a) - normalize_bearing(b)).abs();
    if d > 180.0 { 360.0 - d } else { d }
}

// ── LocalFrame ────────────────────────────────────────────────────────────────

/// Equirectangular projection around a fixed origin, in metres.
///
/// `x` grows east, `y` grows north.  Distortion stays well under 1 % for the
/// extent of a single route (a few hundred kilometres at mid latitudes),
/// which is what the segment index and point-to-segment projection need.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalFrame {
    origin:     GeoPoint,
    cos_origin: f64,
}

impl LocalFrame {
    pub fn new(origin: GeoPoint) -> Self {
        Self { origin, cos_origin: origin.lat.to_radians().cos() }
    }

    pub fn origin(&self) -> GeoPoint {
        self.origin
    }

    /// Project `p` into local `[x, y]` metres.
    #[inline]
    pub fn to_xy(&self, p: GeoPoint) -> [f64; 2] {
        let x = (p.lon - self.origin.lon).to_radians() * EARTH_RADIUS_M * self.cos_origin;
        let y = (p.lat - self.origin.lat).to_radians() * EARTH_RADIUS_M;
        [x, y]
    }

    /// Inverse of [`to_xy`](Self::to_xy).
    #[inline]
    pub fn to_geo(&self, xy: [f64; 2]) -> GeoPoint {
        let lat = self.origin.lat + (xy[1] / EARTH_RADIUS_M).to_degrees();
        let lon = self.origin.lon + (xy[0] / (EARTH_RADIUS_M * self.cos_origin)).to_degrees();
        GeoPoint::new(lat, lon)
    }
}
