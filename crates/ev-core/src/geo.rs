//! Geographic coordinate type.
//!
//! `GeoPoint` uses `f32` latitude/longitude, which gives ~1 m precision at
//! the equator; stop and charger positions never need more.

/// A WGS-84 geographic coordinate stored as single-precision floats.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f32,
    pub lon: f32,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f32, lon: f32) -> Self {
        Self { lat, lon }
    }

    /// Haversine great-circle distance in metres.
    ///
    /// Computed in `f64` so that the result is a proper metric (the triangle
    /// inequality holds up to rounding), which the A* lower bound relies on.
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        const R: f64 = 6_371_000.0; // mean Earth radius, metres

        let lat1 = (self.lat as f64).to_radians();
        let lat2 = (other.lat as f64).to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.lon as f64 - self.lon as f64).to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

        2.0 * R * a.sqrt().atan2((1.0 - a).max(0.0).sqrt())
    }

    /// Extra distance of passing through `via` on the way from `self` to
    /// `to`, compared to going directly.
    pub fn detour_m(self, via: GeoPoint, to: GeoPoint) -> f64 {
        (self.distance_m(via) + via.distance_m(to) - self.distance_m(to)).max(0.0)
    }

    /// `[lat, lon]` key for R-tree lookups.
    #[inline]
    pub fn as_array(self) -> [f32; 2] {
        [self.lat, self.lon]
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}
