//! Geographic positions and sentinel values shared across the pipeline

use serde::{Deserialize, Serialize};

/// Marker written for quantities that were never computed
/// (thermal parameters without upper-air data, asymmetry of the last point).
pub const NOT_COMPUTED: f64 = -99999.0;

/// Marker for a radius or wind that could not be determined
pub const UNDEFINED: f64 = -9999.0;

/// Whether a value is missing: a sentinel or not finite
#[inline]
pub fn is_missing(value: f64) -> bool {
    !value.is_finite() || value <= UNDEFINED
}

/// A point on the sphere in degrees.
///
/// Longitudes are kept in (-180, 180]; use [`GeoPoint::new`] to normalise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees north
    pub lat: f64,
    /// Longitude in degrees east
    pub lon: f64,
}

impl GeoPoint {
    /// Create a point, normalising the longitude into (-180, 180]
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon: normalize_longitude(lon),
        }
    }

    /// Both coordinates are finite
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// Hemisphere sign used to express cyclonic rotation as positive
    pub fn hemisphere_sign(&self) -> f64 {
        if self.lat >= 0.0 {
            1.0
        } else {
            -1.0
        }
    }
}

/// Wrap a longitude into (-180, 180]
#[must_use]
pub fn normalize_longitude(lon: f64) -> f64 {
    if !lon.is_finite() {
        return lon;
    }
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 {
        180.0
    } else {
        wrapped
    }
}

/// Signed longitude difference `to - from` wrapped into (-180, 180]
#[must_use]
pub fn longitude_delta(from: f64, to: f64) -> f64 {
    normalize_longitude(to - from)
}
