//! Spherical geometry and polar sampling grids
//!
//! Distances are computed on a sphere of radius 6371 km. Polar grids are
//! laid out in degree space around a centre using the flat conversion of
//! 111 km per degree for both coordinates, so a ring of radius `r` is a
//! circle in (lon, lat) and an ellipse on the ground away from the equator.
//!
//! # References
//! - Great-circle distance via the dot product of unit vectors
//! - Initial bearing: `atan2(cos φ2 sin Δλ, cos φ1 sin φ2 − sin φ1 cos φ2 cos Δλ)`

use nalgebra::Vector3;
use std::f64::consts::PI;

use crate::core_types::{longitude_delta, GeoPoint};

/// Mean Earth radius in km
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Flat conversion used for polar grid offsets
pub const KM_PER_DEGREE: f64 = 111.0;

fn unit_vector(p: GeoPoint) -> Vector3<f64> {
    let (lat, lon) = (p.lat.to_radians(), p.lon.to_radians());
    Vector3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
}

/// Great-circle distance in km.
///
/// Exactly symmetric in its arguments; the dot product is clamped so
/// rounding cannot push it outside the domain of `acos`.
pub fn great_circle_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let dot = unit_vector(a).dot(&unit_vector(b)).clamp(-1.0, 1.0);
    EARTH_RADIUS_KM * dot.acos()
}

/// Haversine distance in km, used for radius masks around a centre
pub fn haversine(a: GeoPoint, b: GeoPoint) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = longitude_delta(a.lon, b.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().clamp(0.0, 1.0).asin()
}

/// Initial bearing from `from` to `to` in degrees clockwise from north, in [0, 360)
pub fn bearing(from: GeoPoint, to: GeoPoint) -> f64 {
    let (phi1, phi2) = (from.lat.to_radians(), to.lat.to_radians());
    let dlon = longitude_delta(from.lon, to.lon).to_radians();
    let x = phi2.cos() * dlon.sin();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlon.cos();
    let deg = x.atan2(y).to_degrees();
    (deg + 360.0) % 360.0
}

/// Smallest angle in radians between two headings given in degrees
pub fn turning_angle(heading_a: f64, heading_b: f64) -> f64 {
    let diff = (heading_b - heading_a).rem_euclid(360.0);
    diff.min(360.0 - diff).to_radians()
}

/// Area of the triangle spanned by two radii `r1`, `r2` separated by `dtheta` radians
pub fn sector_area(r1: f64, r2: f64, dtheta: f64) -> f64 {
    0.5 * r1 * r2 * dtheta.sin().abs()
}

/// Length of `arange(0, stop, step)`, robust to rounding of exact multiples
pub(crate) fn arange_len(stop: f64, step: f64) -> usize {
    if step <= 0.0 || stop <= 0.0 {
        return 0;
    }
    ((stop / step) - 1e-9).ceil().max(0.0) as usize
}

/// Polar sampling grid around a centre.
///
/// Points are stored angle-major: leg `i` (one angle) holds the samples at
/// every radius, outward from the centre. Angles run from 0 to 2π inclusive
/// so the first and last legs coincide.
#[derive(Debug, Clone)]
pub struct PolarGrid {
    /// Grid centre
    pub center: GeoPoint,
    /// Angles in radians, counter-clockwise from east
    pub angles: Vec<f64>,
    /// Radii in km, starting at zero
    pub radii: Vec<f64>,
    points: Vec<GeoPoint>,
}

impl PolarGrid {
    /// Build a grid with angular step `d_angle_deg`, radial step `dr_km`
    /// and outer radius `radius_km` (inclusive when it is a multiple of the step).
    pub fn new(center: GeoPoint, d_angle_deg: f64, dr_km: f64, radius_km: f64) -> Self {
        let dth = d_angle_deg.to_radians();
        let angles: Vec<f64> = (0..arange_len(2.0 * PI + dth, dth))
            .map(|i| i as f64 * dth)
            .collect();
        let radii: Vec<f64> = (0..arange_len(radius_km + dr_km, dr_km))
            .map(|j| j as f64 * dr_km)
            .collect();

        let mut points = Vec::with_capacity(angles.len() * radii.len());
        for &theta in &angles {
            for &r in &radii {
                let offset = r / KM_PER_DEGREE;
                points.push(GeoPoint::new(
                    center.lat + offset * theta.sin(),
                    center.lon + offset * theta.cos(),
                ));
            }
        }

        Self {
            center,
            angles,
            radii,
            points,
        }
    }

    /// All sample positions, angle-major
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// Number of angular legs
    pub fn leg_count(&self) -> usize {
        self.angles.len()
    }

    /// Samples per leg
    pub fn leg_len(&self) -> usize {
        self.radii.len()
    }

    /// Slice of `values` (laid out like [`Self::points`]) belonging to leg `i`
    pub fn leg<'a>(&self, values: &'a [f64], i: usize) -> &'a [f64] {
        let n = self.radii.len();
        &values[i * n..(i + 1) * n]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_symmetry_and_antimeridian() {
        let a = GeoPoint::new(10.0, 179.5);
        let b = GeoPoint::new(10.0, -179.5);
        assert_eq!(great_circle_distance(a, b), great_circle_distance(b, a));
        // One degree of longitude at 10N
        let expected = EARTH_RADIUS_KM * 1.0_f64.to_radians() * 10.0_f64.to_radians().cos();
        assert_relative_eq!(great_circle_distance(a, b), expected, max_relative = 1e-3);
        assert_relative_eq!(haversine(a, b), great_circle_distance(a, b), max_relative = 1e-6);
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        let p = GeoPoint::new(-33.9, 151.2);
        assert_relative_eq!(great_circle_distance(p, p), 0.0, epsilon = 1e-3);
        assert_relative_eq!(haversine(p, p), 0.0);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = GeoPoint::new(0.0, 0.0);
        assert_relative_eq!(bearing(origin, GeoPoint::new(1.0, 0.0)), 0.0);
        assert_relative_eq!(bearing(origin, GeoPoint::new(0.0, 1.0)), 90.0);
        assert_relative_eq!(bearing(origin, GeoPoint::new(-1.0, 0.0)), 180.0);
        assert_relative_eq!(bearing(origin, GeoPoint::new(0.0, -1.0)), 270.0);
    }

    #[test]
    fn test_turning_angle_wraps() {
        assert_relative_eq!(turning_angle(350.0, 10.0), 20.0_f64.to_radians(), epsilon = 1e-12);
        assert_relative_eq!(turning_angle(0.0, 90.0), PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(turning_angle(45.0, 45.0), 0.0);
    }

    #[test]
    fn test_polar_grid_layout() {
        let grid = PolarGrid::new(GeoPoint::new(0.0, 0.0), 10.0, 100.0, 1000.0);
        assert_eq!(grid.leg_count(), 37);
        assert_eq!(grid.leg_len(), 11);
        assert_eq!(grid.points().len(), 37 * 11);
        assert_relative_eq!(*grid.radii.last().unwrap(), 1000.0);
        assert_relative_eq!(*grid.angles.last().unwrap(), 2.0 * PI, epsilon = 1e-9);
        // Leg 9 points north
        let north = grid.points()[9 * 11 + 10];
        assert_relative_eq!(north.lat, 1000.0 / KM_PER_DEGREE, epsilon = 1e-9);
        assert_relative_eq!(north.lon, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_arange_len_matches_half_open_range() {
        assert_eq!(arange_len(730.5, 20.0), 37);
        assert_eq!(arange_len(1100.0, 100.0), 11);
        assert_eq!(arange_len(0.0, 1.0), 0);
    }

    #[test]
    fn test_sector_area_of_full_circle_approaches_pi_r_squared() {
        let r = 500.0;
        let dth = 10.0_f64.to_radians();
        let area: f64 = (0..36).map(|_| sector_area(r, r, dth)).sum();
        assert_relative_eq!(area / (PI * r * r), 0.99493, epsilon = 1e-4);
    }
}
