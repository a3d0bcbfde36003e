//! Thermal asymmetry parameter B (Hart 2003)
//!
//! B compares the mean 900–600 hPa thickness to the right and to the left of
//! the storm motion within `max_dist` of the centre:
//!
//! ```text
//! B = h · (Z600 − Z900)|right − (Z600 − Z900)|left
//! ```
//!
//! with `h = +1` in the Northern Hemisphere and `−1` in the Southern. Side
//! means are weighted by cos(latitude). Nodes exactly along the heading and
//! zero thickness values are left out.

use crate::core_types::{GeoPoint, NOT_COMPUTED};
use crate::error::{Result, TrackerError};
use crate::geometry::{bearing, haversine};
use crate::grid::UpperAirField;

/// Top of the thickness layer, hPa
pub const THICKNESS_TOP_HPA: f64 = 600.0;

/// Bottom of the thickness layer, hPa
pub const THICKNESS_BOTTOM_HPA: f64 = 900.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Right,
    Left,
}

/// Side of the motion vector a node lies on, from the bearing of the motion
/// and the bearing of the node, both in degrees
fn side_of(heading: f64, node_bearing: f64) -> Option<Side> {
    if node_bearing == heading {
        return None;
    }
    let right = if heading < 180.0 {
        node_bearing > heading && node_bearing < heading + 180.0
    } else {
        !(node_bearing > heading - 180.0 && node_bearing < heading)
    };
    Some(if right { Side::Right } else { Side::Left })
}

#[derive(Default)]
struct WeightedMean {
    sum: f64,
    weight: f64,
}

impl WeightedMean {
    fn add(&mut self, value: f64, weight: f64) {
        self.sum += value * weight;
        self.weight += weight;
    }

    fn value(&self) -> Option<f64> {
        (self.weight > 0.0).then(|| self.sum / self.weight)
    }
}

/// Asymmetry B at `center` for a storm heading towards `next`.
///
/// Returns [`NOT_COMPUTED`] when either side has no usable node.
///
/// # Errors
/// Returns [`TrackerError::MissingPressureLevel`] if 900 or 600 hPa is absent.
pub fn hart_b(field: &UpperAirField, center: GeoPoint, next: GeoPoint, max_dist_km: f64) -> Result<f64> {
    let level = |hpa: f64| {
        field.heights(hpa).ok_or(TrackerError::MissingPressureLevel {
            level_hpa: hpa as u32,
            regression: false,
        })
    };
    let top = level(THICKNESS_TOP_HPA)?;
    let bottom = level(THICKNESS_BOTTOM_HPA)?;

    let heading = bearing(center, next);
    let mut right = WeightedMean::default();
    let mut left = WeightedMean::default();
    for i in 0..field.grid.len() {
        let node = field.grid.point(i);
        if haversine(center, node) > max_dist_km {
            continue;
        }
        let thickness = top.data[i] - bottom.data[i];
        if thickness == 0.0 || !thickness.is_finite() {
            continue;
        }
        let weight = node.lat.to_radians().cos();
        match side_of(heading, bearing(center, node)) {
            Some(Side::Right) => right.add(thickness, weight),
            Some(Side::Left) => left.add(thickness, weight),
            None => {}
        }
    }

    let (Some(r), Some(l)) = (right.value(), left.value()) else {
        return Ok(NOT_COMPUTED);
    };
    let b = (r - l).trunc();
    Ok(if center.lat < 0.0 { -b } else { b })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GeoGrid, ScalarField};
    use crate::synthetic::local_offset_km;

    /// Thickness rising eastward by `gradient` metres per 100 km
    fn gradient_field(center: GeoPoint, gradient: f64) -> UpperAirField {
        let grid = GeoGrid::regular(center.lat - 8.0, center.lon - 8.0, 0.25, 0.25, 65, 65);
        let bottom = ScalarField::with_value(grid.width, grid.height, 1000.0);
        let top = ScalarField::from_fn(&grid, |p| {
            let (dx, _) = local_offset_km(center, p);
            1000.0 + 3000.0 + gradient * dx / 100.0
        });
        UpperAirField::new(grid, vec![(900.0, bottom), (600.0, top)]).unwrap()
    }

    #[test]
    fn test_side_of_heading() {
        assert_eq!(side_of(0.0, 90.0), Some(Side::Right));
        assert_eq!(side_of(0.0, 270.0), Some(Side::Left));
        assert_eq!(side_of(0.0, 0.0), None);
        assert_eq!(side_of(270.0, 0.0), Some(Side::Right));
        assert_eq!(side_of(270.0, 180.0), Some(Side::Left));
    }

    #[test]
    fn test_warm_side_on_the_right_is_positive() {
        let c = GeoPoint::new(30.0, -50.0);
        let field = gradient_field(c, 10.0);
        let north = hart_b(&field, c, GeoPoint::new(31.0, -50.0), 500.0).unwrap();
        assert!(north > 10.0, "B {north}");
        let south = hart_b(&field, c, GeoPoint::new(29.0, -50.0), 500.0).unwrap();
        assert!(south < -10.0, "B {south}");
    }

    #[test]
    fn test_southern_hemisphere_sign_flip() {
        let c = GeoPoint::new(-30.0, 150.0);
        let field = gradient_field(c, 10.0);
        let b = hart_b(&field, c, GeoPoint::new(-29.0, 150.0), 500.0).unwrap();
        assert!(b < -10.0, "B {b}");
    }

    #[test]
    fn test_uniform_thickness_is_symmetric() {
        let c = GeoPoint::new(30.0, -50.0);
        let field = gradient_field(c, 0.0);
        let b = hart_b(&field, c, GeoPoint::new(31.0, -49.0), 500.0).unwrap();
        assert!(b.abs() <= 1.0, "B {b}");
    }

    #[test]
    fn test_missing_thickness_level() {
        let grid = GeoGrid::regular(0.0, 0.0, 1.0, 1.0, 3, 3);
        let f = ScalarField::with_value(3, 3, 1000.0);
        let field = UpperAirField::new(grid, vec![(900.0, f)]).unwrap();
        let err = hart_b(&field, GeoPoint::new(1.0, 1.0), GeoPoint::new(2.0, 1.0), 500.0).unwrap_err();
        assert!(matches!(err, TrackerError::MissingPressureLevel { level_hpa: 600, .. }));
    }
}
