//! Relative vorticity on a latitude/longitude grid
//!
//! ζ = ∂v/∂x − (1 / cos φ) ∂(u cos φ)/∂y, with centred differences in the
//! interior and one-sided differences on the edges. The cyclonic form
//! multiplies by the hemisphere sign so cyclonic rotation is positive on
//! both sides of the equator.

use crate::core_types::longitude_delta;
use crate::geometry::EARTH_RADIUS_KM;
use crate::grid::field::{GeoGrid, ScalarField};

/// Metres per degree of arc
const METERS_PER_DEGREE: f64 = EARTH_RADIUS_KM * 1000.0 * std::f64::consts::PI / 180.0;

/// Relative vorticity (s⁻¹) of the wind (`u`, `v`).
///
/// Grids with fewer than two nodes along either axis yield a zero field.
pub fn relative_vorticity(grid: &GeoGrid, u: &ScalarField, v: &ScalarField) -> ScalarField {
    let (w, h) = (grid.width, grid.height);
    let mut out = ScalarField::new(w, h);
    if w < 2 || h < 2 {
        return out;
    }
    let lat = grid.lats();
    let lon = grid.lons();
    let at = |x: usize, y: usize| y * w + x;

    for y in 0..h {
        let (y0, y1) = if y == 0 {
            (0, 1)
        } else if y == h - 1 {
            (h - 2, h - 1)
        } else {
            (y - 1, y + 1)
        };
        for x in 0..w {
            let (x0, x1) = if x == 0 {
                (0, 1)
            } else if x == w - 1 {
                (w - 2, w - 1)
            } else {
                (x - 1, x + 1)
            };
            let i = at(x, y);
            let cos_lat = lat[i].to_radians().cos();

            let dx = METERS_PER_DEGREE * longitude_delta(lon[at(x0, y)], lon[at(x1, y)]) * cos_lat;
            let dvdx = (v.data[at(x1, y)] - v.data[at(x0, y)]) / dx;

            let (i0, i1) = (at(x, y0), at(x, y1));
            let dy = METERS_PER_DEGREE * (lat[i1] - lat[i0]);
            let dudy = (u.data[i1] * lat[i1].to_radians().cos()
                - u.data[i0] * lat[i0].to_radians().cos())
                / (dy * cos_lat);

            out.data[i] = dvdx - dudy;
        }
    }
    out
}

/// Relative vorticity with the sign flipped south of the equator
pub fn cyclonic_vorticity(grid: &GeoGrid, u: &ScalarField, v: &ScalarField) -> ScalarField {
    let mut zeta = relative_vorticity(grid, u, v);
    for (value, lat) in zeta.data.iter_mut().zip(grid.lats()) {
        if *lat < 0.0 {
            *value = -*value;
        }
    }
    zeta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::GeoPoint;
    use crate::synthetic::cyclonic_vortex;

    #[test]
    fn test_uniform_flow_has_no_vorticity_along_x() {
        let grid = GeoGrid::regular(-5.0, 0.0, 0.5, 0.5, 20, 20);
        let u = ScalarField::new(20, 20);
        let v = ScalarField::with_value(20, 20, 10.0);
        let zeta = relative_vorticity(&grid, &u, &v);
        assert!(zeta.data.iter().all(|z| z.abs() < 1e-12));
    }

    #[test]
    fn test_solid_body_rotation_near_equator() {
        let grid = GeoGrid::regular(-5.0, -5.0, 0.25, 0.25, 41, 41);
        let center = GeoPoint::new(0.0, 0.0);
        let (u, v) = cyclonic_vortex(&grid, center, 20.0, 300.0);
        let zeta = relative_vorticity(&grid, &u, &v);
        // Solid-body core: 2 * vmax / rmax
        let expected = 2.0 * 20.0 / 300_000.0;
        let mid = zeta.get(20, 20);
        assert!((mid - expected).abs() / expected < 0.05, "zeta {mid} vs {expected}");
    }

    #[test]
    fn test_small_grid_is_zero() {
        let grid = GeoGrid::regular(0.0, 0.0, 1.0, 1.0, 1, 5);
        let u = ScalarField::with_value(1, 5, 3.0);
        let v = ScalarField::with_value(1, 5, 3.0);
        assert!(relative_vorticity(&grid, &u, &v).data.iter().all(|&z| z == 0.0));
    }
}
