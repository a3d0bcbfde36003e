//! Nearest-neighbour resampling from the model grid onto arbitrary points
//!
//! Nodes are bucketed into square cells in (lon, lat) degree space. A query
//! visits rings of cells around its own cell until no unvisited cell can hold
//! a closer node, so lookups stay local even on large grids. Ties resolve to
//! the lowest node index, which keeps results deterministic.

use crate::core_types::{normalize_longitude, GeoPoint};
use crate::grid::field::GeoGrid;

/// Spatial bucket index over the nodes of a [`GeoGrid`]
#[derive(Debug, Clone)]
pub struct NearestSampler {
    cells: Vec<Vec<u32>>,
    cols: usize,
    rows: usize,
    cell_size: f64,
    origin: (f64, f64),
    lons: Vec<f64>,
    lats: Vec<f64>,
}

impl NearestSampler {
    /// Index every node of `grid`
    pub fn new(grid: &GeoGrid) -> Self {
        let lons = grid.lons().to_vec();
        let lats = grid.lats().to_vec();
        let n = lons.len();

        let (min_lon, max_lon) = min_max(&lons);
        let (min_lat, max_lat) = min_max(&lats);
        let span_lon = (max_lon - min_lon).max(0.0);
        let span_lat = (max_lat - min_lat).max(0.0);

        // About four nodes per cell on a regular grid
        let area = span_lon * span_lat;
        let mut cell_size = if n > 0 && area > 0.0 {
            2.0 * (area / n as f64).sqrt()
        } else if n > 0 {
            span_lon.max(span_lat) / n as f64
        } else {
            1.0
        };
        if !cell_size.is_finite() || cell_size <= 0.0 {
            cell_size = 1.0;
        }

        let cols = ((span_lon / cell_size).floor() as usize + 1).max(1);
        let rows = ((span_lat / cell_size).floor() as usize + 1).max(1);
        let mut sampler = Self {
            cells: vec![Vec::new(); cols * rows],
            cols,
            rows,
            cell_size,
            origin: (min_lon, min_lat),
            lons,
            lats,
        };
        for idx in 0..n {
            let (cx, cy) = sampler.cell_of(sampler.lons[idx], sampler.lats[idx]);
            sampler.cells[cy * cols + cx].push(idx as u32);
        }
        sampler
    }

    fn cell_of(&self, lon: f64, lat: f64) -> (usize, usize) {
        let clamp = |v: f64, n: usize| -> usize {
            if v.is_nan() || v < 0.0 {
                0
            } else {
                (v.floor() as usize).min(n - 1)
            }
        };
        (
            clamp((lon - self.origin.0) / self.cell_size, self.cols),
            clamp((lat - self.origin.1) / self.cell_size, self.rows),
        )
    }

    /// Flat index of the node closest to `p` in degree space, with
    /// longitudes compared across the antimeridian
    pub fn nearest_index(&self, p: GeoPoint) -> Option<usize> {
        if self.lons.is_empty() || !p.is_finite() {
            return None;
        }
        let lon = normalize_longitude(p.lon);
        let min_lon = self.origin.0;
        let max_lon = min_lon + self.cols as f64 * self.cell_size;

        let mut best = self.search(lon, p.lat, None);
        // Node longitudes may use a 0..360 convention or straddle ±180
        for image in [lon - 360.0, lon + 360.0] {
            let gap = if image < min_lon {
                min_lon - image
            } else if image > max_lon {
                image - max_lon
            } else {
                0.0
            };
            let reachable = match best {
                Some((bd, _)) => gap * gap <= bd,
                None => true,
            };
            if reachable {
                best = self.search(image, p.lat, best);
            }
        }
        best.map(|(_, idx)| idx as usize)
    }

    /// Ring search around (`lon`, `lat`) improving on `best`
    fn search(&self, lon: f64, lat: f64, mut best: Option<(f64, u32)>) -> Option<(f64, u32)> {
        let (cx, cy) = self.cell_of(lon, lat);
        let max_ring = self.cols.max(self.rows);

        for ring in 0..=max_ring {
            let ring_i = ring as isize;
            for dy in -ring_i..=ring_i {
                for dx in -ring_i..=ring_i {
                    if dx.abs() != ring_i && dy.abs() != ring_i {
                        continue;
                    }
                    let (x, y) = (cx as isize + dx, cy as isize + dy);
                    if x < 0 || y < 0 || x >= self.cols as isize || y >= self.rows as isize {
                        continue;
                    }
                    for &idx in &self.cells[y as usize * self.cols + x as usize] {
                        let i = idx as usize;
                        let d = (self.lons[i] - lon).powi(2) + (self.lats[i] - lat).powi(2);
                        let closer = match best {
                            None => true,
                            Some((bd, bi)) => d < bd || (d == bd && idx < bi),
                        };
                        if closer {
                            best = Some((d, idx));
                        }
                    }
                }
            }
            // Cells beyond this ring are at least `ring * cell_size` away
            if let Some((bd, _)) = best {
                let reach = ring as f64 * self.cell_size;
                if bd.sqrt() <= reach {
                    break;
                }
            }
        }
        best
    }

    /// Sample `values` (one per grid node) at the nearest node of each point.
    ///
    /// Points off the grid take the value of the closest edge node. NaN comes
    /// back only for an empty grid, a non-finite point or a short `values`.
    pub fn sample(&self, values: &[f64], points: &[GeoPoint]) -> Vec<f64> {
        points
            .iter()
            .map(|&p| {
                self.nearest_index(p)
                    .and_then(|i| values.get(i).copied())
                    .unwrap_or(f64::NAN)
            })
            .collect()
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    let (lo, hi) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo.is_finite() && hi.is_finite() {
        (lo, hi)
    } else {
        (0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::longitude_delta;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn wrapped_sq(a: GeoPoint, b: GeoPoint) -> f64 {
        longitude_delta(a.lon, b.lon).powi(2) + (a.lat - b.lat).powi(2)
    }

    fn brute_force(grid: &GeoGrid, p: GeoPoint) -> usize {
        let mut best = (f64::INFINITY, 0);
        for i in 0..grid.len() {
            let q = grid.point(i);
            let d = wrapped_sq(q, p);
            if d < best.0 {
                best = (d, i);
            }
        }
        best.1
    }

    #[test]
    fn test_matches_brute_force() {
        let grid = GeoGrid::regular(-20.0, -60.0, 0.25, 0.25, 80, 60);
        let sampler = NearestSampler::new(&grid);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            // Includes points well outside the grid
            let p = GeoPoint::new(rng.random_range(-30.0..5.0), rng.random_range(-70.0..-30.0));
            let found = sampler.nearest_index(p).unwrap();
            let expected = brute_force(&grid, p);
            let (a, b) = (grid.point(found), grid.point(expected));
            assert!(
                (wrapped_sq(a, p) - wrapped_sq(b, p)).abs() < 1e-12,
                "query {p:?}: {found} vs {expected}"
            );
        }
    }

    #[test]
    fn test_search_wraps_across_antimeridian() {
        // Longitudes 170..180 then -179..-170
        let grid = GeoGrid::regular(-2.0, 170.0, 1.0, 1.0, 21, 5);
        let sampler = NearestSampler::new(&grid);
        let lon_at = |lon: f64| grid.point(sampler.nearest_index(GeoPoint::new(0.0, lon)).unwrap()).lon;
        assert_eq!(lon_at(179.6), 180.0);
        assert_eq!(lon_at(-179.8), 180.0);
        assert_eq!(lon_at(185.3), -175.0);
        assert_eq!(lon_at(-169.2), -170.0);

        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..300 {
            let p = GeoPoint::new(rng.random_range(-4.0..4.0), rng.random_range(165.0..195.0));
            let found = sampler.nearest_index(p).unwrap();
            let expected = brute_force(&grid, p);
            let (a, b) = (grid.point(found), grid.point(expected));
            assert!(
                (wrapped_sq(a, p) - wrapped_sq(b, p)).abs() < 1e-12,
                "query {p:?}: {found} vs {expected}"
            );
        }
    }

    #[test]
    fn test_points_off_grid_take_edge_values() {
        let grid = GeoGrid::regular(0.0, 0.0, 1.0, 1.0, 3, 3);
        let sampler = NearestSampler::new(&grid);
        let values: Vec<f64> = (0..9).map(f64::from).collect();
        let out = sampler.sample(&values, &[GeoPoint::new(-5.0, -5.0), GeoPoint::new(10.0, 1.0)]);
        assert_eq!(out, vec![0.0, 7.0]);
        assert!(sampler.sample(&values[..4], &[GeoPoint::new(2.0, 2.0)])[0].is_nan());
    }

    #[test]
    fn test_exact_node_hit() {
        let grid = GeoGrid::regular(0.0, 0.0, 1.0, 1.0, 5, 5);
        let sampler = NearestSampler::new(&grid);
        let values: Vec<f64> = (0..25).map(f64::from).collect();
        let out = sampler.sample(&values, &[GeoPoint::new(2.0, 3.0), GeoPoint::new(4.2, 0.1)]);
        assert_eq!(out, vec![13.0, 20.0]);
    }

    #[test]
    fn test_empty_grid_yields_nan() {
        let grid = GeoGrid::regular(0.0, 0.0, 1.0, 1.0, 0, 0);
        let sampler = NearestSampler::new(&grid);
        assert!(sampler.nearest_index(GeoPoint::new(0.0, 0.0)).is_none());
        assert!(sampler.sample(&[], &[GeoPoint::new(0.0, 0.0)])[0].is_nan());
    }
}
