//! Local minima of a field under a square moving-window minimum
//!
//! The window is clamped at the edges, which matches replicating the edge
//! values outward. The 2D minimum is separable, so rows and columns are
//! filtered in two passes.

use rayon::prelude::*;

use crate::grid::field::ScalarField;

/// Window width used for pressure minima, in grid nodes
pub const PRESSURE_MINIMUM_WINDOW: usize = 25;

/// Moving minimum of `field` over a `size` x `size` window
pub fn minimum_filter(field: &ScalarField, size: usize) -> ScalarField {
    let (w, h) = (field.width, field.height);
    let half = size / 2;

    let mut rows = vec![0.0; w * h];
    rows.par_chunks_mut(w.max(1))
        .enumerate()
        .for_each(|(y, out_row)| {
            let row = &field.data[y * w..(y + 1) * w];
            for x in 0..w {
                let lo = x.saturating_sub(half);
                let hi = (x + half).min(w - 1);
                out_row[x] = row[lo..=hi].iter().copied().fold(f64::INFINITY, f64::min);
            }
        });

    let mut out = ScalarField::new(w, h);
    out.data
        .par_chunks_mut(w.max(1))
        .enumerate()
        .for_each(|(y, out_row)| {
            let lo = y.saturating_sub(half);
            let hi = (y + half).min(h - 1);
            for x in 0..w {
                out_row[x] = (lo..=hi)
                    .map(|yy| rows[yy * w + x])
                    .fold(f64::INFINITY, f64::min);
            }
        });
    out
}

/// Flat indices of nodes equal to their neighbourhood minimum.
///
/// A field smaller than the window along either axis has no minima.
pub fn local_minima(field: &ScalarField, size: usize) -> Vec<usize> {
    if field.width < size || field.height < size {
        return Vec::new();
    }
    let filtered = minimum_filter(field, size);
    field
        .data
        .iter()
        .zip(&filtered.data)
        .enumerate()
        .filter(|(_, (value, min))| value.is_finite() && value == min)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_minimum_is_found() {
        let (w, h) = (40, 30);
        let mut field = ScalarField::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let d = ((x as f64 - 20.0).powi(2) + (y as f64 - 12.0).powi(2)).sqrt();
                field.set(x, y, 1000.0 + d);
            }
        }
        assert_eq!(local_minima(&field, 25), vec![12 * w + 20]);
    }

    #[test]
    fn test_two_separated_minima() {
        let (w, h) = (80, 30);
        let mut field = ScalarField::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let d1 = ((x as f64 - 15.0).powi(2) + (y as f64 - 15.0).powi(2)).sqrt();
                let d2 = ((x as f64 - 60.0).powi(2) + (y as f64 - 15.0).powi(2)).sqrt();
                field.set(x, y, 990.0 + d1.min(d2 + 0.5));
            }
        }
        let minima = local_minima(&field, 25);
        assert_eq!(minima, vec![15 * w + 15, 15 * w + 60]);
    }

    #[test]
    fn test_field_smaller_than_window() {
        let field = ScalarField::with_value(10, 40, 1000.0);
        assert!(local_minima(&field, 25).is_empty());
    }

    #[test]
    fn test_edge_clamping() {
        let mut field = ScalarField::with_value(5, 1, 3.0);
        field.set(0, 0, 1.0);
        let filtered = minimum_filter(&field, 3);
        assert_eq!(filtered.data, vec![1.0, 1.0, 3.0, 3.0, 3.0]);
    }
}
