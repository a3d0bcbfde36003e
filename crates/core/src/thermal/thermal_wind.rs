//! Cyclone thermal wind (Hart 2003)
//!
//! For every pressure level the height perturbation ΔZ is the range
//! (max − min) of geopotential height within `max_dist` of the centre. The
//! thermal wind of a layer is the slope of ΔZ against ln(p):
//!
//! ```text
//! VT = ∂(ΔZ) / ∂ln(p)
//! ```
//!
//! Positive values mean a warm core, negative a cold core. The lower layer
//! (VTL) spans 900–600 hPa and the upper layer (VTU) 600–300 hPa. Endpoint
//! mode uses the two bounding levels; regression mode fits an ordinary
//! least-squares line through seven levels per layer.

use crate::core_types::{GeoPoint, NOT_COMPUTED};
use crate::error::{Result, TrackerError};
use crate::geometry::haversine;
use crate::grid::UpperAirField;

/// Levels of the lower layer for regression mode, hPa
pub const LOWER_LAYER_LEVELS: [f64; 7] = [900.0, 850.0, 800.0, 750.0, 700.0, 650.0, 600.0];

/// Levels of the upper layer for regression mode, hPa
pub const UPPER_LAYER_LEVELS: [f64; 7] = [600.0, 550.0, 500.0, 450.0, 400.0, 350.0, 300.0];

/// How the layer slope is estimated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermalWindMode {
    /// Slope between the bounding levels of each layer
    Endpoint,
    /// Least-squares slope across seven levels per layer
    Regression,
}

impl ThermalWindMode {
    /// Mode selected by the regression toggle
    pub fn from_regression(regression: bool) -> Self {
        if regression {
            Self::Regression
        } else {
            Self::Endpoint
        }
    }

    /// Levels of the lower and upper layers, outermost level first
    pub fn layers(self) -> (Vec<f64>, Vec<f64>) {
        match self {
            Self::Endpoint => (vec![900.0, 600.0], vec![600.0, 300.0]),
            Self::Regression => (LOWER_LAYER_LEVELS.to_vec(), UPPER_LAYER_LEVELS.to_vec()),
        }
    }

    /// Verify that every level of both layers is present
    ///
    /// # Errors
    /// Returns [`TrackerError::MissingPressureLevel`] naming the first absent level.
    pub fn check_levels(self, field: &UpperAirField) -> Result<()> {
        let (lower, upper) = self.layers();
        for level in lower.into_iter().chain(upper) {
            if field.heights(level).is_none() {
                return Err(TrackerError::MissingPressureLevel {
                    level_hpa: level as u32,
                    regression: self == Self::Regression,
                });
            }
        }
        Ok(())
    }
}

/// Lower and upper thermal wind of one point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalWind {
    /// 600–300 hPa
    pub vtu: f64,
    /// 900–600 hPa
    pub vtl: f64,
}

impl ThermalWind {
    /// Both values marked as not computed
    pub const NOT_COMPUTED: Self = Self {
        vtu: NOT_COMPUTED,
        vtl: NOT_COMPUTED,
    };
}

/// Thermal wind around `center`.
///
/// Returns [`ThermalWind::NOT_COMPUTED`] when no grid node lies within
/// `max_dist_km`.
///
/// # Errors
/// Returns [`TrackerError::MissingPressureLevel`] if the field lacks a level
/// the mode needs.
pub fn thermal_wind(
    field: &UpperAirField,
    center: GeoPoint,
    max_dist_km: f64,
    mode: ThermalWindMode,
) -> Result<ThermalWind> {
    mode.check_levels(field)?;
    let nearby: Vec<usize> = (0..field.grid.len())
        .filter(|&i| haversine(center, field.grid.point(i)) <= max_dist_km)
        .collect();
    if nearby.is_empty() {
        return Ok(ThermalWind::NOT_COMPUTED);
    }

    let (lower, upper) = mode.layers();
    let vtl = layer_slope(field, &nearby, &lower, mode)?;
    let vtu = layer_slope(field, &nearby, &upper, mode)?;
    Ok(ThermalWind { vtu, vtl })
}

fn layer_slope(
    field: &UpperAirField,
    nearby: &[usize],
    levels: &[f64],
    mode: ThermalWindMode,
) -> Result<f64> {
    let mut ln_p = Vec::with_capacity(levels.len());
    let mut dz = Vec::with_capacity(levels.len());
    for &level in levels {
        let heights = field.heights(level).ok_or(TrackerError::MissingPressureLevel {
            level_hpa: level as u32,
            regression: mode == ThermalWindMode::Regression,
        })?;
        let (lo, hi) = nearby
            .iter()
            .map(|&i| heights.data[i])
            .filter(|z| z.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), z| (lo.min(z), hi.max(z)));
        if !lo.is_finite() {
            return Ok(NOT_COMPUTED);
        }
        ln_p.push((level * 100.0).ln());
        dz.push((hi - lo).trunc());
    }

    let slope = match mode {
        ThermalWindMode::Endpoint => {
            let last = ln_p.len() - 1;
            (dz[last] - dz[0]) / (ln_p[last] - ln_p[0])
        }
        ThermalWindMode::Regression => least_squares_slope(&ln_p, &dz),
    };
    Ok(if slope.is_finite() { slope.trunc() } else { NOT_COMPUTED })
}

/// Ordinary least-squares slope of `ys` against `xs`
pub fn least_squares_slope(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len()) as f64;
    if n < 2.0 {
        return f64::NAN;
    }
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let (sxy, sxx) = xs
        .iter()
        .zip(ys)
        .fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
            (sxy + (x - mean_x) * (y - mean_y), sxx + (x - mean_x).powi(2))
        });
    sxy / sxx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GeoGrid, ScalarField};
    use crate::synthetic::local_offset_km;
    use approx::assert_relative_eq;

    /// Heights whose central depression varies with level as `depression(level)`
    fn core_field(levels: &[f64], depression: impl Fn(f64) -> f64) -> UpperAirField {
        let grid = GeoGrid::regular(10.0, -50.0, 0.25, 0.25, 81, 81);
        let center = GeoPoint::new(20.0, -40.0);
        let levels = levels
            .iter()
            .map(|&level| {
                let d = depression(level);
                let f = ScalarField::from_fn(&grid, |p| {
                    let (dx, dy) = local_offset_km(center, p);
                    let r2 = (dx * dx + dy * dy) / (300.0 * 300.0);
                    5000.0 - d * (-r2).exp()
                });
                (level, f)
            })
            .collect();
        UpperAirField::new(grid, levels).unwrap()
    }

    fn all_levels() -> Vec<f64> {
        (0..13).map(|k| 900.0 - 50.0 * f64::from(k)).collect()
    }

    #[test]
    fn test_warm_core_is_positive() {
        let field = core_field(&all_levels(), |level| 60.0 + 40.0 * (level / 900.0).ln());
        let center = GeoPoint::new(20.0, -40.0);
        for mode in [ThermalWindMode::Endpoint, ThermalWindMode::Regression] {
            let tw = thermal_wind(&field, center, 500.0, mode).unwrap();
            assert!(tw.vtl > 0.0, "{mode:?} vtl {}", tw.vtl);
            assert!(tw.vtu > 0.0, "{mode:?} vtu {}", tw.vtu);
        }
    }

    #[test]
    fn test_cold_core_is_negative() {
        let field = core_field(&all_levels(), |level| 60.0 - 40.0 * (level / 900.0).ln());
        let tw = thermal_wind(&field, GeoPoint::new(20.0, -40.0), 500.0, ThermalWindMode::Endpoint)
            .unwrap();
        assert!(tw.vtl < 0.0 && tw.vtu < 0.0);
    }

    #[test]
    fn test_missing_level_reported() {
        let field = core_field(&[900.0, 600.0], |_| 50.0);
        let err = thermal_wind(&field, GeoPoint::new(20.0, -40.0), 500.0, ThermalWindMode::Endpoint)
            .unwrap_err();
        assert!(matches!(
            err,
            TrackerError::MissingPressureLevel {
                level_hpa: 300,
                regression: false
            }
        ));

        let field = core_field(&[900.0, 600.0, 300.0], |_| 50.0);
        let err = ThermalWindMode::Regression.check_levels(&field).unwrap_err();
        assert!(matches!(
            err,
            TrackerError::MissingPressureLevel {
                level_hpa: 850,
                regression: true
            }
        ));
    }

    #[test]
    fn test_far_centre_not_computed() {
        let field = core_field(&all_levels(), |_| 50.0);
        let tw =
            thermal_wind(&field, GeoPoint::new(-60.0, 100.0), 500.0, ThermalWindMode::Endpoint).unwrap();
        assert_eq!(tw, ThermalWind::NOT_COMPUTED);
    }

    #[test]
    fn test_least_squares_slope() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [3.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(least_squares_slope(&xs, &ys), 2.0);
        assert!(least_squares_slope(&[1.0], &[1.0]).is_nan());
    }
}
