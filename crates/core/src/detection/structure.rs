//! Structural characterisation of candidate centres
//!
//! Each candidate is re-centred on the polar pressure minimum, then tested
//! for a significant pressure deficit, strong enough winds near the core,
//! and a closed outermost isobar. Every polar quantity is resampled from the
//! model grid by nearest neighbour.
//!
//! # Theory
//!
//! The radius of the outermost closed isobar (ROCI) is the radius of the
//! circle with the same area as the polygon traced by the closing pressure
//! along each radial leg:
//!
//! ```text
//! A = Σ r_{i-1} r_i sin(Δθ) / 2,    ROCI = sqrt(A / π)
//! ```

use nalgebra::{Rotation2, Vector2};
use std::f64::consts::PI;
use tracing::{debug, warn};

use crate::config::TrackerConfig;
use crate::core_types::{GeoPoint, UNDEFINED};
use crate::detection::{Candidate, CriticalCenter};
use crate::geometry::{haversine, sector_area, PolarGrid, KM_PER_DEGREE};
use crate::grid::{NearestSampler, SurfaceFields};

/// Upper bound on re-centring steps
pub const MAX_RECENTER_ITERATIONS: usize = 50;

/// Largest pressure rise (hPa) between samples still treated as flat
const FLAT_RISE_TOLERANCE: f64 = 1e-5;

/// Outer pressure that forces at least one ROCI sampling pass
const INITIAL_OUTER_PRESSURE: f64 = 900.0;

/// Extra radius (km) sampled beyond the great-circle ring while re-centring
const RECENTER_MARGIN_KM: f64 = 100.0;

/// Result of re-centring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recentered {
    /// Refined centre
    pub position: GeoPoint,
    /// Refined minimum pressure in hPa
    pub min_pressure: f64,
    /// Mean pressure sampled beyond the great-circle ring, hPa
    pub outer_ring_pressure: f64,
}

/// Outermost closed isobar; both values are zero when none was found
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClosedIsobar {
    /// Closing pressure in hPa
    pub closed_pressure: f64,
    /// Equivalent radius in km
    pub roci: f64,
}

impl ClosedIsobar {
    /// A closed contour was found
    pub fn is_closed(&self) -> bool {
        self.closed_pressure > 0.0
    }
}

/// Characterises candidates against one timestep of surface fields
pub struct StructureCharacterizer<'a> {
    config: &'a TrackerConfig,
    fields: &'a SurfaceFields,
    sampler: NearestSampler,
}

impl<'a> StructureCharacterizer<'a> {
    /// Index the grid of `fields` for polar resampling
    pub fn new(config: &'a TrackerConfig, fields: &'a SurfaceFields) -> Self {
        Self {
            config,
            fields,
            sampler: NearestSampler::new(&fields.grid),
        }
    }

    /// Full characterisation; `None` when any structural test fails
    pub fn characterize(&self, candidate: &Candidate) -> Option<CriticalCenter> {
        let cfg = self.config;
        let rc = self.recenter(candidate.position, candidate.pressure);

        let deficit_pa = (rc.outer_ring_pressure - rc.min_pressure) * 100.0;
        if !deficit_pa.is_finite() || deficit_pa < cfg.dmslp_great_circle_distance {
            debug!(lat = rc.position.lat, lon = rc.position.lon, deficit_pa, "pressure deficit too small");
            return None;
        }

        let max_wind = self.peak_wind(rc.position);
        if max_wind < *cfg.max_wind_speed_threshold {
            debug!(lat = rc.position.lat, lon = rc.position.lon, max_wind, "peak wind too weak");
            return None;
        }

        let outer_radius = self.outer_wind_radius(rc.position);
        let isobar = self.closed_isobar(rc.position, rc.min_pressure);
        if !(isobar.roci >= *cfg.critical_outer_radius || isobar.is_closed()) {
            debug!(lat = rc.position.lat, lon = rc.position.lon, "no closed isobar");
            return None;
        }

        Some(CriticalCenter {
            position: rc.position,
            min_pressure: rc.min_pressure,
            max_wind,
            closed_pressure: isobar.closed_pressure,
            roci: isobar.roci,
            outer_radius,
            vtu: 0.0,
            vtl: 0.0,
            consumed: false,
        })
    }

    /// Walk to the polar pressure minimum inside the refinement radius.
    ///
    /// Moves while a strictly lower pressure is found strictly inside the
    /// search box, for at most [`MAX_RECENTER_ITERATIONS`] steps.
    pub fn recenter(&self, start: GeoPoint, pressure: f64) -> Recentered {
        let cfg = self.config;
        let ring_km = cfg.great_circle_distance * KM_PER_DEGREE;
        let search_km = ring_km + RECENTER_MARGIN_KM;
        let refine_km = cfg.refinement_radius();
        let mslp = self.fields.mslp.as_slice();

        let mut center = start;
        let mut min_pressure = pressure;
        let mut iterations = 0;
        loop {
            let grid = PolarGrid::new(center, cfg.d_ang, *cfg.model_res, search_km);
            let samples = self.sampler.sample(mslp, grid.points());
            let n = grid.leg_len();

            let mut best: Option<(usize, f64)> = None;
            let mut outer_sum = 0.0;
            let mut outer_count = 0usize;
            for (k, &p) in samples.iter().enumerate() {
                if p.is_nan() {
                    continue;
                }
                let r = grid.radii[k % n];
                if r > ring_km {
                    outer_sum += p;
                    outer_count += 1;
                }
                if r <= refine_km {
                    let lower = match best {
                        None => true,
                        Some((_, bp)) => p < bp,
                    };
                    if lower {
                        best = Some((k, p));
                    }
                }
            }

            let step = best
                .map(|(k, p)| (grid.points()[k], p))
                .filter(|&(next, p)| p < min_pressure && cfg.search_box.contains_strict(next));
            if let Some((next, p)) = step {
                if iterations < MAX_RECENTER_ITERATIONS {
                    center = next;
                    min_pressure = p;
                    iterations += 1;
                    continue;
                }
                warn!(lat = center.lat, lon = center.lon, "re-centring did not settle");
            }

            let outer_ring_pressure = if outer_count > 0 {
                outer_sum / outer_count as f64
            } else {
                f64::NAN
            };
            return Recentered {
                position: center,
                min_pressure,
                outer_ring_pressure,
            };
        }
    }

    /// Largest wind speed within `radius_for_msw` of `center`, or
    /// [`UNDEFINED`] when no grid node lies that close
    pub fn peak_wind(&self, center: GeoPoint) -> f64 {
        let radius = *self.config.radius_for_msw;
        let grid = &self.fields.grid;
        let mut peak: Option<f64> = None;
        for i in 0..grid.len() {
            if haversine(center, grid.point(i)) <= radius {
                let speed = self.fields.u.data[i].hypot(self.fields.v.data[i]);
                if speed.is_finite() {
                    peak = Some(peak.map_or(speed, |p: f64| p.max(speed)));
                }
            }
        }
        peak.unwrap_or(UNDEFINED)
    }

    /// Mean radius (km) where the azimuthal wind drops below
    /// `outer_wind_speed_threshold`, or [`UNDEFINED`]
    pub fn outer_wind_radius(&self, center: GeoPoint) -> f64 {
        let cfg = self.config;
        let threshold = *cfg.outer_wind_speed_threshold;
        let grid = PolarGrid::new(center, cfg.d_ang, *cfg.dr_res, *cfg.rout);
        let u = self.sampler.sample(self.fields.u.as_slice(), grid.points());
        let v = self.sampler.sample(self.fields.v.as_slice(), grid.points());
        let sense = center.hemisphere_sign();
        let n = grid.leg_len();

        let azimuthal: Vec<f64> = (0..u.len())
            .map(|k| {
                let theta = grid.angles[k / n];
                let local = Rotation2::new(-theta) * Vector2::new(u[k], v[k]);
                sense * local.y
            })
            .collect();

        let mut radii = Vec::new();
        for leg_idx in 0..grid.leg_count() {
            if let Some(r) = leg_crossing_outward(grid.leg(&azimuthal, leg_idx), &grid.radii, threshold) {
                radii.push(r);
            }
        }
        if radii.is_empty() {
            return UNDEFINED;
        }
        let mean = radii.iter().sum::<f64>() / radii.len() as f64;
        if mean > 0.0 {
            mean
        } else {
            UNDEFINED
        }
    }

    /// Outermost closed isobar around `center` given the refined minimum
    pub fn closed_isobar(&self, center: GeoPoint, min_pressure: f64) -> ClosedIsobar {
        let cfg = self.config;
        let dr = *cfg.dr_res;
        let mslp = self.fields.mslp.as_slice();

        // Shrink the polar grid until every leg ends above the minimum
        let mut radius = *cfg.rout;
        let mut outer_pressure = INITIAL_OUTER_PRESSURE;
        let mut sampled: Option<(PolarGrid, Vec<f64>)> = None;
        while outer_pressure < min_pressure {
            if radius < 1.5 * dr {
                sampled = None;
                break;
            }
            let grid = PolarGrid::new(center, cfg.d_ang, dr, radius);
            let p = self.sampler.sample(mslp, grid.points());
            outer_pressure = (0..grid.leg_count())
                .filter_map(|i| grid.leg(&p, i).last().copied())
                .fold(f64::INFINITY, f64::min);
            sampled = Some((grid, p));
            radius -= dr;
        }
        let Some((grid, p)) = sampled.filter(|_| outer_pressure > min_pressure) else {
            return ClosedIsobar::default();
        };
        if grid.leg_len() < 2 {
            warn!(lat = center.lat, lon = center.lon, "polar grid too small for a closed isobar");
            return ClosedIsobar::default();
        }

        // First flat step outward on each leg, else its outer end; the first
        // leg repeats the last and is skipped
        let first_step = if *cfg.model_res > 50.0 { 1 } else { 3 };
        let closed_pressure = (1..grid.leg_count())
            .map(|i| {
                let leg = grid.leg(&p, i);
                (first_step..leg.len().saturating_sub(1))
                    .find(|&j| {
                        let rise = leg[j] - leg[j - 1];
                        (0.0..=FLAT_RISE_TOLERANCE).contains(&rise)
                    })
                    .map_or(leg[leg.len() - 1], |j| leg[j])
            })
            .fold(f64::INFINITY, f64::min);
        if !closed_pressure.is_finite() || closed_pressure <= min_pressure {
            return ClosedIsobar::default();
        }

        let contour_radii: Vec<f64> = (0..grid.leg_count())
            .map(|i| contour_radius(grid.leg(&p, i), &grid.radii, closed_pressure))
            .collect();
        let area: f64 = (1..contour_radii.len())
            .map(|i| {
                sector_area(
                    contour_radii[i - 1],
                    contour_radii[i],
                    grid.angles[i] - grid.angles[i - 1],
                )
            })
            .sum();
        let roci = (area / PI).sqrt();
        if !roci.is_finite() {
            warn!(lat = center.lat, lon = center.lon, "degenerate closed isobar geometry");
            return ClosedIsobar::default();
        }
        ClosedIsobar {
            closed_pressure,
            roci,
        }
    }
}

/// Radius where a leg's value, walking outward from its maximum, last
/// exceeds `threshold`; `None` when the maximum does not exceed it
fn leg_crossing_outward(values: &[f64], radii: &[f64], threshold: f64) -> Option<f64> {
    let mut imax = None;
    for (k, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match imax {
            Some(m) if values[m] >= v => {}
            _ => imax = Some(k),
        }
    }
    let imax = imax?;
    if values[imax] <= threshold {
        return None;
    }
    let mut k = imax;
    while k + 1 < values.len() && values[k + 1] > threshold {
        k += 1;
    }
    if k + 1 == values.len() {
        return Some(radii[k]);
    }
    let (v0, v1) = (values[k], values[k + 1]);
    if v1.is_nan() || v0 == v1 {
        return Some(radii[k]);
    }
    Some(radii[k] + (v0 - threshold) / (v0 - v1) * (radii[k + 1] - radii[k]))
}

/// Radius where pressure first reaches `contour` moving outward, with the
/// contour clamped to the range of the leg
fn contour_radius(leg: &[f64], radii: &[f64], contour: f64) -> f64 {
    let (lo, hi) = leg
        .iter()
        .filter(|v| !v.is_nan())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return f64::NAN;
    }
    let c = contour.clamp(lo, hi);
    let Some(j) = leg.iter().position(|&v| v >= c) else {
        return radii[radii.len() - 1];
    };
    if j == 0 {
        return radii[0];
    }
    let (p0, p1) = (leg[j - 1], leg[j]);
    if p0.is_nan() || p1 == p0 {
        return radii[j];
    }
    radii[j - 1] + (c - p0) / (p1 - p0) * (radii[j] - radii[j - 1])
}
