//! Candidate cyclone centres from one timestep of surface fields
//!
//! A candidate is a node equal to the minimum of its 25×25 neighbourhood in
//! sea-level pressure. Candidates are dropped when they are too shallow, sit
//! on high terrain, lack cyclonic vorticity, or fall outside the search box.

use tracing::debug;

use crate::config::TrackerConfig;
use crate::core_types::GeoPoint;
use crate::grid::minimum_filter::{local_minima, PRESSURE_MINIMUM_WINDOW};
use crate::grid::vorticity::cyclonic_vorticity;
use crate::grid::{ScalarField, SurfaceFields};

/// A local pressure minimum that passed the point-wise filters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Grid node position
    pub position: GeoPoint,
    /// Sea-level pressure in hPa
    pub pressure: f64,
    /// Pressure minus the climatological baseline, when the filter is active
    pub anomaly: Option<f64>,
    /// Terrain height in metres, when terrain filtering is active
    pub terrain: Option<f64>,
    /// Cyclonic relative vorticity in s⁻¹
    pub vorticity: f64,
}

/// Finds and filters pressure minima
pub struct CenterDetector<'a> {
    config: &'a TrackerConfig,
}

impl<'a> CenterDetector<'a> {
    /// Detector using the thresholds of `config`
    pub fn new(config: &'a TrackerConfig) -> Self {
        Self { config }
    }

    /// Candidates of one timestep.
    ///
    /// `anomaly` is only consulted when the anomaly filter is enabled; when it
    /// is enabled but no baseline was available the anomaly test is skipped.
    pub fn detect(&self, fields: &SurfaceFields, anomaly: Option<&ScalarField>) -> Vec<Candidate> {
        let minima = local_minima(&fields.mslp, PRESSURE_MINIMUM_WINDOW);
        if minima.is_empty() {
            return Vec::new();
        }
        let vorticity = cyclonic_vorticity(&fields.grid, &fields.u, &fields.v);
        let anomaly = anomaly.filter(|_| self.config.anomaly_enabled());
        let terrain = fields
            .terrain
            .as_ref()
            .filter(|_| self.config.terrain_filter > 0.0);

        let total = minima.len();
        let candidates: Vec<Candidate> = minima
            .into_iter()
            .map(|idx| Candidate {
                position: fields.grid.point(idx),
                pressure: fields.mslp.data[idx],
                anomaly: anomaly.and_then(|a| a.data.get(idx).copied()),
                terrain: terrain.and_then(|t| t.data.get(idx).copied()),
                vorticity: vorticity.data[idx],
            })
            .filter(|c| self.accepts(c))
            .collect();
        debug!(minima = total, kept = candidates.len(), "pressure minima filtered");
        candidates
    }

    /// Whether a candidate passes every point-wise test
    pub fn accepts(&self, c: &Candidate) -> bool {
        let cfg = self.config;
        if !c.position.is_finite() || !c.pressure.is_finite() {
            return false;
        }
        if c.pressure > *cfg.min_slp_threshold {
            return false;
        }
        if let Some(a) = c.anomaly {
            if a > *cfg.mslp_anomaly_threshold {
                return false;
            }
        }
        if let Some(t) = c.terrain {
            if t > cfg.terrain_filter {
                return false;
            }
        }
        if c.vorticity.is_nan() || c.vorticity < cfg.vorticity_threshold {
            return false;
        }
        cfg.search_box.contains(c.position)
    }
}
