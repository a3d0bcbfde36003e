//! Thermal classification of complete trajectories
//!
//! Every point but the last gets an asymmetry B from the bearing to its
//! successor; the last point keeps the not-computed sentinel. Points are then
//! labelled in phase space and counted against the thermal signature of the
//! archetype being tracked.

use tracing::debug;

use crate::config::{CycloneType, TrackerConfig, STRICT_CORE_CRITERIA};
use crate::core_types::{is_missing, GeoPoint, NOT_COMPUTED};
use crate::error::Result;
use crate::grid::UpperAirField;
use crate::thermal::hart_b::hart_b;
use crate::thermal::phase::{classify_phase, CyclonePhase};
use crate::thermal::thermal_wind::{thermal_wind, ThermalWind, ThermalWindMode};

/// One trajectory point as seen by the classifier
#[derive(Debug, Clone, Copy)]
pub struct ThermalSample<'a> {
    /// Centre position
    pub position: GeoPoint,
    /// Thermal wind stored with the point
    pub wind: ThermalWind,
    /// Geopotential heights at the point's timestep, when available
    pub upper_air: Option<&'a UpperAirField>,
}

/// Per-point parameters and the archetype verdict
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalAssessment {
    /// Thermal wind per point
    pub winds: Vec<ThermalWind>,
    /// Asymmetry B per point
    pub b: Vec<f64>,
    /// Phase label per point
    pub phases: Vec<CyclonePhase>,
    /// Points (excluding the last) with the archetype's thermal signature
    pub matching_points: usize,
    /// Whether the trajectory passes the thermal gate
    pub accepted: bool,
}

/// Computes thermal parameters with the thresholds of a configuration
pub struct ThermalClassifier<'a> {
    config: &'a TrackerConfig,
    mode: ThermalWindMode,
}

impl<'a> ThermalClassifier<'a> {
    pub fn new(config: &'a TrackerConfig) -> Self {
        Self {
            config,
            mode: ThermalWindMode::from_regression(config.vtl_vtu_regression),
        }
    }

    /// Slope estimator in use
    pub fn mode(&self) -> ThermalWindMode {
        self.mode
    }

    /// Thermal wind at `center`, or `fallback` when upper-air checking is
    /// off or no heights are available
    ///
    /// # Errors
    /// Returns [`crate::error::TrackerError::MissingPressureLevel`] if the
    /// heights lack a mandatory level.
    pub fn thermal_wind_at(
        &self,
        upper_air: Option<&UpperAirField>,
        center: GeoPoint,
        fallback: ThermalWind,
    ) -> Result<ThermalWind> {
        match upper_air {
            Some(field) if self.config.upper_air => {
                thermal_wind(field, center, *self.config.max_dist, self.mode)
            }
            _ => Ok(fallback),
        }
    }

    /// Whether one point carries the archetype's thermal signature
    pub fn matches_archetype(&self, wind: ThermalWind, b: f64) -> bool {
        let cfg = self.config;
        if is_missing(wind.vtu) || is_missing(wind.vtl) || is_missing(b) {
            return false;
        }
        let (vtu, vtl) = (wind.vtu, wind.vtl);
        match cfg.cyclone_type {
            CycloneType::Tc | CycloneType::Tlc => {
                vtu > cfg.vtu_threshold && vtl > cfg.vtl_threshold && b.abs() < cfg.bhart_threshold
            }
            CycloneType::Ec => {
                vtu < cfg.vtu_threshold && vtl < cfg.vtl_threshold && b.abs() > cfg.bhart_threshold
            }
            CycloneType::Sc => {
                vtu < cfg.vtu_threshold && vtl > cfg.vtl_threshold && b.abs() < cfg.bhart_threshold
            }
            CycloneType::Mc => true,
        }
    }

    /// Classify a trajectory.
    ///
    /// Without upper-air checking every parameter is marked not computed,
    /// every phase is undefined and the trajectory is accepted.
    ///
    /// # Errors
    /// Returns [`crate::error::TrackerError::MissingPressureLevel`] if the
    /// heights of any point lack a level the thermal wind mode needs.
    pub fn assess(&self, track: &[ThermalSample<'_>]) -> Result<ThermalAssessment> {
        let cfg = self.config;
        let n = track.len();
        if !cfg.upper_air {
            return Ok(ThermalAssessment {
                winds: vec![ThermalWind::NOT_COMPUTED; n],
                b: vec![NOT_COMPUTED; n],
                phases: vec![CyclonePhase::Undefined; n],
                matching_points: 0,
                accepted: true,
            });
        }

        for field in track.iter().filter_map(|s| s.upper_air) {
            self.mode.check_levels(field)?;
        }
        let mut b = vec![NOT_COMPUTED; n];
        for i in 0..n.saturating_sub(1) {
            if let Some(field) = track[i].upper_air {
                b[i] = hart_b(field, track[i].position, track[i + 1].position, *cfg.max_dist)?;
            }
        }

        let winds: Vec<ThermalWind> = track.iter().map(|s| s.wind).collect();
        let phases = winds
            .iter()
            .zip(&b)
            .map(|(w, &bi)| classify_phase(w.vtu, w.vtl, bi, cfg.bhart_threshold))
            .collect();

        let considered = n.saturating_sub(1);
        let matching_points = (0..considered)
            .filter(|&i| self.matches_archetype(winds[i], b[i]))
            .count();
        let accepted = match cfg.cyclone_type {
            CycloneType::Mc => true,
            _ if cfg.core_criteria_length == STRICT_CORE_CRITERIA => matching_points == considered,
            _ => matching_points >= usize::try_from(cfg.core_criteria_length).unwrap_or(0),
        };
        debug!(points = n, matching_points, accepted, "thermal assessment");

        Ok(ThermalAssessment {
            winds,
            b,
            phases,
            matching_points,
            accepted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackerError;
    use crate::grid::{GeoGrid, ScalarField};

    fn config(cyclone_type: CycloneType, core_criteria_length: i32) -> TrackerConfig {
        let mut c = TrackerConfig::for_cyclone_type(cyclone_type);
        c.upper_air = true;
        c.core_criteria_length = core_criteria_length;
        c
    }

    fn warm(vtu: f64, vtl: f64) -> ThermalWind {
        ThermalWind { vtu, vtl }
    }

    /// Uniform thickness so every B is zero
    fn flat_upper(center: GeoPoint) -> UpperAirField {
        let grid = GeoGrid::regular(center.lat - 6.0, center.lon - 6.0, 0.5, 0.5, 25, 25);
        let levels = [900.0, 600.0, 300.0]
            .iter()
            .map(|&level| {
                let height = 10_000.0 - level * 10.0;
                (level, ScalarField::with_value(grid.width, grid.height, height))
            })
            .collect();
        UpperAirField::new(grid, levels).unwrap()
    }

    fn samples<'a>(field: &'a UpperAirField, winds: &[ThermalWind]) -> Vec<ThermalSample<'a>> {
        winds
            .iter()
            .enumerate()
            .map(|(i, &wind)| ThermalSample {
                position: GeoPoint::new(20.0 + 0.5 * i as f64, -50.0),
                wind,
                upper_air: Some(field),
            })
            .collect()
    }

    #[test]
    fn test_warm_core_tropical_track_accepted() {
        let cfg = config(CycloneType::Tc, 3);
        let field = flat_upper(GeoPoint::new(21.0, -50.0));
        let winds = vec![warm(40.0, 30.0); 5];
        let a = ThermalClassifier::new(&cfg).assess(&samples(&field, &winds)).unwrap();
        assert_eq!(a.matching_points, 4);
        assert!(a.accepted);
        assert_eq!(a.b[4], NOT_COMPUTED);
        assert_eq!(a.phases[0], CyclonePhase::SymmetricDeepWarm);
        assert_eq!(a.phases[4], CyclonePhase::Undefined);
    }

    #[test]
    fn test_core_criteria_count_and_strict_mode() {
        let field = flat_upper(GeoPoint::new(21.0, -50.0));
        let winds = vec![
            warm(40.0, 30.0),
            warm(-5.0, 30.0),
            warm(40.0, 30.0),
            warm(40.0, 30.0),
            warm(-5.0, -5.0),
        ];
        let track = samples(&field, &winds);

        let cfg = config(CycloneType::Tc, 3);
        let a = ThermalClassifier::new(&cfg).assess(&track).unwrap();
        assert_eq!(a.matching_points, 3);
        assert!(a.accepted);

        let cfg = config(CycloneType::Tc, 4);
        assert!(!ThermalClassifier::new(&cfg).assess(&track).unwrap().accepted);

        let cfg = config(CycloneType::Tc, STRICT_CORE_CRITERIA);
        assert!(!ThermalClassifier::new(&cfg).assess(&track).unwrap().accepted);
        // The last point is never counted
        let mut all_warm = vec![warm(40.0, 30.0); 4];
        all_warm.push(warm(-5.0, -5.0));
        assert!(ThermalClassifier::new(&cfg).assess(&samples(&field, &all_warm)).unwrap().accepted);
    }

    #[test]
    fn test_subtropical_and_mediterranean_rules() {
        let field = flat_upper(GeoPoint::new(21.0, -50.0));
        let cfg = config(CycloneType::Sc, 2);
        let hybrid = vec![warm(-20.0, -10.0); 3];
        assert!(ThermalClassifier::new(&cfg).assess(&samples(&field, &hybrid)).unwrap().accepted);

        let cfg = config(CycloneType::Mc, 50);
        let cold = vec![warm(-20.0, -20.0); 2];
        assert!(ThermalClassifier::new(&cfg).assess(&samples(&field, &cold)).unwrap().accepted);
    }

    #[test]
    fn test_missing_parameters_never_match() {
        let cfg = config(CycloneType::Ec, 1);
        let classifier = ThermalClassifier::new(&cfg);
        assert!(classifier.matches_archetype(warm(-20.0, -20.0), 30.0));
        assert!(!classifier.matches_archetype(warm(-20.0, -20.0), NOT_COMPUTED));
        assert!(!classifier.matches_archetype(ThermalWind::NOT_COMPUTED, 30.0));
    }

    #[test]
    fn test_without_upper_air_everything_is_sentinel() {
        let mut cfg = config(CycloneType::Tc, 3);
        cfg.upper_air = false;
        let track: Vec<ThermalSample<'_>> = (0..3)
            .map(|i| ThermalSample {
                position: GeoPoint::new(10.0 + f64::from(i), -40.0),
                wind: warm(0.0, 0.0),
                upper_air: None,
            })
            .collect();
        let a = ThermalClassifier::new(&cfg).assess(&track).unwrap();
        assert!(a.accepted);
        assert!(a.b.iter().all(|&b| b == NOT_COMPUTED));
        assert!(a.phases.iter().all(|&p| p == CyclonePhase::Undefined));
        assert_eq!(a.winds, vec![ThermalWind::NOT_COMPUTED; 3]);
    }

    #[test]
    fn test_missing_upper_level_fails_the_track() {
        let cfg = config(CycloneType::Tc, 3);
        let center = GeoPoint::new(21.0, -50.0);
        let flat = flat_upper(center);
        let (w, h) = (flat.grid.width, flat.grid.height);
        let truncated = UpperAirField::new(
            flat.grid.clone(),
            vec![
                (900.0, ScalarField::with_value(w, h, 1000.0)),
                (600.0, ScalarField::with_value(w, h, 4000.0)),
            ],
        )
        .unwrap();
        let winds = vec![warm(40.0, 30.0); 3];
        let mut track = samples(&flat, &winds);
        track[1].upper_air = Some(&truncated);

        let err = ThermalClassifier::new(&cfg).assess(&track).unwrap_err();
        assert!(matches!(
            err,
            TrackerError::MissingPressureLevel {
                level_hpa: 300,
                regression: false
            }
        ));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_thermal_wind_fallback() {
        let mut cfg = config(CycloneType::Tc, 3);
        let classifier = ThermalClassifier::new(&cfg);
        let zero = warm(0.0, 0.0);
        assert_eq!(
            classifier.thermal_wind_at(None, GeoPoint::new(20.0, -50.0), zero).unwrap(),
            zero
        );
        cfg.upper_air = false;
        let field = flat_upper(GeoPoint::new(20.0, -50.0));
        let classifier = ThermalClassifier::new(&cfg);
        assert_eq!(
            classifier
                .thermal_wind_at(Some(&field), GeoPoint::new(20.0, -50.0), zero)
                .unwrap(),
            zero
        );
    }
}
