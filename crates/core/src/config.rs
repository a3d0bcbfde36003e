//! Tracker configuration
//!
//! A [`TrackerConfig`] is resolved once per run and passed by reference to
//! every stage; nothing in the pipeline mutates it. Defaults depend on the
//! cyclone archetype, so configuration files are decoded into a sparse
//! [`ConfigFile`] first and then filled from
//! [`TrackerConfig::for_cyclone_type`].

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::core_types::{GeoPoint, Hectopascals, Hours, Kilometers, MetersPerSecond};
use crate::error::{Result, TrackerError};

/// `core_criteria_length` value requiring every point to match the archetype
pub const STRICT_CORE_CRITERIA: i32 = -99;

/// Cyclone archetype being tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CycloneType {
    /// Tropical cyclone
    Tc,
    /// Extratropical cyclone
    Ec,
    /// Mediterranean cyclone
    Mc,
    /// Tropical-like (Mediterranean) cyclone
    Tlc,
    /// Subtropical cyclone
    Sc,
}

impl CycloneType {
    /// Short code used in file names and logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::Tc => "TC",
            Self::Ec => "EC",
            Self::Mc => "MC",
            Self::Tlc => "TLC",
            Self::Sc => "SC",
        }
    }
}

impl fmt::Display for CycloneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CycloneType {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "TC" => Ok(Self::Tc),
            "EC" => Ok(Self::Ec),
            "MC" => Ok(Self::Mc),
            "TLC" => Ok(Self::Tlc),
            "SC" => Ok(Self::Sc),
            other => Err(TrackerError::Config(format!(
                "unknown cyclone type '{other}' (expected TC, EC, MC, TLC or SC)"
            ))),
        }
    }
}

/// Geographic search box in the order `[lon_min, lat_min, lon_max, lat_max]`.
///
/// A box with a longitude bound above 180° uses the 0..360 convention, and
/// candidate longitudes are shifted into it before testing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchBox {
    /// Western bound in degrees
    pub lon_min: f64,
    /// Southern bound in degrees
    pub lat_min: f64,
    /// Eastern bound in degrees
    pub lon_max: f64,
    /// Northern bound in degrees
    pub lat_max: f64,
}

impl SearchBox {
    /// Build a box from `[lon_min, lat_min, lon_max, lat_max]`
    pub const fn from_limits(limits: [f64; 4]) -> Self {
        Self {
            lon_min: limits[0],
            lat_min: limits[1],
            lon_max: limits[2],
            lat_max: limits[3],
        }
    }

    /// The whole globe
    pub const fn global() -> Self {
        Self::from_limits([0.0, -90.0, 360.0, 90.0])
    }

    /// Preset box for a named basin.
    ///
    /// Subtropical cyclones share the tropical basins; Mediterranean systems
    /// always use the Mediterranean box.
    pub fn for_region(region: &str, cyclone_type: CycloneType) -> Option<Self> {
        let region = region.to_ascii_uppercase();
        let limits = match cyclone_type {
            CycloneType::Ec => match region.as_str() {
                "NA" => [-120.0, 20.0, 25.0, 75.0],
                "SA" => [-80.0, -75.0, 30.0, 25.0],
                "NP" => [100.0, 20.0, 240.0, 75.0],
                "SP" => [130.0, -75.0, 280.0, -25.0],
                "SI" => [30.0, -75.0, 130.0, -25.0],
                "NH" => [0.0, 20.0, 360.0, 75.0],
                "SH" => [0.0, -75.0, 360.0, -25.0],
                "GL" => [0.0, -90.0, 360.0, 90.0],
                _ => return None,
            },
            CycloneType::Tc | CycloneType::Sc => match region.as_str() {
                "AL" => [-110.0, 0.0, 10.0, 55.0],
                "EP" => [180.0, 0.0, 280.0, 50.0],
                "WP" => [100.0, 0.0, 180.0, 55.0],
                "SP" => [130.0, -50.0, 270.0, 0.0],
                "NI" => [30.0, 0.0, 100.0, 40.0],
                "SI" => [30.0, -50.0, 130.0, 0.0],
                "SA" => [-60.0, -45.0, 20.0, 0.0],
                "NH" => [0.0, 0.0, 360.0, 60.0],
                "SH" => [0.0, -60.0, 360.0, 0.0],
                "GL" => [0.0, -60.0, 360.0, 60.0],
                _ => return None,
            },
            CycloneType::Mc | CycloneType::Tlc => [-5.0, 20.0, 50.0, 50.0],
        };
        Some(Self::from_limits(limits))
    }

    /// Whether the box is expressed in 0..360 longitudes
    pub fn uses_360(&self) -> bool {
        self.lon_min > 180.0 || self.lon_max > 180.0
    }

    /// Express `lon` in the box's longitude convention
    pub fn box_longitude(&self, lon: f64) -> f64 {
        if self.uses_360() && lon < 0.0 {
            lon + 360.0
        } else {
            lon
        }
    }

    /// Inclusive containment, used to filter candidates
    pub fn contains(&self, p: GeoPoint) -> bool {
        let lon = self.box_longitude(p.lon);
        p.lat >= self.lat_min && p.lat <= self.lat_max && lon >= self.lon_min && lon <= self.lon_max
    }

    /// Strict containment, used to keep re-centring inside the box
    pub fn contains_strict(&self, p: GeoPoint) -> bool {
        let lon = self.box_longitude(p.lon);
        p.lat > self.lat_min && p.lat < self.lat_max && lon > self.lon_min && lon < self.lon_max
    }
}

/// Every threshold of the detection, characterisation, linking and
/// classification stages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Archetype being tracked
    pub cyclone_type: CycloneType,
    /// Basin code used for the search box and output names
    pub region: String,
    /// Label of the input dataset, used in output names
    pub source: String,
    /// Geographic search box
    pub search_box: SearchBox,

    /// First analysis time
    pub start: Option<NaiveDateTime>,
    /// Last analysis time (inclusive)
    pub end: Option<NaiveDateTime>,
    /// Hours between analysis times
    pub dt_h: u32,
    /// Detection workers
    pub workers: usize,

    /// Native grid resolution, also the radial step of re-centring
    pub model_res: Kilometers,
    /// Radius inside which candidates are merged
    pub filter_center_threshold: Kilometers,
    /// Smallest ROCI accepted without a closed contour
    pub critical_outer_radius: Kilometers,
    /// Largest step between consecutive track points
    pub dist_threshold: Kilometers,
    /// Outer radius of the polar grids for wind and ROCI
    pub rout: Kilometers,
    /// Radial step of the polar grids for wind and ROCI
    pub dr_res: Kilometers,
    /// Angular step of every polar grid, degrees
    pub d_ang: f64,

    /// Candidates above this pressure are rejected
    pub min_slp_threshold: Hectopascals,
    /// Shortest accepted track duration
    pub dt_lifetime: Hours,
    /// Shortest accepted travelled distance for tracks ending without a match
    pub minimum_distance_travelled: Kilometers,
    /// Candidates over terrain higher than this (m) are rejected; 0 disables
    pub terrain_filter: f64,

    /// Subtract a climatological baseline and filter on the anomaly
    pub use_mslp_anomaly: bool,
    /// Days of look-back for the baseline
    pub prev_days: u32,
    /// Candidates with an anomaly above this are rejected
    pub mslp_anomaly_threshold: Hectopascals,

    /// Peak wind near the centre must reach this
    pub max_wind_speed_threshold: MetersPerSecond,
    /// Azimuthal wind defining the outer wind radius
    pub outer_wind_speed_threshold: MetersPerSecond,
    /// Track peak wind must exceed this
    pub intensity_threshold: MetersPerSecond,
    /// Cyclonic relative vorticity (s⁻¹) a candidate must reach
    pub vorticity_threshold: f64,

    /// Radius of the outer ring used for the pressure deficit, degrees
    pub great_circle_distance: f64,
    /// Pressure deficit (Pa) between the outer ring and the centre
    pub dmslp_great_circle_distance: f64,
    /// Radius searched for peak wind
    pub radius_for_msw: Kilometers,

    /// Compute thermal-wind and asymmetry parameters
    pub upper_air: bool,
    /// Fit thermal winds across every level instead of the layer endpoints
    pub vtl_vtu_regression: bool,
    /// Radius used for thickness statistics
    pub max_dist: Kilometers,
    /// Points that must match the archetype; -99 requires all of them
    pub core_criteria_length: i32,
    /// Lower-troposphere thermal wind threshold
    pub vtl_threshold: f64,
    /// Upper-troposphere thermal wind threshold
    pub vtu_threshold: f64,
    /// Thickness asymmetry threshold (m)
    pub bhart_threshold: f64,
}

struct ArchetypeDefaults {
    filter_center_threshold: f64,
    critical_outer_radius: f64,
    dist_threshold: f64,
    rout: f64,
    dt_lifetime: f64,
    minimum_distance_travelled: f64,
    terrain_filter: f64,
    mslp_anomaly_threshold: f64,
    max_wind_speed_threshold: f64,
    outer_wind_speed_threshold: f64,
    intensity_threshold: f64,
    vorticity_threshold: f64,
    max_dist: f64,
    great_circle_distance: f64,
    radius_for_msw: f64,
    core_criteria_length: i32,
    thermal_thresholds: (f64, f64, f64),
}

fn archetype_defaults(cyclone_type: CycloneType) -> ArchetypeDefaults {
    match cyclone_type {
        CycloneType::Tc => ArchetypeDefaults {
            filter_center_threshold: 650.0,
            critical_outer_radius: 50.0,
            dist_threshold: 450.0,
            rout: 1000.0,
            dt_lifetime: 36.0,
            minimum_distance_travelled: 0.0,
            terrain_filter: 0.0,
            mslp_anomaly_threshold: -2.0,
            max_wind_speed_threshold: 8.0,
            outer_wind_speed_threshold: 6.0,
            intensity_threshold: 10.0,
            vorticity_threshold: 1.45e-5,
            max_dist: 500.0,
            great_circle_distance: 5.5,
            radius_for_msw: 100.0,
            core_criteria_length: 3,
            thermal_thresholds: (0.0, 0.0, 10.0),
        },
        CycloneType::Ec => ArchetypeDefaults {
            filter_center_threshold: 1000.0,
            critical_outer_radius: 100.0,
            dist_threshold: 1000.0,
            rout: 2000.0,
            dt_lifetime: 48.0,
            minimum_distance_travelled: 1000.0,
            terrain_filter: 1000.0,
            mslp_anomaly_threshold: -2.5,
            max_wind_speed_threshold: 0.0,
            outer_wind_speed_threshold: 0.0,
            intensity_threshold: 0.0,
            vorticity_threshold: 1.45e-5,
            max_dist: 500.0,
            great_circle_distance: 6.5,
            radius_for_msw: 250.0,
            core_criteria_length: 0,
            thermal_thresholds: (0.0, 0.0, 10.0),
        },
        CycloneType::Mc | CycloneType::Tlc => ArchetypeDefaults {
            filter_center_threshold: 200.0,
            critical_outer_radius: 50.0,
            dist_threshold: 200.0,
            rout: 800.0,
            dt_lifetime: 24.0,
            minimum_distance_travelled: 200.0,
            terrain_filter: 0.0,
            mslp_anomaly_threshold: -2.5,
            max_wind_speed_threshold: 0.0,
            outer_wind_speed_threshold: 0.0,
            intensity_threshold: 0.0,
            vorticity_threshold: 1.45e-5,
            max_dist: 300.0,
            great_circle_distance: 3.0,
            radius_for_msw: 100.0,
            core_criteria_length: i32::from(cyclone_type == CycloneType::Tlc),
            thermal_thresholds: (0.0, 0.0, 10.0),
        },
        CycloneType::Sc => ArchetypeDefaults {
            filter_center_threshold: 400.0,
            critical_outer_radius: 0.0,
            dist_threshold: 400.0,
            rout: 1000.0,
            dt_lifetime: 36.0,
            minimum_distance_travelled: 0.0,
            terrain_filter: 0.0,
            mslp_anomaly_threshold: -2.5,
            max_wind_speed_threshold: 0.0,
            outer_wind_speed_threshold: 2.0,
            intensity_threshold: 0.0,
            vorticity_threshold: 1.5e-5,
            max_dist: 500.0,
            great_circle_distance: 5.5,
            radius_for_msw: 100.0,
            core_criteria_length: 7,
            thermal_thresholds: (-50.0, -10.0, 25.0),
        },
    }
}

impl TrackerConfig {
    /// Defaults for `cyclone_type` over the global region
    pub fn for_cyclone_type(cyclone_type: CycloneType) -> Self {
        let d = archetype_defaults(cyclone_type);
        let tlc = cyclone_type == CycloneType::Tlc;
        let (vtl_threshold, vtu_threshold, bhart_threshold) = d.thermal_thresholds;
        Self {
            cyclone_type,
            region: "GL".to_string(),
            source: "CUSTOM".to_string(),
            search_box: SearchBox::for_region("GL", cyclone_type).unwrap_or_else(SearchBox::global),
            start: None,
            end: None,
            dt_h: 6,
            workers: 1,
            model_res: Kilometers::new(20.0),
            filter_center_threshold: Kilometers::new(d.filter_center_threshold),
            critical_outer_radius: Kilometers::new(d.critical_outer_radius),
            dist_threshold: Kilometers::new(d.dist_threshold),
            rout: Kilometers::new(d.rout),
            dr_res: Kilometers::new(100.0),
            d_ang: 10.0,
            min_slp_threshold: Hectopascals::new(1015.0),
            dt_lifetime: Hours::new(d.dt_lifetime),
            minimum_distance_travelled: Kilometers::new(d.minimum_distance_travelled),
            terrain_filter: d.terrain_filter,
            use_mslp_anomaly: true,
            prev_days: 14,
            mslp_anomaly_threshold: Hectopascals::new(d.mslp_anomaly_threshold),
            max_wind_speed_threshold: MetersPerSecond::new(d.max_wind_speed_threshold),
            outer_wind_speed_threshold: MetersPerSecond::new(d.outer_wind_speed_threshold),
            intensity_threshold: MetersPerSecond::new(d.intensity_threshold),
            vorticity_threshold: d.vorticity_threshold,
            great_circle_distance: d.great_circle_distance,
            dmslp_great_circle_distance: 200.0,
            radius_for_msw: Kilometers::new(d.radius_for_msw),
            upper_air: tlc,
            vtl_vtu_regression: tlc,
            max_dist: Kilometers::new(d.max_dist),
            core_criteria_length: d.core_criteria_length,
            vtl_threshold,
            vtu_threshold,
            bhart_threshold,
        }
    }

    /// Re-centre on a named region preset
    ///
    /// # Errors
    /// Returns [`TrackerError::Config`] if the region has no preset for the archetype.
    pub fn with_region(mut self, region: &str) -> Result<Self> {
        self.search_box = SearchBox::for_region(region, self.cyclone_type).ok_or_else(|| {
            TrackerError::Config(format!(
                "region '{region}' has no search box for {} tracking",
                self.cyclone_type
            ))
        })?;
        self.region = region.to_ascii_uppercase();
        Ok(self)
    }

    /// Whether the anomaly filter is active after normalisation
    pub fn anomaly_enabled(&self) -> bool {
        self.use_mslp_anomaly && self.prev_days > 0
    }

    /// Re-centring refinement radius in km
    pub fn refinement_radius(&self) -> f64 {
        0.45 * *self.filter_center_threshold
    }

    /// Apply the cross-field rules between archetype, anomaly and upper-air settings
    pub fn normalize(mut self) -> Self {
        if self.cyclone_type == CycloneType::Tlc {
            self.upper_air = true;
            self.vtl_vtu_regression = true;
        }
        if self.prev_days == 0 {
            self.use_mslp_anomaly = false;
        }
        if !self.use_mslp_anomaly {
            self.prev_days = 0;
        }
        if self.core_criteria_length < 0 && self.core_criteria_length != STRICT_CORE_CRITERIA {
            self.core_criteria_length = archetype_defaults(self.cyclone_type).core_criteria_length;
        }
        self
    }

    /// Check the configuration for values no run can work with
    ///
    /// # Errors
    /// Returns [`TrackerError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| -> Result<()> { Err(TrackerError::Config(msg)) };
        if self.terrain_filter < 0.0 {
            return fail(format!(
                "terrain_filter must be 0 (disabled) or positive, got {}",
                self.terrain_filter
            ));
        }
        if self.dt_h == 0 {
            return fail("dt_h must be positive".to_string());
        }
        for (name, value) in [
            ("dr_res", *self.dr_res),
            ("model_res", *self.model_res),
            ("rout", *self.rout),
            ("d_ang", self.d_ang),
        ] {
            if value.is_nan() || value <= 0.0 {
                return fail(format!("{name} must be positive, got {value}"));
            }
        }
        if self.workers == 0 {
            return fail("at least one worker is required".to_string());
        }
        let b = &self.search_box;
        if b.lat_min >= b.lat_max || b.lon_min >= b.lon_max {
            return fail(format!(
                "search box [{}, {}, {}, {}] is inverted",
                b.lon_min, b.lat_min, b.lon_max, b.lat_max
            ));
        }
        if self.core_criteria_length < 0 && self.core_criteria_length != STRICT_CORE_CRITERIA {
            return fail(format!(
                "core_criteria_length must be non-negative or {STRICT_CORE_CRITERIA}, got {}",
                self.core_criteria_length
            ));
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end < start {
                return fail(format!("end date {end} is before start date {start}"));
            }
        }
        Ok(())
    }

    /// Read a JSON configuration file; absent fields take archetype defaults
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or decoded, if
    /// `cyclone_type` is missing, or if validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| TrackerError::io(path, e))?;
        Self::from_json(&contents)
    }

    /// Decode a JSON configuration document
    ///
    /// # Errors
    /// See [`TrackerConfig::load`].
    pub fn from_json(contents: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(contents)?;
        file.resolve()
    }
}

/// Sparse configuration as written by users; every field but the
/// archetype is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub cyclone_type: Option<CycloneType>,
    pub region: Option<String>,
    pub source: Option<String>,
    /// `[lon_min, lat_min, lon_max, lat_max]`, overrides the region preset
    pub search_limits: Option<[f64; 4]>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub dt_h: Option<u32>,
    pub workers: Option<usize>,
    pub model_res: Option<f64>,
    pub filter_center_threshold: Option<f64>,
    pub critical_outer_radius: Option<f64>,
    pub dist_threshold: Option<f64>,
    pub rout: Option<f64>,
    pub dr_res: Option<f64>,
    pub d_ang: Option<f64>,
    pub min_slp_threshold: Option<f64>,
    pub dt_lifetime: Option<f64>,
    pub minimum_distance_travelled: Option<f64>,
    pub terrain_filter: Option<f64>,
    pub use_mslp_anomaly: Option<bool>,
    pub prev_days: Option<i64>,
    pub mslp_anomaly_threshold: Option<f64>,
    pub max_wind_speed_threshold: Option<f64>,
    pub outer_wind_speed_threshold: Option<f64>,
    pub intensity_threshold: Option<f64>,
    pub vorticity_threshold: Option<f64>,
    pub great_circle_distance: Option<f64>,
    pub dmslp_great_circle_distance: Option<f64>,
    pub radius_for_msw: Option<f64>,
    pub upper_air: Option<bool>,
    pub vtl_vtu_regression: Option<bool>,
    pub max_dist: Option<f64>,
    pub core_criteria_length: Option<i32>,
    pub vtl_threshold: Option<f64>,
    pub vtu_threshold: Option<f64>,
    pub bhart_threshold: Option<f64>,
}

impl ConfigFile {
    /// Fill missing values from the archetype defaults, normalise and validate
    ///
    /// # Errors
    /// Returns [`TrackerError::Config`] if `cyclone_type` is missing, the
    /// region is unknown, or validation fails.
    pub fn resolve(self) -> Result<TrackerConfig> {
        let cyclone_type = self
            .cyclone_type
            .ok_or_else(|| TrackerError::Config("cyclone_type is not defined".to_string()))?;
        let mut c = TrackerConfig::for_cyclone_type(cyclone_type);
        if let Some(region) = &self.region {
            c = c.with_region(region)?;
        }
        if let Some(limits) = self.search_limits {
            c.search_box = SearchBox::from_limits(limits);
        }

        macro_rules! take {
            ($field:ident) => {
                if let Some(v) = self.$field {
                    c.$field = v.into();
                }
            };
        }
        take!(source);
        take!(start);
        take!(end);
        take!(dt_h);
        take!(workers);
        take!(model_res);
        take!(filter_center_threshold);
        take!(critical_outer_radius);
        take!(dist_threshold);
        take!(rout);
        take!(dr_res);
        take!(d_ang);
        take!(min_slp_threshold);
        take!(dt_lifetime);
        take!(minimum_distance_travelled);
        take!(terrain_filter);
        take!(use_mslp_anomaly);
        take!(mslp_anomaly_threshold);
        take!(max_wind_speed_threshold);
        take!(outer_wind_speed_threshold);
        take!(intensity_threshold);
        take!(vorticity_threshold);
        take!(great_circle_distance);
        take!(dmslp_great_circle_distance);
        take!(radius_for_msw);
        take!(upper_air);
        take!(vtl_vtu_regression);
        take!(max_dist);
        take!(core_criteria_length);
        take!(vtl_threshold);
        take!(vtu_threshold);
        take!(bhart_threshold);
        if let Some(days) = self.prev_days {
            c.prev_days = u32::try_from(days.max(0)).unwrap_or(0);
        }

        let c = c.normalize();
        c.validate()?;
        Ok(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archetype_defaults() {
        let tc = TrackerConfig::for_cyclone_type(CycloneType::Tc);
        assert_eq!(*tc.filter_center_threshold, 650.0);
        assert_eq!(*tc.dist_threshold, 450.0);
        assert_eq!(tc.core_criteria_length, 3);
        assert!(!tc.upper_air);

        let sc = TrackerConfig::for_cyclone_type(CycloneType::Sc);
        assert_eq!(sc.vtl_threshold, -50.0);
        assert_eq!(sc.vtu_threshold, -10.0);
        assert_eq!(sc.bhart_threshold, 25.0);

        let tlc = TrackerConfig::for_cyclone_type(CycloneType::Tlc);
        assert!(tlc.upper_air && tlc.vtl_vtu_regression);
        assert_eq!(tlc.core_criteria_length, 1);
        assert_eq!(tlc.search_box, SearchBox::from_limits([-5.0, 20.0, 50.0, 50.0]));
    }

    #[test]
    fn test_box_longitude_convention() {
        let ep = SearchBox::for_region("ep", CycloneType::Tc).unwrap();
        assert!(ep.uses_360());
        assert!(ep.contains(GeoPoint::new(15.0, -120.0)));
        assert!(!ep.contains(GeoPoint::new(15.0, 120.0)));

        let al = SearchBox::for_region("AL", CycloneType::Tc).unwrap();
        assert!(!al.uses_360());
        assert!(al.contains(GeoPoint::new(20.0, -50.0)));
        assert!(al.contains(GeoPoint::new(0.0, -50.0)));
        assert!(!al.contains_strict(GeoPoint::new(0.0, -50.0)));
    }

    #[test]
    fn test_unknown_region_is_config_error() {
        let err = TrackerConfig::for_cyclone_type(CycloneType::Ec)
            .with_region("AL")
            .unwrap_err();
        assert!(matches!(err, TrackerError::Config(_)));
    }

    #[test]
    fn test_json_requires_cyclone_type() {
        let err = TrackerConfig::from_json(r#"{"region": "AL"}"#).unwrap_err();
        assert!(err.to_string().contains("cyclone_type is not defined"));
    }

    #[test]
    fn test_json_overrides_and_normalisation() {
        let c = TrackerConfig::from_json(
            r#"{
                "cyclone_type": "TC",
                "region": "AL",
                "dist_threshold": 300,
                "prev_days": 0,
                "core_criteria_length": -5,
                "start": "2020-08-01T00:00:00",
                "end": "2020-08-03T18:00:00"
            }"#,
        )
        .unwrap();
        assert_eq!(*c.dist_threshold, 300.0);
        assert!(!c.anomaly_enabled());
        assert_eq!(c.core_criteria_length, 3);
        assert_eq!(c.region, "AL");
        assert!(c.start.is_some() && c.end.is_some());
    }

    #[test]
    fn test_validation_failures() {
        let mut c = TrackerConfig::for_cyclone_type(CycloneType::Ec);
        c.terrain_filter = -1.0;
        assert!(c.validate().is_err());

        let mut c = TrackerConfig::for_cyclone_type(CycloneType::Tc);
        c.search_box = SearchBox::from_limits([10.0, 0.0, -10.0, 50.0]);
        assert!(c.validate().is_err());

        let mut c = TrackerConfig::for_cyclone_type(CycloneType::Tc);
        c.dr_res = Kilometers::new(0.0);
        assert!(c.validate().is_err());

        assert!(TrackerConfig::for_cyclone_type(CycloneType::Mc).validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = TrackerConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, TrackerError::Io { .. }));
    }
}
