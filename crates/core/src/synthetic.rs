//! Analytic cyclone fields for demos and tests
//!
//! Storms are axisymmetric: a pressure bowl that rises linearly from the
//! central pressure to an ambient value at a given radius, and a Rankine
//! vortex turning cyclonically for the hemisphere of the centre. Distances
//! use a local tangent-plane metric around each centre.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;

use crate::core_types::{longitude_delta, GeoPoint};
use crate::error::Result;
use crate::geometry::KM_PER_DEGREE;
use crate::grid::{GeoGrid, ScalarField, SurfaceFields, UpperAirField};
use crate::pipeline::FieldSource;

/// Pressure of the undisturbed environment around synthetic storms, in hPa
pub const BACKGROUND_PRESSURE: f64 = 1020.0;

/// Offset of `p` from `center` in km (east, north)
pub fn local_offset_km(center: GeoPoint, p: GeoPoint) -> (f64, f64) {
    let dx = longitude_delta(center.lon, p.lon) * KM_PER_DEGREE * center.lat.to_radians().cos();
    let dy = (p.lat - center.lat) * KM_PER_DEGREE;
    (dx, dy)
}

/// Field whose value depends only on the distance (km) from `center`
pub fn radial_field(grid: &GeoGrid, center: GeoPoint, profile: impl Fn(f64) -> f64) -> ScalarField {
    ScalarField::from_fn(grid, |p| {
        let (dx, dy) = local_offset_km(center, p);
        profile(dx.hypot(dy))
    })
}

/// Rankine vortex winds (`u`, `v`) in m/s, cyclonic for the hemisphere of `center`
pub fn cyclonic_vortex(
    grid: &GeoGrid,
    center: GeoPoint,
    vmax: f64,
    rmax_km: f64,
) -> (ScalarField, ScalarField) {
    let mut u = ScalarField::new(grid.width, grid.height);
    let mut v = ScalarField::new(grid.width, grid.height);
    let sense = center.hemisphere_sign();
    for i in 0..grid.len() {
        let (dx, dy) = local_offset_km(center, grid.point(i));
        let r = dx.hypot(dy);
        if r == 0.0 {
            continue;
        }
        let speed = if r < rmax_km {
            vmax * r / rmax_km
        } else {
            vmax * rmax_km / r
        };
        // Counter-clockwise in the north, clockwise in the south
        u.data[i] = -sense * speed * dy / r;
        v.data[i] = sense * speed * dx / r;
    }
    (u, v)
}

/// One idealised cyclone
#[derive(Debug, Clone, Copy)]
pub struct SyntheticStorm {
    /// Centre position
    pub center: GeoPoint,
    /// Central pressure in hPa
    pub min_pressure: f64,
    /// Pressure reached at `radius_km`, in hPa
    pub ambient_pressure: f64,
    /// Radius of the pressure bowl in km
    pub radius_km: f64,
    /// Peak wind in m/s
    pub vmax: f64,
    /// Radius of peak wind in km
    pub rmax_km: f64,
}

impl SyntheticStorm {
    /// Tropical-cyclone-like storm: 980 hPa rising to 1015 hPa at 1000 km
    pub fn tropical(center: GeoPoint) -> Self {
        Self {
            center,
            min_pressure: 980.0,
            ambient_pressure: 1015.0,
            radius_km: 1000.0,
            vmax: 20.0,
            rmax_km: 100.0,
        }
    }

    /// Pressure at distance `r` km from the centre.
    ///
    /// Rises linearly inside the bowl, then keeps rising slowly until it
    /// meets the background so no plateau forms near the storm.
    pub fn pressure_at(&self, r: f64) -> f64 {
        let p = if r <= self.radius_km {
            self.min_pressure + (self.ambient_pressure - self.min_pressure) * r / self.radius_km
        } else {
            self.ambient_pressure + 0.005 * (r - self.radius_km)
        };
        p.min(BACKGROUND_PRESSURE.max(self.ambient_pressure))
    }
}

/// Vertical warm-core structure shared by every storm in a [`SyntheticSource`]
#[derive(Debug, Clone)]
pub struct WarmCoreProfile {
    /// (level hPa, environmental height m, central height depression m)
    pub levels: Vec<(f64, f64, f64)>,
    /// e-folding radius of the height depression in km
    pub radius_km: f64,
}

impl WarmCoreProfile {
    /// Deep warm core: depression weakening with height on 900..300 hPa every 50 hPa
    pub fn deep_warm() -> Self {
        let levels = (0..13)
            .map(|k| {
                let level = 900.0 - 50.0 * f64::from(k);
                // Standard-atmosphere-like heights, depression linear in ln p
                let height = 44330.0 * (1.0 - (level / 1013.25_f64).powf(0.1903));
                let depression = 60.0 + 40.0 * (level / 900.0).ln();
                (level, height, depression)
            })
            .collect();
        Self {
            levels,
            radius_km: 300.0,
        }
    }

    fn heights(&self, grid: &GeoGrid, centers: &[GeoPoint]) -> Result<UpperAirField> {
        let levels = self
            .levels
            .iter()
            .map(|&(level, height, depression)| {
                let field = ScalarField::from_fn(grid, |p| {
                    centers.iter().fold(height, |z, &c| {
                        let (dx, dy) = local_offset_km(c, p);
                        let r2 = (dx * dx + dy * dy) / (self.radius_km * self.radius_km);
                        z - depression * (-r2).exp()
                    })
                });
                (level, field)
            })
            .collect();
        UpperAirField::new(grid.clone(), levels)
    }
}

/// In-memory [`FieldSource`] built from analytic storms.
///
/// Times that were never registered have no data; registered times with no
/// storms produce a flat background.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    /// Model grid
    pub grid: GeoGrid,
    storms: BTreeMap<NaiveDateTime, Vec<SyntheticStorm>>,
    warm_core: Option<WarmCoreProfile>,
}

impl SyntheticSource {
    /// Empty source on `grid`
    pub fn new(grid: GeoGrid) -> Self {
        Self {
            grid,
            storms: BTreeMap::new(),
            warm_core: None,
        }
    }

    /// Register data at `time` with no storm
    pub fn with_time(mut self, time: NaiveDateTime) -> Self {
        self.storms.entry(time).or_default();
        self
    }

    /// Add a storm at `time`
    pub fn with_storm(mut self, time: NaiveDateTime, storm: SyntheticStorm) -> Self {
        self.storms.entry(time).or_default().push(storm);
        self
    }

    /// Provide upper-air heights with the given warm-core structure
    pub fn with_warm_core(mut self, profile: WarmCoreProfile) -> Self {
        self.warm_core = Some(profile);
        self
    }

    /// Registered times
    pub fn times(&self) -> impl Iterator<Item = &NaiveDateTime> {
        self.storms.keys()
    }
}

impl FieldSource for SyntheticSource {
    fn surface(&self, time: NaiveDateTime) -> Result<Option<SurfaceFields>> {
        let Some(storms) = self.storms.get(&time) else {
            return Ok(None);
        };
        let (w, h) = (self.grid.width, self.grid.height);
        let mut mslp = ScalarField::with_value(w, h, BACKGROUND_PRESSURE);
        let mut u = ScalarField::new(w, h);
        let mut v = ScalarField::new(w, h);
        for storm in storms {
            let bowl = radial_field(&self.grid, storm.center, |r| storm.pressure_at(r));
            for (p, b) in mslp.data.iter_mut().zip(&bowl.data) {
                *p = p.min(*b);
            }
            let (su, sv) = cyclonic_vortex(&self.grid, storm.center, storm.vmax, storm.rmax_km);
            for (acc, x) in u.data.iter_mut().zip(&su.data) {
                *acc += x;
            }
            for (acc, x) in v.data.iter_mut().zip(&sv.data) {
                *acc += x;
            }
        }
        SurfaceFields::new(self.grid.clone(), mslp, u, v, None).map(Some)
    }

    fn upper_air(&self, time: NaiveDateTime) -> Result<Option<UpperAirField>> {
        let (Some(profile), Some(storms)) = (&self.warm_core, self.storms.get(&time)) else {
            return Ok(None);
        };
        let centers: Vec<GeoPoint> = storms.iter().map(|s| s.center).collect();
        profile.heights(&self.grid, &centers).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_vortex_turns_cyclonically_in_both_hemispheres() {
        let grid = GeoGrid::regular(-1.0, -1.0, 0.5, 0.5, 5, 5);
        let north = GeoPoint::new(0.0, 0.0);
        let (_, v) = cyclonic_vortex(&grid, north, 10.0, 100.0);
        // East of the centre the flow is northward (counter-clockwise)
        assert!(v.get(3, 2) > 0.0);

        let south_grid = GeoGrid::regular(-21.0, -1.0, 0.5, 0.5, 5, 5);
        let (_, v) = cyclonic_vortex(&south_grid, GeoPoint::new(-20.0, 0.0), 10.0, 100.0);
        assert!(v.get(3, 2) < 0.0);
    }

    #[test]
    fn test_storm_pressure_profile() {
        let storm = SyntheticStorm::tropical(GeoPoint::new(15.0, -40.0));
        assert_relative_eq!(storm.pressure_at(0.0), 980.0);
        assert_relative_eq!(storm.pressure_at(500.0), 997.5);
        assert_relative_eq!(storm.pressure_at(1000.0), 1015.0);
        assert!(storm.pressure_at(1200.0) > 1015.0);
        assert_relative_eq!(storm.pressure_at(5000.0), BACKGROUND_PRESSURE);
    }

    #[test]
    fn test_unregistered_time_has_no_data() {
        let t = chrono::NaiveDate::from_ymd_opt(2020, 9, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let source = SyntheticSource::new(GeoGrid::regular(0.0, 0.0, 1.0, 1.0, 3, 3));
        assert!(source.surface(t).unwrap().is_none());
        let source = source.with_time(t);
        let fields = source.surface(t).unwrap().unwrap();
        assert!(fields.mslp.data.iter().all(|&p| p == BACKGROUND_PRESSURE));
        assert!(source.upper_air(t).unwrap().is_none());
    }
}
