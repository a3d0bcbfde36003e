//! Gridded inputs for one timestep
//!
//! Every field is stored as a flat `Vec<f64>` in row-major order
//! (`y * width + x`), where `x` walks longitude and `y` walks latitude.
//! The coordinates themselves live in a [`GeoGrid`], which supports both
//! regular and curvilinear layouts.

use crate::core_types::{normalize_longitude, GeoPoint};
use crate::error::{Result, TrackerError};

/// Latitude and longitude of every grid node
#[derive(Debug, Clone)]
pub struct GeoGrid {
    /// Nodes along longitude
    pub width: usize,
    /// Nodes along latitude
    pub height: usize,
    lats: Vec<f64>,
    lons: Vec<f64>,
}

impl GeoGrid {
    /// Build a grid from per-node coordinates in row-major order
    ///
    /// # Errors
    /// Returns [`TrackerError::ShapeMismatch`] if the coordinate arrays do not
    /// hold `width * height` values.
    pub fn new(width: usize, height: usize, lats: Vec<f64>, lons: Vec<f64>) -> Result<Self> {
        let n = width * height;
        if lats.len() != n || lons.len() != n {
            return Err(TrackerError::ShapeMismatch(format!(
                "grid {width}x{height} needs {n} coordinates, got {} lats and {} lons",
                lats.len(),
                lons.len()
            )));
        }
        Ok(Self {
            width,
            height,
            lats,
            lons: lons.into_iter().map(normalize_longitude).collect(),
        })
    }

    /// Regular latitude/longitude grid starting at (`lat0`, `lon0`)
    #[must_use]
    pub fn regular(lat0: f64, lon0: f64, dlat: f64, dlon: f64, width: usize, height: usize) -> Self {
        let mut lats = Vec::with_capacity(width * height);
        let mut lons = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                lats.push(lat0 + y as f64 * dlat);
                lons.push(normalize_longitude(lon0 + x as f64 * dlon));
            }
        }
        Self {
            width,
            height,
            lats,
            lons,
        }
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.lats.len()
    }

    /// Grid has no nodes
    pub fn is_empty(&self) -> bool {
        self.lats.is_empty()
    }

    /// Flat index of node (`x`, `y`)
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Position of the node at flat index `idx`
    #[inline]
    pub fn point(&self, idx: usize) -> GeoPoint {
        GeoPoint {
            lat: self.lats[idx],
            lon: self.lons[idx],
        }
    }

    /// Node latitudes
    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    /// Node longitudes, normalised into (-180, 180]
    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    fn check_field(&self, name: &str, field: &ScalarField) -> Result<()> {
        if field.width != self.width || field.height != self.height {
            return Err(TrackerError::ShapeMismatch(format!(
                "{name} is {}x{} but the grid is {}x{}",
                field.width, field.height, self.width, self.height
            )));
        }
        Ok(())
    }
}

/// One scalar quantity on a grid
#[derive(Debug, Clone)]
pub struct ScalarField {
    /// Field values in row-major order (y * width + x)
    pub data: Vec<f64>,
    /// Nodes along longitude
    pub width: usize,
    /// Nodes along latitude
    pub height: usize,
}

impl ScalarField {
    /// Zero-filled field
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_value(width, height, 0.0)
    }

    /// Field filled with `value`
    #[must_use]
    pub fn with_value(width: usize, height: usize, value: f64) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
        }
    }

    /// Wrap existing row-major data
    ///
    /// # Errors
    /// Returns [`TrackerError::ShapeMismatch`] if `data` has the wrong length.
    pub fn from_vec(width: usize, height: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != width * height {
            return Err(TrackerError::ShapeMismatch(format!(
                "field {width}x{height} needs {} values, got {}",
                width * height,
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Evaluate `f` at every node of `grid`
    pub fn from_fn(grid: &GeoGrid, f: impl Fn(GeoPoint) -> f64) -> Self {
        Self {
            data: (0..grid.len()).map(|i| f(grid.point(i))).collect(),
            width: grid.width,
            height: grid.height,
        }
    }

    /// Get reference to field data
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Value at node (`x`, `y`)
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.data[y * self.width + x]
    }

    /// Set value at node (`x`, `y`)
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.data[y * self.width + x] = value;
    }

    /// Node-wise mean of several same-shaped fields, `None` when empty
    ///
    /// # Errors
    /// Returns [`TrackerError::ShapeMismatch`] if the shapes disagree.
    pub fn mean(fields: &[ScalarField]) -> Result<Option<ScalarField>> {
        let Some(first) = fields.first() else {
            return Ok(None);
        };
        let mut sum = ScalarField::new(first.width, first.height);
        for field in fields {
            if field.width != first.width || field.height != first.height {
                return Err(TrackerError::ShapeMismatch(
                    "baseline fields have different shapes".to_string(),
                ));
            }
            for (acc, v) in sum.data.iter_mut().zip(&field.data) {
                *acc += v;
            }
        }
        let n = fields.len() as f64;
        for v in &mut sum.data {
            *v /= n;
        }
        Ok(Some(sum))
    }

    /// Node-wise `self - other`
    ///
    /// # Errors
    /// Returns [`TrackerError::ShapeMismatch`] if the shapes disagree.
    pub fn difference(&self, other: &ScalarField) -> Result<ScalarField> {
        if self.width != other.width || self.height != other.height {
            return Err(TrackerError::ShapeMismatch(
                "cannot subtract fields of different shapes".to_string(),
            ));
        }
        Ok(ScalarField {
            data: self.data.iter().zip(&other.data).map(|(a, b)| a - b).collect(),
            width: self.width,
            height: self.height,
        })
    }
}

/// Surface inputs for one timestep
#[derive(Debug, Clone)]
pub struct SurfaceFields {
    /// Node coordinates
    pub grid: GeoGrid,
    /// Mean sea-level pressure in hPa
    pub mslp: ScalarField,
    /// 10 m zonal wind in m/s
    pub u: ScalarField,
    /// 10 m meridional wind in m/s
    pub v: ScalarField,
    /// Terrain height in metres, when available
    pub terrain: Option<ScalarField>,
}

impl SurfaceFields {
    /// Bundle surface fields, checking that every shape matches the grid
    ///
    /// # Errors
    /// Returns [`TrackerError::ShapeMismatch`] on any disagreement.
    pub fn new(
        grid: GeoGrid,
        mslp: ScalarField,
        u: ScalarField,
        v: ScalarField,
        terrain: Option<ScalarField>,
    ) -> Result<Self> {
        grid.check_field("mslp", &mslp)?;
        grid.check_field("u", &u)?;
        grid.check_field("v", &v)?;
        if let Some(t) = &terrain {
            grid.check_field("terrain", t)?;
        }
        Ok(Self {
            grid,
            mslp,
            u,
            v,
            terrain,
        })
    }
}

/// Geopotential height on pressure levels for one timestep
#[derive(Debug, Clone)]
pub struct UpperAirField {
    /// Node coordinates
    pub grid: GeoGrid,
    levels: Vec<(f64, ScalarField)>,
}

impl UpperAirField {
    /// Bundle geopotential heights (metres) keyed by pressure level (hPa)
    ///
    /// # Errors
    /// Returns [`TrackerError::ShapeMismatch`] if a level does not match the grid.
    pub fn new(grid: GeoGrid, levels: Vec<(f64, ScalarField)>) -> Result<Self> {
        for (level, field) in &levels {
            grid.check_field(&format!("geopotential height at {level} hPa"), field)?;
        }
        Ok(Self { grid, levels })
    }

    /// Heights on `level_hpa`, if present
    pub fn heights(&self, level_hpa: f64) -> Option<&ScalarField> {
        self.levels
            .iter()
            .find(|(level, _)| (level - level_hpa).abs() < 1e-6)
            .map(|(_, field)| field)
    }

    /// Available levels in hPa
    pub fn levels(&self) -> impl Iterator<Item = f64> + '_ {
        self.levels.iter().map(|(level, _)| *level)
    }
}
