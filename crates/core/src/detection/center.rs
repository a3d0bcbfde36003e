//! Accepted cyclone centres and their record-row encoding

use serde::{Deserialize, Serialize};

use crate::core_types::GeoPoint;

/// Number of columns in a record row
pub const RECORD_COLUMNS: usize = 10;

/// A cyclone centre that passed structural characterisation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalCenter {
    /// Refined centre position
    pub position: GeoPoint,
    /// Refined minimum pressure in hPa
    pub min_pressure: f64,
    /// Peak wind speed near the centre in m/s
    pub max_wind: f64,
    /// Pressure of the outermost closed isobar in hPa (0 when none)
    pub closed_pressure: f64,
    /// Radius of the outermost closed isobar in km (0 when none)
    pub roci: f64,
    /// Mean radius of the outer wind threshold in km
    pub outer_radius: f64,
    /// Upper-troposphere thermal wind
    pub vtu: f64,
    /// Lower-troposphere thermal wind
    pub vtl: f64,
    /// Claimed by a trajectory
    pub consumed: bool,
}

impl CriticalCenter {
    /// Encode as one whitespace-separated record row
    pub fn to_row(&self) -> String {
        format!(
            "{} {} {} {} {} {} {} {} {} {}",
            self.position.lat,
            self.position.lon,
            self.min_pressure,
            self.max_wind,
            self.closed_pressure,
            self.roci,
            self.outer_radius,
            self.vtu,
            self.vtl,
            u8::from(self.consumed)
        )
    }

    /// Decode a record row; the message describes the first bad column
    pub fn from_row(row: &str) -> std::result::Result<Self, String> {
        let cols: Vec<&str> = row.split_whitespace().collect();
        if cols.len() != RECORD_COLUMNS {
            return Err(format!(
                "expected {RECORD_COLUMNS} columns, found {}",
                cols.len()
            ));
        }
        let mut values = [0.0_f64; RECORD_COLUMNS];
        for (i, (slot, col)) in values.iter_mut().zip(&cols).enumerate() {
            *slot = col
                .parse::<f64>()
                .map_err(|e| format!("column {}: '{col}': {e}", i + 1))?;
        }
        Ok(Self {
            position: GeoPoint::new(values[0], values[1]),
            min_pressure: values[2],
            max_wind: values[3],
            closed_pressure: values[4],
            roci: values[5],
            outer_radius: values[6],
            vtu: values[7],
            vtl: values[8],
            consumed: values[9] != 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_preserves_values() {
        let center = CriticalCenter {
            position: GeoPoint::new(18.25, -62.5),
            min_pressure: 978.312,
            max_wind: 31.7,
            closed_pressure: 1008.0,
            roci: 412.9,
            outer_radius: -9999.0,
            vtu: 12.0,
            vtl: 45.5,
            consumed: true,
        };
        let back = CriticalCenter::from_row(&center.to_row()).unwrap();
        assert_eq!(back, center);
    }

    #[test]
    fn test_bad_rows() {
        assert!(CriticalCenter::from_row("1 2 3").unwrap_err().contains("10 columns"));
        let err = CriticalCenter::from_row("1 2 3 4 5 6 7 8 x 0").unwrap_err();
        assert!(err.contains("column 9"));
    }
}
