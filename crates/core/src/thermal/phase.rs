//! Cyclone phase space labels
//!
//! Each point is placed in Hart's phase space from the signs of its upper
//! and lower thermal winds and the magnitude of its asymmetry B.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core_types::is_missing;

/// Thermal phase of one track point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CyclonePhase {
    /// Symmetric deep warm core
    SymmetricDeepWarm,
    /// Symmetric deep cold core
    SymmetricDeepCold,
    /// Symmetric shallow warm core
    SymmetricShallowWarm,
    /// Symmetric shallow cold core
    SymmetricShallowCold,
    /// Asymmetric deep warm core
    AsymmetricDeepWarm,
    /// Asymmetric deep cold core
    AsymmetricDeepCold,
    /// Asymmetric shallow warm core
    AsymmetricShallowWarm,
    /// Asymmetric shallow cold core
    AsymmetricShallowCold,
    /// Not classifiable (missing or zero-valued parameters)
    Undefined,
}

impl CyclonePhase {
    /// Four-letter label used in track files
    pub const fn label(self) -> &'static str {
        match self {
            Self::SymmetricDeepWarm => "SDWC",
            Self::SymmetricDeepCold => "SDCC",
            Self::SymmetricShallowWarm => "SLWC",
            Self::SymmetricShallowCold => "SLCC",
            Self::AsymmetricDeepWarm => "ADWC",
            Self::AsymmetricDeepCold => "ADCC",
            Self::AsymmetricShallowWarm => "ALWC",
            Self::AsymmetricShallowCold => "ALCC",
            Self::Undefined => "UDCC",
        }
    }
}

impl fmt::Display for CyclonePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Phase of a point from VTU, VTL and B.
///
/// The system is symmetric when |B| ≤ `bhart_threshold`. A thermal wind of
/// exactly zero, or any sentinel, leaves the point undefined.
pub fn classify_phase(vtu: f64, vtl: f64, b: f64, bhart_threshold: f64) -> CyclonePhase {
    use CyclonePhase as P;
    if is_missing(vtu) || is_missing(vtl) || is_missing(b) {
        return P::Undefined;
    }
    let symmetric = b.abs() <= bhart_threshold;
    match (vtu > 0.0, vtu < 0.0, vtl > 0.0, vtl < 0.0) {
        (true, _, true, _) if symmetric => P::SymmetricDeepWarm,
        (_, true, _, true) if symmetric => P::SymmetricDeepCold,
        (_, true, true, _) if symmetric => P::SymmetricShallowWarm,
        (true, _, _, true) if symmetric => P::SymmetricShallowCold,
        (true, _, true, _) => P::AsymmetricDeepWarm,
        (_, true, _, true) => P::AsymmetricDeepCold,
        (_, true, true, _) => P::AsymmetricShallowWarm,
        (true, _, _, true) => P::AsymmetricShallowCold,
        _ => P::Undefined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::NOT_COMPUTED;

    #[test]
    fn test_all_quadrants() {
        let cases = [
            (50.0, 30.0, 2.0, "SDWC"),
            (-50.0, -30.0, 2.0, "SDCC"),
            (-50.0, 30.0, 2.0, "SLWC"),
            (50.0, -30.0, 2.0, "SLCC"),
            (50.0, 30.0, 40.0, "ADWC"),
            (-50.0, -30.0, -40.0, "ADCC"),
            (-50.0, 30.0, 40.0, "ALWC"),
            (50.0, -30.0, 40.0, "ALCC"),
        ];
        for (vtu, vtl, b, label) in cases {
            assert_eq!(classify_phase(vtu, vtl, b, 10.0).label(), label);
        }
    }

    #[test]
    fn test_threshold_is_inclusive_for_symmetry() {
        assert_eq!(classify_phase(1.0, 1.0, 10.0, 10.0), CyclonePhase::SymmetricDeepWarm);
        assert_eq!(classify_phase(1.0, 1.0, 10.5, 10.0), CyclonePhase::AsymmetricDeepWarm);
    }

    #[test]
    fn test_undefined_inputs() {
        assert_eq!(classify_phase(0.0, 10.0, 0.0, 10.0), CyclonePhase::Undefined);
        assert_eq!(classify_phase(10.0, 10.0, NOT_COMPUTED, 10.0), CyclonePhase::Undefined);
        assert_eq!(classify_phase(f64::NAN, 10.0, 0.0, 10.0).to_string(), "UDCC");
    }
}
