//! Thermal structure of trajectories in cyclone phase space

pub mod classifier;
pub mod hart_b;
pub mod phase;
pub mod thermal_wind;

pub use classifier::{ThermalAssessment, ThermalClassifier, ThermalSample};
pub use hart_b::hart_b;
pub use phase::{classify_phase, CyclonePhase};
pub use thermal_wind::{thermal_wind, ThermalWind, ThermalWindMode};
