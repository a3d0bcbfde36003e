//! Per-timestep cyclone centre detection
//!
//! Detection runs in three passes: point-wise candidate filtering on the
//! pressure minima, structural characterisation of each survivor, and
//! proximity de-duplication before and after characterisation.

pub mod center;
pub mod detector;
pub mod filter;
pub mod structure;

pub use center::CriticalCenter;
pub use detector::{Candidate, CenterDetector};
pub use filter::{deduplicate, Clustered};
pub use structure::{ClosedIsobar, Recentered, StructureCharacterizer};
