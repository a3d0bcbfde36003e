//! Gridded model fields and the operations the detector runs on them

pub mod field;
pub mod minimum_filter;
pub mod sampler;
pub mod vorticity;

pub use field::{GeoGrid, ScalarField, SurfaceFields, UpperAirField};
pub use sampler::NearestSampler;
