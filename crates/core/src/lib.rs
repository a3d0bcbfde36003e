//! Cyclone Tracking Core Library
//!
//! Detects cyclone centres in gridded pressure and wind fields, links them
//! through time into trajectories and labels each trajectory point in
//! cyclone phase space.
//!
//! ## Pipeline
//!
//! - Per timestep, in parallel: pressure minima, point-wise filters,
//!   de-duplication, structural characterisation (re-centring, peak wind,
//!   outer radius, last closed isobar) and optional thermal winds
//! - Per run, sequentially: trajectory linking with single-gap bridging,
//!   lifetime, intensity and displacement gates, and thermal archetype checks
//! - Output: one track file per run

// Core types and utilities
pub mod core_types;
pub mod error;
pub mod geometry;

// Inputs
pub mod config;
pub mod grid;
pub mod synthetic;
pub mod timeline;

// Processing stages
pub mod detection;
pub mod pipeline;
pub mod thermal;
pub mod tracking;

pub use config::{CycloneType, SearchBox, TrackerConfig};
pub use core_types::{GeoPoint, NOT_COMPUTED, UNDEFINED};
pub use detection::{Candidate, CriticalCenter};
pub use error::{Result, TrackerError};
pub use grid::{GeoGrid, ScalarField, SurfaceFields, UpperAirField};
pub use pipeline::{DetectionSummary, FieldSource, Tracker, TrackingRun};
pub use thermal::{CyclonePhase, ThermalAssessment, ThermalWind};
pub use timeline::Timeline;
pub use tracking::{
    write_track_file, AcceptedTrack, DirectoryStore, LinkReport, MemoryStore, RecordStore,
};
