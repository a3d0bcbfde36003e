//! Linking per-timestep centres into accepted tracks

pub mod claims;
pub mod linker;
pub mod output;
pub mod store;
pub mod trajectory;

pub use claims::ClaimTable;
pub use linker::{LinkInputs, LinkReport, TrajectoryLinker, MAX_BRIDGE_TURN};
pub use output::{format_track, track_file_name, write_track_file, TrackWriter};
pub use store::{DirectoryStore, MemoryStore, RecordStore};
pub use trajectory::{AcceptedTrack, Termination, TrackPoint, Trajectory};
