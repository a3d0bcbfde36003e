//! Track file writer
//!
//! One file per run. Each accepted track starts with a header
//! `Cy{REGION}{id:04}{YYYY}, {points},` followed by one comma-separated line
//! per point:
//!
//! ```text
//! date, hour, lat, lon, pmin, wind (km/h), outer radius, closed pressure, ROCI, phase, VTU, VTL, B,
//! ```
//!
//! Quantities that were never computed are written as `-99999`.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::{CycloneType, TrackerConfig};
use crate::core_types::{MetersPerSecond, NOT_COMPUTED};
use crate::error::{Result, TrackerError};
use crate::thermal::CyclonePhase;
use crate::timeline::{record_key, Timeline};
use crate::tracking::trajectory::AcceptedTrack;

const FIELD_WIDTH: usize = 10;

/// `stormtrack_{REGION}_{start}-{end}_{SOURCE}_{TYPE}.dat`
pub fn track_file_name(config: &TrackerConfig, timeline: &Timeline) -> String {
    let key = |t: Option<&chrono::NaiveDateTime>| t.map(|t| record_key(*t)).unwrap_or_default();
    format!(
        "stormtrack_{}_{}-{}_{}_{}.dat",
        config.region,
        key(timeline.times().first()),
        key(timeline.times().last()),
        config.source,
        config.cyclone_type.code()
    )
}

fn field(value: f64, decimals: usize) -> String {
    if value == NOT_COMPUTED || !value.is_finite() {
        format!("{:>FIELD_WIDTH$}", -99999)
    } else {
        format!("{value:>FIELD_WIDTH$.decimals$}")
    }
}

/// Render one accepted track, header included
pub fn format_track(track: &AcceptedTrack, config: &TrackerConfig) -> String {
    let n = track.points.len();
    let year = track
        .points
        .first()
        .map(|p| p.time.format("%Y").to_string())
        .unwrap_or_default();
    let mut out = format!("Cy{}{:04}{year}, {n},\n", config.region, track.id);

    for (k, p) in track.points.iter().enumerate() {
        let c = &p.center;
        let wind = if c.max_wind > 0.0 {
            MetersPerSecond::new(c.max_wind).to_kilometers_per_hour()
        } else {
            c.max_wind
        };
        let outer_radius = if config.cyclone_type == CycloneType::Ec {
            NOT_COMPUTED
        } else {
            c.outer_radius
        };
        let zero_as_missing = |v: f64| if v == 0.0 { NOT_COMPUTED } else { v };
        let phase = track.thermal.phases.get(k).copied().unwrap_or(CyclonePhase::Undefined);
        let (vtu, vtl) = track
            .thermal
            .winds
            .get(k)
            .map_or((NOT_COMPUTED, NOT_COMPUTED), |w| (w.vtu, w.vtl));
        let b = track.thermal.b.get(k).copied().unwrap_or(NOT_COMPUTED);

        let _ = writeln!(
            out,
            "{}, {},{},{},{},{},{},{},{},   {},{},{},{},",
            p.time.format("%Y%m%d"),
            p.time.format("%H"),
            field(c.position.lat, 2),
            field(c.position.lon, 2),
            field(c.min_pressure, 2),
            field(wind, 2),
            field(outer_radius, 2),
            field(zero_as_missing(c.closed_pressure), 2),
            field(zero_as_missing(c.roci), 2),
            phase.label(),
            field(vtu, 0),
            field(vtl, 0),
            field(b, 0),
        );
    }
    out
}

/// Streams tracks into any writer
pub struct TrackWriter<'a, W: Write> {
    out: W,
    config: &'a TrackerConfig,
}

impl<'a, W: Write> TrackWriter<'a, W> {
    pub fn new(out: W, config: &'a TrackerConfig) -> Self {
        Self { out, config }
    }

    /// Append one track
    ///
    /// # Errors
    /// Returns the underlying I/O error.
    pub fn write_track(&mut self, track: &AcceptedTrack) -> std::io::Result<()> {
        self.out.write_all(format_track(track, self.config).as_bytes())
    }

    /// Flush and hand back the writer
    ///
    /// # Errors
    /// Returns the underlying I/O error.
    pub fn finish(mut self) -> std::io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Write every track into `dir`, returning the file path
///
/// # Errors
/// Returns [`TrackerError::Io`] if the file cannot be created or written.
pub fn write_track_file(
    dir: &Path,
    config: &TrackerConfig,
    timeline: &Timeline,
    tracks: &[AcceptedTrack],
) -> Result<PathBuf> {
    let path = dir.join(track_file_name(config, timeline));
    let file = File::create(&path).map_err(|e| TrackerError::io(&path, e))?;
    let mut writer = TrackWriter::new(BufWriter::new(file), config);
    for track in tracks {
        writer.write_track(track).map_err(|e| TrackerError::io(&path, e))?;
    }
    writer.finish().map_err(|e| TrackerError::io(&path, e))?;
    Ok(path)
}
