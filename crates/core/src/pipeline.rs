//! Run orchestration: parallel detection, a barrier, then sequential linking
//!
//! Detection workers each own a contiguous range of timesteps and share only
//! the configuration and the field source. Every timestep with data produces
//! one record in the [`RecordStore`]; the linker then reads the records back
//! in order and writes the claims it made.

use chrono::NaiveDateTime;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::TrackerConfig;
use crate::detection::{deduplicate, CenterDetector, CriticalCenter, StructureCharacterizer};
use crate::error::{Result, TrackerError};
use crate::grid::{ScalarField, SurfaceFields, UpperAirField};
use crate::thermal::{ThermalClassifier, ThermalWind};
use crate::timeline::{baseline_times, partition, Timeline};
use crate::tracking::{LinkInputs, LinkReport, RecordStore, TrajectoryLinker};

/// Provider of gridded fields per analysis time.
///
/// `Ok(None)` means the time has no data, which the pipeline treats as a gap
/// rather than an error.
pub trait FieldSource: Sync {
    /// Surface pressure, winds and terrain at `time`
    ///
    /// # Errors
    /// Returns an error if data exists but cannot be decoded.
    fn surface(&self, time: NaiveDateTime) -> Result<Option<SurfaceFields>>;

    /// Geopotential heights on pressure levels at `time`
    ///
    /// # Errors
    /// Returns an error if data exists but cannot be decoded.
    fn upper_air(&self, time: NaiveDateTime) -> Result<Option<UpperAirField>>;
}

/// Counts gathered by the detection phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionSummary {
    /// Timesteps that had surface data
    pub timesteps: usize,
    /// Centres written across all records
    pub centers: usize,
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct TrackingRun {
    pub timeline: Timeline,
    pub detection: DetectionSummary,
    pub report: LinkReport,
}

/// Drives a run over one field source and one record store
pub struct Tracker<'a, S: FieldSource, R: RecordStore> {
    config: &'a TrackerConfig,
    source: &'a S,
    store: &'a R,
}

impl<'a, S: FieldSource, R: RecordStore> Tracker<'a, S, R> {
    pub fn new(config: &'a TrackerConfig, source: &'a S, store: &'a R) -> Self {
        Self {
            config,
            source,
            store,
        }
    }

    /// Validate the configuration, detect every timestep, then link.
    ///
    /// # Errors
    /// Returns the first fatal error: an invalid configuration, a worker
    /// pool failure, a source failure or a store failure. A missing pressure
    /// level only rejects the trajectories that need it.
    pub fn run(&self) -> Result<TrackingRun> {
        self.config.validate()?;
        let timeline = Timeline::from_config(self.config)?;
        let detection = self.run_detection(&timeline)?;
        let report = self.run_linking(&timeline)?;
        info!(
            tracks = report.tracks.len(),
            rejected = report.rejected,
            centers = detection.centers,
            "run finished"
        );
        Ok(TrackingRun {
            timeline,
            detection,
            report,
        })
    }

    /// Detect every timestep of `timeline` on a pool of `config.workers` threads.
    ///
    /// # Errors
    /// Returns [`TrackerError::Config`] for more workers than timesteps,
    /// [`TrackerError::WorkerPool`] if the pool cannot start, or the first
    /// error raised by a worker.
    pub fn run_detection(&self, timeline: &Timeline) -> Result<DetectionSummary> {
        let workers = self.config.workers;
        let ranges = partition(timeline.len(), workers)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| TrackerError::WorkerPool(e.to_string()))?;
        info!(workers, timesteps = timeline.len(), "detection started");

        let per_worker: Vec<DetectionSummary> = pool.install(|| {
            ranges
                .par_iter()
                .map(|range| -> Result<DetectionSummary> {
                    let mut summary = DetectionSummary::default();
                    for &time in &timeline.times()[range.clone()] {
                        if let Some(n) = self.detect_timestep(time)? {
                            summary.timesteps += 1;
                            summary.centers += n;
                        }
                    }
                    Ok(summary)
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let summary = per_worker
            .into_iter()
            .fold(DetectionSummary::default(), |acc, s| DetectionSummary {
                timesteps: acc.timesteps + s.timesteps,
                centers: acc.centers + s.centers,
            });
        info!(
            timesteps = summary.timesteps,
            centers = summary.centers,
            "detection finished"
        );
        Ok(summary)
    }

    /// Detect, characterise and store the centres of one timestep.
    ///
    /// Returns the number of centres written, or `None` when the timestep
    /// had no surface data and no record was written. With upper-air checking
    /// on, centres whose thermal winds cannot be computed (no heights at
    /// `time`, or a mandatory level missing) are stored with
    /// [`NOT_COMPUTED`](crate::NOT_COMPUTED) winds.
    ///
    /// # Errors
    /// Returns an error if the source fails or if the record cannot be
    /// stored.
    pub fn detect_timestep(&self, time: NaiveDateTime) -> Result<Option<usize>> {
        let cfg = self.config;
        let Some(fields) = self.source.surface(time)? else {
            warn!(%time, "no surface data, timestep skipped");
            return Ok(None);
        };
        let anomaly = if cfg.anomaly_enabled() {
            self.anomaly(time, &fields)?
        } else {
            None
        };

        let candidates = CenterDetector::new(cfg).detect(&fields, anomaly.as_ref());
        let candidates = deduplicate(&candidates, *cfg.filter_center_threshold);
        let characterizer = StructureCharacterizer::new(cfg, &fields);
        let characterized: Vec<CriticalCenter> = candidates
            .iter()
            .filter_map(|c| characterizer.characterize(c))
            .collect();
        let mut centers = deduplicate(&characterized, *cfg.filter_center_threshold);

        if cfg.upper_air && !centers.is_empty() {
            let upper = self.source.upper_air(time)?;
            if upper.is_none() {
                warn!(%time, "no upper-air data, thermal winds not computed");
            }
            let classifier = ThermalClassifier::new(cfg);
            for c in &mut centers {
                let wind = match classifier.thermal_wind_at(
                    upper.as_ref(),
                    c.position,
                    ThermalWind::NOT_COMPUTED,
                ) {
                    Ok(wind) => wind,
                    // Left to the thermal check of the trajectory that uses this centre
                    Err(e) if !e.is_fatal() => {
                        warn!(%time, error = %e, "thermal winds not computed");
                        ThermalWind::NOT_COMPUTED
                    }
                    Err(e) => return Err(e),
                };
                c.vtu = wind.vtu;
                c.vtl = wind.vtl;
            }
        }

        debug!(
            %time,
            candidates = candidates.len(),
            centers = centers.len(),
            "timestep detected"
        );
        self.store.write(time, &centers)?;
        Ok(Some(centers.len()))
    }

    /// Pressure minus the mean pressure at the same hour of the previous days
    fn anomaly(&self, time: NaiveDateTime, fields: &SurfaceFields) -> Result<Option<ScalarField>> {
        let mut baseline = Vec::new();
        for t in baseline_times(time, self.config.prev_days) {
            if let Some(previous) = self.source.surface(t)? {
                baseline.push(previous.mslp);
            }
        }
        match ScalarField::mean(&baseline)? {
            Some(mean) => fields.mslp.difference(&mean).map(Some),
            None => {
                warn!(%time, "no baseline fields, anomaly test skipped");
                Ok(None)
            }
        }
    }

    /// Read every record back, link trajectories and write the claims.
    ///
    /// # Errors
    /// Returns an error if a record cannot be read or rewritten, or if the
    /// source fails while loading upper-air data.
    pub fn run_linking(&self, timeline: &Timeline) -> Result<LinkReport> {
        let records = timeline
            .times()
            .iter()
            .map(|&t| self.store.read(t))
            .collect::<Result<Vec<_>>>()?;
        let upper_air = if self.config.upper_air {
            timeline
                .times()
                .iter()
                .map(|&t| self.source.upper_air(t))
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };

        let report = TrajectoryLinker::new(self.config).link(&LinkInputs {
            timeline,
            records: &records,
            upper_air: &upper_air,
        })?;

        for t in report.claims.timesteps() {
            let (Some(time), Some(claimed)) = (timeline.time(t), report.claims.claimed_at(t)) else {
                continue;
            };
            self.store.write_claims(time, claimed)?;
        }
        Ok(report)
    }
}
