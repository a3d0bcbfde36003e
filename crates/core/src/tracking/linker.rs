//! Temporal linking of per-timestep centres into trajectories
//!
//! Timesteps are scanned in order; every unclaimed centre seeds a trajectory
//! that is grown forward one timestep at a time:
//!
//! ```text
//!            match ≤ d                        match ≤ d
//!   Growing ───────────▶ Growing     GapPending ───────────▶ Growing
//!      │ no match, previous step was a real extension
//!      ├──────────────────────────────▶ GapPending (bridge at j, look at j+1)
//!      │ no data / no centres / last timestep
//!      └──────────────────────────────▶ Terminated
//! ```
//!
//! A bridge needs a centre at j+1 within 2·d that continues the incoming
//! heading to within 0.01 rad. Only one consecutive timestep can be bridged.

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::config::TrackerConfig;
use crate::core_types::GeoPoint;
use crate::detection::CriticalCenter;
use crate::error::{Result, TrackerError};
use crate::geometry::{bearing, great_circle_distance, turning_angle};
use crate::grid::UpperAirField;
use crate::thermal::{ThermalClassifier, ThermalSample, ThermalWind};
use crate::timeline::Timeline;
use crate::tracking::claims::ClaimTable;
use crate::tracking::trajectory::{AcceptedTrack, Termination, TrackPoint, Trajectory};

/// Largest heading change, in radians, a gap bridge may introduce
pub const MAX_BRIDGE_TURN: f64 = 0.01;

/// Outcome of a linking pass
#[derive(Debug, Clone, Default)]
pub struct LinkReport {
    /// Accepted tracks in acceptance order
    pub tracks: Vec<AcceptedTrack>,
    /// Trajectories discarded by a gate
    pub rejected: usize,
    /// Centres claimed during the pass
    pub claims: ClaimTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkState {
    /// Next timestep to extend into
    Growing(usize),
    /// A bridge was placed at `j - 1`; `j` must match directly
    GapPending(usize),
    Terminated(Termination),
}

/// Per-timestep inputs of a linking pass
pub struct LinkInputs<'a> {
    pub timeline: &'a Timeline,
    /// Record per timestep; `None` when the timestep had no data
    pub records: &'a [Option<Vec<CriticalCenter>>],
    /// Heights per timestep, empty when upper-air checking is off
    pub upper_air: &'a [Option<UpperAirField>],
}

impl LinkInputs<'_> {
    fn centers(&self, j: usize) -> Option<&[CriticalCenter]> {
        self.records
            .get(j)
            .and_then(Option::as_deref)
            .filter(|c| !c.is_empty())
    }

    fn upper(&self, j: usize) -> Option<&UpperAirField> {
        self.upper_air.get(j).and_then(Option::as_ref)
    }

    fn time(&self, j: usize) -> Result<NaiveDateTime> {
        self.timeline.time(j).ok_or_else(|| {
            TrackerError::ShapeMismatch(format!("timestep {j} is outside the timeline"))
        })
    }
}

/// Grows and gates trajectories
pub struct TrajectoryLinker<'a> {
    config: &'a TrackerConfig,
    classifier: ThermalClassifier<'a>,
}

impl<'a> TrajectoryLinker<'a> {
    pub fn new(config: &'a TrackerConfig) -> Self {
        Self {
            config,
            classifier: ThermalClassifier::new(config),
        }
    }

    /// Link every record into trajectories.
    ///
    /// Centres already flagged as consumed in the records are never reused.
    ///
    /// # Errors
    /// Returns [`TrackerError::ShapeMismatch`] if the records do not cover
    /// the timeline.
    pub fn link(&self, inputs: &LinkInputs<'_>) -> Result<LinkReport> {
        let total = inputs.timeline.len();
        if inputs.records.len() != total {
            return Err(TrackerError::ShapeMismatch(format!(
                "{} records for {total} timesteps",
                inputs.records.len()
            )));
        }
        info!(timesteps = total, "linking trajectories");

        let mut report = LinkReport {
            claims: ClaimTable::from_records(inputs.records),
            ..LinkReport::default()
        };
        let mut next_id = 1u32;
        for t in 0..total {
            let Some(centers) = inputs.records[t].as_deref() else {
                continue;
            };
            for (i, &seed) in centers.iter().enumerate() {
                if !report.claims.claim(t, i) {
                    continue;
                }
                let mut trajectory = Trajectory::seed(inputs.time(t)?, t, seed);
                let termination = self.grow(&mut trajectory, inputs, &mut report.claims)?;
                match self.finish(trajectory, termination, inputs, next_id) {
                    Some(track) => {
                        next_id += 1;
                        report.tracks.push(track);
                    }
                    None => report.rejected += 1,
                }
            }
        }
        info!(
            accepted = report.tracks.len(),
            rejected = report.rejected,
            "linking finished"
        );
        Ok(report)
    }

    fn grow(
        &self,
        trajectory: &mut Trajectory,
        inputs: &LinkInputs<'_>,
        claims: &mut ClaimTable,
    ) -> Result<Termination> {
        let total = inputs.timeline.len();
        let dist = *self.config.dist_threshold;
        let start = trajectory.points[0].step;
        let mut state = LinkState::Growing(start + 1);

        loop {
            let (j, may_bridge) = match state {
                LinkState::Growing(j) => (j, true),
                LinkState::GapPending(j) => (j, false),
                LinkState::Terminated(reason) => return Ok(reason),
            };
            if j >= total {
                state = LinkState::Terminated(Termination::EndOfSeries);
                continue;
            }
            let Some(centers) = inputs.centers(j) else {
                state = LinkState::Terminated(Termination::MissingData);
                continue;
            };
            let Some(last) = trajectory.last().copied() else {
                state = LinkState::Terminated(Termination::NoMatch);
                continue;
            };

            if let Some(k) = nearest_unclaimed(centers, claims, j, last.center.position, dist) {
                claims.claim(j, k);
                let mut center = centers[k];
                center.consumed = true;
                trajectory.push(TrackPoint {
                    time: inputs.time(j)?,
                    step: j,
                    center,
                    bridged: false,
                });
                state = LinkState::Growing(j + 1);
                continue;
            }

            state = if may_bridge && j + 1 < total {
                match self.bridge(trajectory, inputs, claims, j)? {
                    Some(point) => {
                        trajectory.push(point);
                        LinkState::GapPending(j + 1)
                    }
                    None => LinkState::Terminated(Termination::NoMatch),
                }
            } else {
                LinkState::Terminated(Termination::NoMatch)
            };
        }
    }

    /// Synthetic point at `j` towards a straight-ahead centre at `j + 1`
    fn bridge(
        &self,
        trajectory: &Trajectory,
        inputs: &LinkInputs<'_>,
        claims: &ClaimTable,
        j: usize,
    ) -> Result<Option<TrackPoint>> {
        let n = trajectory.len();
        if n < 2 {
            return Ok(None);
        }
        let (prev, last) = (&trajectory.points[n - 2], &trajectory.points[n - 1]);
        let Some(centers) = inputs.centers(j + 1) else {
            return Ok(None);
        };
        let reach = 2.0 * *self.config.dist_threshold;
        let Some(k) = nearest_unclaimed(centers, claims, j + 1, last.center.position, reach) else {
            return Ok(None);
        };
        let candidate = centers[k];

        let incoming = bearing(prev.center.position, last.center.position);
        let outgoing = bearing(last.center.position, candidate.position);
        let turn = turning_angle(incoming, outgoing);
        if turn >= MAX_BRIDGE_TURN {
            debug!(step = j, turn, "gap not bridged, heading changes");
            return Ok(None);
        }

        let mut point = last.bridge_to(&candidate, inputs.time(j)?, j);
        let wind = match self.classifier.thermal_wind_at(
            inputs.upper(j),
            point.center.position,
            ThermalWind::NOT_COMPUTED,
        ) {
            Ok(w) => w,
            Err(e) => {
                warn!(step = j, error = %e, "thermal wind unavailable for bridged point");
                ThermalWind::NOT_COMPUTED
            }
        };
        point.center.vtu = wind.vtu;
        point.center.vtl = wind.vtl;
        debug!(step = j, "gap bridged");
        Ok(Some(point))
    }

    /// Apply the gates and thermal classification to a finished trajectory
    fn finish(
        &self,
        trajectory: Trajectory,
        termination: Termination,
        inputs: &LinkInputs<'_>,
        id: u32,
    ) -> Option<AcceptedTrack> {
        let cfg = self.config;
        let n = trajectory.len();
        let lifetime_ok = trajectory.lifetime_hours(cfg.dt_h) >= *cfg.dt_lifetime;
        let intensity_ok = trajectory.max_wind() > *cfg.intensity_threshold;
        let distance_ok = !termination.checks_distance()
            || trajectory.distance_travelled() >= *cfg.minimum_distance_travelled;
        if !(lifetime_ok && intensity_ok && distance_ok) {
            debug!(
                points = n,
                ?termination,
                lifetime_ok,
                intensity_ok,
                distance_ok,
                "trajectory rejected by gates"
            );
            return None;
        }

        let samples: Vec<ThermalSample<'_>> = trajectory
            .points
            .iter()
            .map(|p| ThermalSample {
                position: p.center.position,
                wind: ThermalWind {
                    vtu: p.center.vtu,
                    vtl: p.center.vtl,
                },
                upper_air: inputs.upper(p.step),
            })
            .collect();
        let thermal = match self.classifier.assess(&samples) {
            Ok(a) => a,
            Err(e) => {
                warn!(points = n, error = %e, "thermal classification failed, trajectory rejected");
                return None;
            }
        };
        if !thermal.accepted {
            debug!(points = n, matching = thermal.matching_points, "trajectory rejected by thermal gate");
            return None;
        }

        debug!(id, points = n, ?termination, "trajectory accepted");
        Some(AcceptedTrack {
            id,
            points: trajectory.points,
            thermal,
            termination,
        })
    }
}

/// Nearest unclaimed centre of timestep `t` within `max_km` of `from`;
/// the first one wins on exact ties
fn nearest_unclaimed(
    centers: &[CriticalCenter],
    claims: &ClaimTable,
    t: usize,
    from: GeoPoint,
    max_km: f64,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (k, c) in centers.iter().enumerate() {
        if claims.is_claimed(t, k) || !c.position.is_finite() {
            continue;
        }
        let d = great_circle_distance(from, c.position);
        if d > max_km {
            continue;
        }
        match best {
            Some((_, bd)) if bd <= d => {}
            _ => best = Some((k, d)),
        }
    }
    best.map(|(k, _)| k)
}
