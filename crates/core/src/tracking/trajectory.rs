//! Trajectories under construction and accepted tracks

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::core_types::{is_missing, longitude_delta, GeoPoint, UNDEFINED};
use crate::detection::CriticalCenter;
use crate::geometry::great_circle_distance;
use crate::thermal::ThermalAssessment;

/// One point of a trajectory
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    /// Analysis time
    pub time: NaiveDateTime,
    /// Timestep index in the timeline
    pub step: usize,
    /// Centre at that time
    pub center: CriticalCenter,
    /// Interpolated across a missed timestep rather than detected
    pub bridged: bool,
}

impl TrackPoint {
    /// Midpoint between `self` and `next`, placed at `time`.
    ///
    /// Scalar attributes are averaged; the longitude is averaged across the
    /// antimeridian, and an undefined outer radius on either side stays
    /// undefined. The thermal winds are left for the caller to fill in.
    pub fn bridge_to(&self, next: &CriticalCenter, time: NaiveDateTime, step: usize) -> Self {
        let a = &self.center;
        let mid = |x: f64, y: f64| (x + y) / 2.0;
        let lon = a.position.lon + longitude_delta(a.position.lon, next.position.lon) / 2.0;
        let outer_radius = if is_missing(a.outer_radius) || is_missing(next.outer_radius) {
            UNDEFINED
        } else {
            mid(a.outer_radius, next.outer_radius)
        };
        Self {
            time,
            step,
            center: CriticalCenter {
                position: GeoPoint::new(mid(a.position.lat, next.position.lat), lon),
                min_pressure: mid(a.min_pressure, next.min_pressure),
                max_wind: mid(a.max_wind, next.max_wind),
                closed_pressure: mid(a.closed_pressure, next.closed_pressure),
                roci: mid(a.roci, next.roci),
                outer_radius,
                vtu: a.vtu,
                vtl: a.vtl,
                consumed: true,
            },
            bridged: true,
        }
    }
}

/// Why a trajectory stopped growing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// The next timestep had no data or no centres
    MissingData,
    /// Data was present but nothing matched and no gap could be bridged
    NoMatch,
    /// The last timestep was reached
    EndOfSeries,
}

impl Termination {
    /// Whether the travelled-distance gate applies
    pub fn checks_distance(self) -> bool {
        self == Self::NoMatch
    }
}

/// A trajectory being grown by the linker
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub points: Vec<TrackPoint>,
}

impl Trajectory {
    /// Single-point trajectory seeded by `center`
    pub fn seed(time: NaiveDateTime, step: usize, center: CriticalCenter) -> Self {
        Self {
            points: vec![TrackPoint {
                time,
                step,
                center,
                bridged: false,
            }],
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&TrackPoint> {
        self.points.last()
    }

    pub fn push(&mut self, point: TrackPoint) {
        self.points.push(point);
    }

    /// Duration covered, `(n − 1) · dt_h` hours
    pub fn lifetime_hours(&self, dt_h: u32) -> f64 {
        self.points.len().saturating_sub(1) as f64 * f64::from(dt_h)
    }

    /// Largest peak wind along the trajectory, m/s
    pub fn max_wind(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.center.max_wind)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Sum of great-circle legs between consecutive points, km
    pub fn distance_travelled(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| great_circle_distance(w[0].center.position, w[1].center.position))
            .sum()
    }
}

/// A trajectory that passed every gate
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedTrack {
    /// System identifier, starting at 1 in acceptance order
    pub id: u32,
    pub points: Vec<TrackPoint>,
    /// Thermal parameters and phase labels per point
    pub thermal: ThermalAssessment,
    pub termination: Termination,
}
