//! Analysis timesteps and their division among detection workers

use chrono::{Duration, NaiveDateTime};
use std::ops::Range;

use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};

/// Key used to name per-timestep records, `YYYYMMDDHH`
pub fn record_key(time: NaiveDateTime) -> String {
    time.format("%Y%m%d%H").to_string()
}

/// Ordered analysis times from start to end inclusive every `dt_h` hours
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    times: Vec<NaiveDateTime>,
    dt_h: u32,
}

impl Timeline {
    /// Build the timeline.
    ///
    /// # Errors
    /// Returns [`TrackerError::Config`] if `dt_h` is zero or `end` precedes `start`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, dt_h: u32) -> Result<Self> {
        if dt_h == 0 {
            return Err(TrackerError::Config("dt_h must be positive".to_string()));
        }
        if end < start {
            return Err(TrackerError::Config(format!(
                "end date {end} is before start date {start}"
            )));
        }
        let step = Duration::hours(i64::from(dt_h));
        let mut times = Vec::new();
        let mut t = start;
        while t <= end {
            times.push(t);
            t += step;
        }
        Ok(Self { times, dt_h })
    }

    /// Timeline of a configuration's date range
    ///
    /// # Errors
    /// Returns [`TrackerError::Config`] if either date is unset or the range is invalid.
    pub fn from_config(config: &TrackerConfig) -> Result<Self> {
        let (Some(start), Some(end)) = (config.start, config.end) else {
            return Err(TrackerError::Config(
                "start and end dates must both be set".to_string(),
            ));
        };
        Self::new(start, end, config.dt_h)
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Hours between consecutive timesteps
    pub fn dt_h(&self) -> u32 {
        self.dt_h
    }

    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    /// Time of timestep `index`
    pub fn time(&self, index: usize) -> Option<NaiveDateTime> {
        self.times.get(index).copied()
    }

    /// Look-back times that precede the first timestep: every `dt_h` hours
    /// over the `prev_days` days before the start, oldest first. These feed
    /// the climatological baseline and are never tracked.
    pub fn look_back(&self, prev_days: u32) -> Vec<NaiveDateTime> {
        let Some(&start) = self.times.first() else {
            return Vec::new();
        };
        let span = Duration::days(i64::from(prev_days));
        let step = Duration::hours(i64::from(self.dt_h));
        let mut times = Vec::new();
        let mut t = start - span;
        while t < start {
            times.push(t);
            t += step;
        }
        times
    }
}

/// Times whose pressure is averaged into the baseline of `time`: the same
/// hour on each of the `prev_days` previous days, oldest first
pub fn baseline_times(time: NaiveDateTime, prev_days: u32) -> Vec<NaiveDateTime> {
    (1..=prev_days)
        .rev()
        .map(|d| time - Duration::days(i64::from(d)))
        .collect()
}

/// Split `total` timesteps into contiguous ranges for `workers` workers.
///
/// The first `total % workers` ranges hold one extra timestep.
///
/// # Errors
/// Returns [`TrackerError::Config`] when there are no workers or more
/// workers than timesteps.
pub fn partition(total: usize, workers: usize) -> Result<Vec<Range<usize>>> {
    if workers == 0 {
        return Err(TrackerError::Config("at least one worker is required".to_string()));
    }
    if workers > total {
        return Err(TrackerError::Config(format!(
            "{workers} workers requested for only {total} timesteps"
        )));
    }
    let base = total / workers;
    let extra = total % workers;
    let mut ranges = Vec::with_capacity(workers);
    let mut start = 0;
    for w in 0..workers {
        let len = base + usize::from(w < extra);
        ranges.push(start..start + len);
        start += len;
    }
    Ok(ranges)
}
