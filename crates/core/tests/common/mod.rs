//! Shared helpers for integration tests
#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use stormtrack_core::{CriticalCenter, GeoPoint, Timeline};

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2017, 9, 5)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Time of timestep `k` on a 6-hourly series from [`start`]
pub fn step(k: usize) -> NaiveDateTime {
    start() + Duration::hours(6 * k as i64)
}

pub fn timeline(steps: usize) -> Timeline {
    Timeline::new(start(), step(steps - 1), 6).unwrap()
}

pub fn center(lat: f64, lon: f64) -> CriticalCenter {
    CriticalCenter {
        position: GeoPoint::new(lat, lon),
        min_pressure: 985.0,
        max_wind: 22.0,
        closed_pressure: 1008.0,
        roci: 350.0,
        outer_radius: 280.0,
        vtu: 0.0,
        vtl: 0.0,
        consumed: false,
    }
}
