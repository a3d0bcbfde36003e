//! Gap bridging and acceptance gates of the trajectory linker

mod common;

use common::{center, timeline};
use stormtrack_core::core_types::{Hours, Kilometers};
use stormtrack_core::tracking::{LinkInputs, LinkReport, Termination, TrajectoryLinker};
use stormtrack_core::{CriticalCenter, CycloneType, TrackerConfig};

fn config(dt_lifetime: f64) -> TrackerConfig {
    let mut cfg = TrackerConfig::for_cyclone_type(CycloneType::Tc);
    cfg.dist_threshold = Kilometers::new(300.0);
    cfg.dt_lifetime = Hours::new(dt_lifetime);
    cfg
}

fn link(cfg: &TrackerConfig, records: &[Option<Vec<CriticalCenter>>]) -> LinkReport {
    let tl = timeline(records.len());
    TrajectoryLinker::new(cfg)
        .link(&LinkInputs {
            timeline: &tl,
            records,
            upper_air: &[],
        })
        .unwrap()
}

/// Far from everything else, so it never matches
fn distractor() -> CriticalCenter {
    center(40.0, -120.0)
}

#[test]
fn test_straight_line_gap_is_bridged() {
    let cfg = config(6.0);
    let records = vec![
        Some(vec![center(10.0, -40.0)]),
        Some(vec![center(12.0, -40.0)]),
        Some(vec![distractor()]),
        Some(vec![center(16.0, -40.0)]),
    ];
    let report = link(&cfg, &records);

    assert_eq!(report.tracks.len(), 1);
    let track = &report.tracks[0];
    assert_eq!(track.points.len(), 4);
    assert!(track.points[2].bridged);
    assert!((track.points[2].center.position.lat - 14.0).abs() < 1e-9);
    assert_eq!(track.points[3].center.position.lat, 16.0);
    // The distractor seeded its own one-point trajectory
    assert_eq!(report.rejected, 1);
    assert!(report.claims.is_claimed(3, 0));
}

#[test]
fn test_right_angle_turn_terminates() {
    let cfg = config(6.0);
    let records = vec![
        Some(vec![center(10.0, -40.0)]),
        Some(vec![center(12.0, -40.0)]),
        Some(vec![distractor()]),
        Some(vec![center(12.0, -36.0)]),
    ];
    let report = link(&cfg, &records);

    assert_eq!(report.tracks.len(), 1);
    let track = &report.tracks[0];
    assert_eq!(track.points.len(), 2);
    assert!(track.points.iter().all(|p| !p.bridged));
    assert_eq!(track.termination, Termination::NoMatch);
    // Distractor and the eastern centre both stay unlinked
    assert_eq!(report.rejected, 2);
}

/// Only a single missing step can be bridged: with two unmatched steps the
/// trajectory ends even though the storm reappears on the same heading.
#[test]
fn test_two_step_gap_is_not_bridged() {
    let cfg = config(6.0);
    let records = vec![
        Some(vec![center(10.0, -40.0)]),
        Some(vec![center(12.0, -40.0)]),
        Some(vec![distractor()]),
        Some(vec![center(-40.0, 60.0)]),
        Some(vec![center(18.0, -40.0)]),
    ];
    let report = link(&cfg, &records);

    assert_eq!(report.tracks.len(), 1);
    let track = &report.tracks[0];
    assert_eq!(track.points.len(), 2);
    assert_eq!(track.termination, Termination::NoMatch);
    // The reappearing storm seeds its own one-point trajectory
    assert_eq!(report.rejected, 3);
}

#[test]
fn test_short_trajectory_rejected_regardless_of_intensity() {
    let cfg = config(24.0);
    let strong = |lat: f64| {
        let mut c = center(lat, -40.0);
        c.max_wind = 70.0;
        Some(vec![c])
    };
    let records = vec![strong(10.0), strong(11.0), strong(12.0)];
    let report = link(&cfg, &records);
    assert!(report.tracks.is_empty());
    assert_eq!(report.rejected, 1);
    assert_eq!(report.claims.len(), 3);
}

#[test]
fn test_weak_trajectory_rejected_by_intensity() {
    let cfg = config(6.0);
    let weak = |lat: f64| {
        let mut c = center(lat, -40.0);
        c.max_wind = 9.0;
        Some(vec![c])
    };
    let records = vec![weak(10.0), weak(11.0), weak(12.0)];
    let report = link(&cfg, &records);
    assert!(report.tracks.is_empty());
}
