//! Greedy merging of nearby detections
//!
//! Candidates are visited in input order. When a candidate has unvisited
//! neighbours within the threshold, the deepest member of that cluster is
//! kept (the first one on exact ties) and the whole cluster is retired.
//! The same pass runs on raw candidates and again on characterised centres,
//! since re-centring can pull two candidates onto the same low.

use crate::detection::{Candidate, CriticalCenter};
use crate::core_types::GeoPoint;
use crate::geometry::great_circle_distance;

/// Something with a position and a central pressure
pub trait Clustered {
    /// Position used for distances
    fn position(&self) -> GeoPoint;
    /// Pressure used to pick the cluster representative
    fn pressure(&self) -> f64;
}

impl Clustered for Candidate {
    fn position(&self) -> GeoPoint {
        self.position
    }
    fn pressure(&self) -> f64 {
        self.pressure
    }
}

impl Clustered for CriticalCenter {
    fn position(&self) -> GeoPoint {
        self.position
    }
    fn pressure(&self) -> f64 {
        self.min_pressure
    }
}

/// Keep one representative per cluster of items closer than `threshold_km`
pub fn deduplicate<T: Clustered + Clone>(items: &[T], threshold_km: f64) -> Vec<T> {
    let finite =
        |t: &T| t.position().is_finite() && t.pressure().is_finite();
    let mut alive: Vec<bool> = items.iter().map(finite).collect();
    let mut kept = Vec::new();

    for i in 0..items.len() {
        if !alive[i] {
            continue;
        }
        let pi = items[i].position();
        let matches: Vec<usize> = (0..items.len())
            .filter(|&j| j != i && alive[j])
            .filter(|&j| great_circle_distance(pi, items[j].position()) < threshold_km)
            .collect();

        if matches.is_empty() {
            kept.push(items[i].clone());
        } else {
            let mut best = i;
            for &j in &matches {
                if items[j].pressure() < items[best].pressure() {
                    best = j;
                }
            }
            kept.push(items[best].clone());
            for &j in &matches {
                alive[j] = false;
            }
        }
        alive[i] = false;
    }
    kept
}
