//! Which centres have been taken by a trajectory

use rustc_hash::{FxHashMap, FxHashSet};

use crate::detection::CriticalCenter;

/// Claimed centre indices per timestep index.
///
/// A claim is permanent: once taken a centre can never seed or extend
/// another trajectory.
#[derive(Debug, Clone, Default)]
pub struct ClaimTable {
    claimed: FxHashMap<usize, FxHashSet<usize>>,
}

impl ClaimTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding every centre already flagged as consumed in `records`
    pub fn from_records(records: &[Option<Vec<CriticalCenter>>]) -> Self {
        let mut table = Self::new();
        for (t, record) in records.iter().enumerate() {
            for (i, c) in record.iter().flatten().enumerate() {
                if c.consumed {
                    table.claim(t, i);
                }
            }
        }
        table
    }

    /// Claim centre `index` of timestep `t`; `false` if it was already taken
    pub fn claim(&mut self, t: usize, index: usize) -> bool {
        self.claimed.entry(t).or_default().insert(index)
    }

    pub fn is_claimed(&self, t: usize, index: usize) -> bool {
        self.claimed.get(&t).is_some_and(|s| s.contains(&index))
    }

    /// Claimed indices of timestep `t`
    pub fn claimed_at(&self, t: usize) -> Option<&FxHashSet<usize>> {
        self.claimed.get(&t)
    }

    /// Timestep indices with at least one claim, ascending
    pub fn timesteps(&self) -> Vec<usize> {
        let mut ts: Vec<usize> = self
            .claimed
            .iter()
            .filter(|(_, s)| !s.is_empty())
            .map(|(&t, _)| t)
            .collect();
        ts.sort_unstable();
        ts
    }

    /// Total number of claims
    pub fn len(&self) -> usize {
        self.claimed.values().map(FxHashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
