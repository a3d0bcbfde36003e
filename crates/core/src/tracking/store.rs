//! Per-timestep record store between detection and linking
//!
//! Detection workers each write the records of their own timesteps; the
//! linker reads them back after the barrier and is the only writer of claim
//! updates. A timestep without a record means its fields were unavailable,
//! while an empty record means nothing was detected.

use chrono::NaiveDateTime;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use crate::detection::CriticalCenter;
use crate::error::{Result, TrackerError};
use crate::timeline::record_key;

/// Storage for accepted centres keyed by timestep
pub trait RecordStore: Send + Sync {
    /// Replace the record of `time`
    ///
    /// # Errors
    /// Returns an error if the record cannot be persisted.
    fn write(&self, time: NaiveDateTime, centers: &[CriticalCenter]) -> Result<()>;

    /// Record of `time`, `None` when it was never written
    ///
    /// # Errors
    /// Returns an error if a stored record cannot be read or decoded.
    fn read(&self, time: NaiveDateTime) -> Result<Option<Vec<CriticalCenter>>>;

    /// Mark the centres at `claimed` indices of `time` as consumed.
    ///
    /// # Errors
    /// Returns an error if the record cannot be read back or rewritten.
    fn write_claims(&self, time: NaiveDateTime, claimed: &FxHashSet<usize>) -> Result<()> {
        let Some(mut centers) = self.read(time)? else {
            return Ok(());
        };
        for (i, c) in centers.iter_mut().enumerate() {
            c.consumed |= claimed.contains(&i);
        }
        self.write(time, &centers)
    }
}

/// Text records `critical_centers_{YYYYMMDDHH}.dat` in a directory
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Store rooted at `root`, creating the directory if needed
    ///
    /// # Errors
    /// Returns [`TrackerError::Io`] if the directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| TrackerError::io(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding the record of `time`
    pub fn path_for(&self, time: NaiveDateTime) -> PathBuf {
        self.root
            .join(format!("critical_centers_{}.dat", record_key(time)))
    }
}

impl RecordStore for DirectoryStore {
    fn write(&self, time: NaiveDateTime, centers: &[CriticalCenter]) -> Result<()> {
        let path = self.path_for(time);
        let tmp = path.with_extension("dat.tmp");
        let mut contents = String::new();
        for c in centers {
            contents.push_str(&c.to_row());
            contents.push('\n');
        }
        fs::write(&tmp, contents).map_err(|e| TrackerError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| TrackerError::io(&path, e))
    }

    fn read(&self, time: NaiveDateTime) -> Result<Option<Vec<CriticalCenter>>> {
        let path = self.path_for(time);
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TrackerError::io(&path, e)),
        };
        let mut centers = Vec::new();
        for (line_idx, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let center = CriticalCenter::from_row(line).map_err(|message| TrackerError::RecordParse {
                path: path.display().to_string(),
                line: line_idx + 1,
                message,
            })?;
            centers.push(center);
        }
        Ok(Some(centers))
    }
}

/// Records kept in memory, for tests and single-process runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<FxHashMap<NaiveDateTime, Vec<CriticalCenter>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timesteps with a record
    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for MemoryStore {
    fn write(&self, time: NaiveDateTime, centers: &[CriticalCenter]) -> Result<()> {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(time, centers.to_vec());
        Ok(())
    }

    fn read(&self, time: NaiveDateTime) -> Result<Option<Vec<CriticalCenter>>> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&time)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::GeoPoint;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 8, 14)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn center(lat: f64) -> CriticalCenter {
        CriticalCenter {
            position: GeoPoint::new(lat, -60.5),
            min_pressure: 996.25,
            max_wind: 18.5,
            closed_pressure: 1008.0,
            roci: 412.7,
            outer_radius: 250.0,
            vtu: 0.0,
            vtl: 0.0,
            consumed: false,
        }
    }

    fn exercise(store: &dyn RecordStore) {
        assert!(store.read(at(0)).unwrap().is_none());
        store.write(at(6), &[]).unwrap();
        assert_eq!(store.read(at(6)).unwrap(), Some(Vec::new()));

        let centers = vec![center(15.0), center(25.0), center(35.0)];
        store.write(at(12), &centers).unwrap();
        assert_eq!(store.read(at(12)).unwrap().unwrap(), centers);

        let claimed: FxHashSet<usize> = [0, 2].into_iter().collect();
        store.write_claims(at(12), &claimed).unwrap();
        let back = store.read(at(12)).unwrap().unwrap();
        assert_eq!(
            back.iter().map(|c| c.consumed).collect::<Vec<_>>(),
            vec![true, false, true]
        );
        // Claims on a missing record are a no-op
        store.write_claims(at(18), &claimed).unwrap();
        assert!(store.read(at(18)).unwrap().is_none());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        exercise(&store);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_directory_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path().join("records")).unwrap();
        exercise(&store);
        assert!(store.path_for(at(12)).ends_with("critical_centers_2021081412.dat"));
        assert!(!store.path_for(at(12)).with_extension("dat.tmp").exists());
    }

    #[test]
    fn test_directory_store_reports_bad_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path()).unwrap();
        fs::write(store.path_for(at(0)), "1 2 3\n").unwrap();
        let err = store.read(at(0)).unwrap_err();
        assert!(matches!(err, TrackerError::RecordParse { line: 1, .. }));
    }
}
