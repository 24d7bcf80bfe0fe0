//! Snapshot Output
//!
//! Periodic line snapshots written as JSON files.

use std::fs;
use std::path::{Path, PathBuf};

use metro_events::{generate_snapshot_id, TickSnapshot};

use super::OutputError;

/// Decides when to snapshot and numbers the files
pub struct SnapshotGenerator {
    next_snapshot_id: u64,
    snapshot_interval: u64,
    last_snapshot_tick: Option<u64>,
}

impl SnapshotGenerator {
    pub fn new(snapshot_interval: u64) -> Self {
        Self {
            next_snapshot_id: 1,
            snapshot_interval: snapshot_interval.max(1),
            last_snapshot_tick: None,
        }
    }

    pub fn should_snapshot(&self, current_tick: u64) -> bool {
        current_tick % self.snapshot_interval == 0 && self.last_snapshot_tick != Some(current_tick)
    }

    pub fn next_id(&mut self) -> String {
        let id = generate_snapshot_id(self.next_snapshot_id);
        self.next_snapshot_id += 1;
        id
    }

    pub fn mark_snapshot(&mut self, tick: u64) {
        self.last_snapshot_tick = Some(tick);
    }

    pub fn last_snapshot_tick(&self) -> Option<u64> {
        self.last_snapshot_tick
    }

    pub fn snapshot_count(&self) -> u64 {
        self.next_snapshot_id - 1
    }

    /// Writes `snapshot` under `<dir>/snapshots/` and records it.
    pub fn write(&mut self, dir: &Path, snapshot: &TickSnapshot) -> Result<PathBuf, OutputError> {
        let id = self.next_id();
        let path = write_snapshot_to_dir(dir, &id, snapshot)?;
        self.mark_snapshot(snapshot.timestamp.tick);
        Ok(path)
    }
}

/// Write a snapshot to `<dir>/snapshots/<id>.json`
pub fn write_snapshot_to_dir(dir: &Path, id: &str, snapshot: &TickSnapshot) -> Result<PathBuf, OutputError> {
    let snapshots = dir.join("snapshots");
    fs::create_dir_all(&snapshots)?;
    let path = snapshots.join(format!("{}.json", id));
    fs::write(&path, snapshot.to_json_pretty()?)?;
    Ok(path)
}
