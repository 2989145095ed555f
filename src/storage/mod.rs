use crate::errors::{MonitorError, Result};
use crate::models::Snapshot;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub const CURRENT_FILE: &str = "inventory_data.json";
pub const PREVIOUS_FILE: &str = "inventory_previous.json";

// ── Snapshot store ────────────────────────────────────────────────────────────

/// Two JSON files: the latest snapshot and the one it is compared against.
///
/// Every write goes to a temp file in the same directory and is renamed over
/// the target, so readers see either the old or the new file, never a torn one.
/// Callers serialize write/promote sequences themselves (see `pipeline`).
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .map_err(|e| MonitorError::Store(format!("Could not create dir {:?}: {}", dir, e)))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn current_path(&self) -> PathBuf {
        self.dir.join(CURRENT_FILE)
    }

    pub fn previous_path(&self) -> PathBuf {
        self.dir.join(PREVIOUS_FILE)
    }

    /// Replace `current` with `snapshot`.
    pub fn write(&self, snapshot: &Snapshot) -> Result<()> {
        let body = serde_json::to_vec_pretty(snapshot)?;
        self.write_atomic(&self.current_path(), &body)?;
        debug!("Wrote current snapshot ({} ids)", snapshot.count());
        Ok(())
    }

    /// Copy `current` into `previous`. Returns false when there is no current.
    pub fn promote(&self) -> Result<bool> {
        let Some(current) = self.read_current()? else {
            return Ok(false);
        };
        let body = serde_json::to_vec_pretty(&current)?;
        self.write_atomic(&self.previous_path(), &body)?;
        info!(
            "Promoted snapshot from {} ({} ids) to previous",
            current.captured_at.to_rfc3339(),
            current.count()
        );
        Ok(true)
    }

    pub fn read_current(&self) -> Result<Option<Snapshot>> {
        read_snapshot(&self.current_path())
    }

    pub fn read_previous(&self) -> Result<Option<Snapshot>> {
        read_snapshot(&self.previous_path())
    }

    fn write_atomic(&self, path: &Path, body: &[u8]) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| MonitorError::Store(format!("temp file in {:?}: {}", self.dir, e)))?;
        tmp.write_all(body)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path)
            .map_err(|e| MonitorError::Store(format!("replace {:?}: {}", path, e.error)))?;
        Ok(())
    }
}

fn read_snapshot(path: &Path) -> Result<Option<Snapshot>> {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(MonitorError::Store(format!("read {:?}: {}", path, e))),
    };
    let snapshot = serde_json::from_slice(&raw)
        .map_err(|e| MonitorError::Store(format!("parse {:?}: {}", path, e)))?;
    Ok(Some(snapshot))
}
