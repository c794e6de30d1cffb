//! Period persistence.
//!
//! The ledger itself never touches disk; a [`PeriodStore`] loads the full
//! sequence at startup and rewrites it after each mutation. Writers hold a
//! [`StoreLock`] across load, modify and save so concurrent processes
//! cannot overwrite each other's changes.

use crate::{Error, Period, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Storage backend for the period sequence
pub trait PeriodStore {
    fn load_all(&self) -> Result<Vec<Period>>;
    fn save_all(&mut self, periods: &[Period]) -> Result<()>;
    fn clear(&mut self) -> Result<()>;

    /// Exclusive access for a load-modify-save cycle, released on drop
    fn lock(&self) -> Result<StoreLock> {
        Ok(StoreLock::default())
    }
}

/// Held exclusive lock on a store; unlocks when dropped
#[derive(Debug, Default)]
pub struct StoreLock {
    file: Option<File>,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = file.unlock() {
                tracing::warn!("Failed to release store lock: {}", e);
            }
        }
    }
}

/// JSON array of periods in a single file, guarded by file locks
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Sidecar file that writers lock; the store file itself is replaced on save
    pub fn lock_path(&self) -> PathBuf {
        self.sibling(".lock")
    }

    /// Where a damaged store file is copied before it is ignored
    pub fn corrupt_copy_path(&self) -> PathBuf {
        self.sibling(".corrupt")
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    }

    fn parent_dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    fn read_locked(&self) -> Result<String> {
        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;
        Ok(contents)
    }

    fn set_aside_corrupt(&self) {
        let backup = self.corrupt_copy_path();
        match std::fs::copy(&self.path, &backup) {
            Ok(_) => tracing::warn!("Copied unreadable period store to {:?}", backup),
            Err(e) => tracing::warn!("Unable to copy unreadable period store to {:?}: {}", backup, e),
        }
    }
}

impl PeriodStore for JsonFileStore {
    /// Load all periods
    ///
    /// Returns an empty sequence if the file doesn't exist. If the file is
    /// corrupted, it is copied aside, a warning is logged and an empty
    /// sequence is returned.
    fn load_all(&self) -> Result<Vec<Period>> {
        if !self.path.exists() {
            tracing::info!("No period store at {:?}, starting empty", self.path);
            return Ok(Vec::new());
        }

        let contents = match self.read_locked() {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!("Failed to read period store {:?}: {}", self.path, e);
                self.set_aside_corrupt();
                return Ok(Vec::new());
            }
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Vec<Period>>(&contents) {
            Ok(periods) => {
                tracing::debug!("Loaded {} periods from {:?}", periods.len(), self.path);
                Ok(periods)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse period store {:?}: {}. Starting empty.",
                    self.path,
                    e
                );
                self.set_aside_corrupt();
                Ok(Vec::new())
            }
        }
    }

    /// Atomically replace the stored sequence
    ///
    /// Writes to a temp file in the same directory, syncs it, then renames
    /// it over the original.
    fn save_all(&mut self, periods: &[Period]) -> Result<()> {
        let parent = self.parent_dir();
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, periods)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} periods to {:?}", periods.len(), self.path);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("Removed period store {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Block until the sidecar lock file is exclusively ours
    fn lock(&self) -> Result<StoreLock> {
        std::fs::create_dir_all(self.parent_dir())?;

        let lock_path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)?;
        file.lock_exclusive()?;

        tracing::debug!("Acquired store lock {:?}", lock_path);
        Ok(StoreLock { file: Some(file) })
    }
}

/// In-memory store, for tests and embedding
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    periods: Vec<Period>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_periods(periods: Vec<Period>) -> Self {
        Self { periods, saves: 0 }
    }

    /// Number of successful `save_all` calls
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl PeriodStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<Period>> {
        Ok(self.periods.clone())
    }

    fn save_all(&mut self, periods: &[Period]) -> Result<()> {
        self.periods = periods.to_vec();
        self.saves += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.periods.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample_periods() -> Vec<Period> {
        vec![
            Period::new(date("2025-01-01"), Some(date("2025-01-05"))),
            Period::ongoing(date("2025-01-31")),
        ]
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(temp_dir.path().join("periods.json"));

        let periods = sample_periods();
        store.save_all(&periods).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded, periods);
    }

    #[test]
    fn test_load_nonexistent_returns_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("nonexistent.json"));

        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("a").join("b").join("periods.json");
        let mut store = JsonFileStore::new(&path);

        store.save_all(&sample_periods()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_corrupted_store_returns_empty_and_keeps_copy() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("periods.json");
        std::fs::write(&path, "[{ invalid json").unwrap();

        let store = JsonFileStore::new(&path);
        let loaded = store.load_all().unwrap();

        assert!(loaded.is_empty());
        let backup = store.corrupt_copy_path();
        assert!(backup.ends_with("periods.json.corrupt"));
        assert_eq!(std::fs::read_to_string(backup).unwrap(), "[{ invalid json");
    }

    #[test]
    fn test_empty_file_loads_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("periods.json");
        std::fs::write(&path, "").unwrap();

        assert!(JsonFileStore::new(&path).load_all().unwrap().is_empty());
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(temp_dir.path().join("periods.json"));

        store.save_all(&sample_periods()).unwrap();
        store.save_all(&[]).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "periods.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only periods.json, found extras: {:?}",
            extras
        );
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_clear_removes_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("periods.json");
        let mut store = JsonFileStore::new(&path);

        store.save_all(&sample_periods()).unwrap();
        store.clear().unwrap();
        assert!(!path.exists());

        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_file_format_is_array_of_records() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("periods.json");
        let mut store = JsonFileStore::new(&path);
        store.save_all(&sample_periods()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let records = raw.as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["start_date"], "2025-01-01");
        assert_eq!(records[0]["end_date"], "2025-01-05");
        assert!(records[1]["end_date"].is_null());
    }

    #[test]
    fn test_lock_excludes_other_writers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("periods.json"));

        let guard = store.lock().unwrap();
        let lock_path = store.lock_path();
        assert!(lock_path.ends_with("periods.json.lock"));

        // A second open file description contends for the same lock
        let other = File::open(&lock_path).unwrap();
        assert!(other.try_lock_exclusive().is_err());

        drop(guard);
        assert!(other.try_lock_exclusive().is_ok());
        other.unlock().unwrap();
    }

    #[test]
    fn test_lock_creates_data_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("new").join("periods.json"));

        let _guard = store.lock().unwrap();
        assert!(store.lock_path().exists());
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        store.save_all(&sample_periods()).unwrap();
        assert_eq!(store.load_all().unwrap().len(), 2);
        assert_eq!(store.save_count(), 1);

        store.clear().unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }
}
