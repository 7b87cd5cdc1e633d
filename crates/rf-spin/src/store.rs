//! Progress persistence
//!
//! The spin machine reads the stored progress once at startup and writes it
//! back after every balance change. Where it lives is up to the store.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{EngineResult, SpinError};

/// Persisted player progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    pub balance: u64,
    pub reward_claimed: bool,
}

/// Persistence collaborator
pub trait BalanceStore: Send {
    /// Stored progress, `None` when nothing was saved yet
    fn load(&mut self) -> EngineResult<Option<Progress>>;

    /// Write progress through
    fn save(&mut self, progress: &Progress) -> EngineResult<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// MEMORY STORE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
struct MemoryInner {
    progress: Option<Progress>,
    saves: usize,
    fail_writes: bool,
}

/// In-memory store
///
/// Clones share the same slot, so a handle kept outside the machine sees
/// every write.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that already holds `progress`
    pub fn with_progress(progress: Progress) -> Self {
        let store = Self::default();
        store.inner.lock().progress = Some(progress);
        store
    }

    /// Store holding only a balance
    pub fn with_balance(balance: u64) -> Self {
        Self::with_progress(Progress {
            balance,
            reward_claimed: false,
        })
    }

    /// Last saved progress
    pub fn snapshot(&self) -> Option<Progress> {
        self.inner.lock().progress
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.inner.lock().saves
    }

    /// Make subsequent saves fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }
}

impl BalanceStore for MemoryStore {
    fn load(&mut self) -> EngineResult<Option<Progress>> {
        Ok(self.inner.lock().progress)
    }

    fn save(&mut self, progress: &Progress) -> EngineResult<()> {
        let mut inner = self.inner.lock();
        if inner.fail_writes {
            return Err(SpinError::Io(std::io::Error::other("memory store is read-only")));
        }
        inner.progress = Some(*progress);
        inner.saves += 1;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// JSON FILE STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// On-disk save file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveFile {
    #[serde(flatten)]
    pub progress: Progress,
    pub saved_at: DateTime<Utc>,
}

/// JSON save file store
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Store at the standard location
    pub fn at_default_path() -> Self {
        Self::new(Self::default_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full save file, `None` if it does not exist
    pub fn read_file(&self) -> EngineResult<Option<SaveFile>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get default save file path
    pub fn default_path() -> PathBuf {
        let base = if cfg!(target_os = "macos") {
            dirs::home_dir()
                .map(|h| h.join("Library/Application Support/Candy Spin"))
                .unwrap_or_else(|| PathBuf::from("."))
        } else if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .map(|d| d.join("Candy Spin"))
                .unwrap_or_else(|| PathBuf::from("."))
        } else {
            dirs::data_local_dir()
                .map(|d| d.join("candy-spin"))
                .unwrap_or_else(|| PathBuf::from("."))
        };
        base.join("candy_spin.json")
    }
}

impl BalanceStore for JsonFileStore {
    fn load(&mut self) -> EngineResult<Option<Progress>> {
        Ok(self.read_file()?.map(|file| file.progress))
    }

    fn save(&mut self, progress: &Progress) -> EngineResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = SaveFile {
            progress: *progress,
            saved_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_shares_slot() {
        let store = MemoryStore::new();
        let mut handle = store.clone();

        assert_eq!(handle.load().unwrap(), None);
        handle
            .save(&Progress {
                balance: 80,
                reward_claimed: false,
            })
            .unwrap();

        assert_eq!(store.snapshot().unwrap().balance, 80);
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_memory_store_failing_writes() {
        let mut store = MemoryStore::with_balance(10);
        store.set_fail_writes(true);
        assert!(store.save(&Progress::default()).is_err());
        assert_eq!(store.snapshot().unwrap().balance, 10);
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_json_store_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("none.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_json_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("saves").join("candy.json");
        let mut store = JsonFileStore::new(&path);

        let progress = Progress {
            balance: 1540,
            reward_claimed: true,
        };
        store.save(&progress).unwrap();

        let mut reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.load().unwrap(), Some(progress));
        assert!(reopened.read_file().unwrap().is_some());
    }

    #[test]
    fn test_json_store_flat_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("candy.json");
        fs::write(
            &path,
            r#"{"balance": 300, "saved_at": "2026-01-02T03:04:05Z"}"#,
        )
        .unwrap();

        let mut store = JsonFileStore::new(&path);
        let progress = store.load().unwrap().unwrap();
        assert_eq!(progress.balance, 300);
        assert!(!progress.reward_claimed);
    }

    #[test]
    fn test_json_store_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("candy.json");
        fs::write(&path, "not json").unwrap();

        let mut store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(SpinError::Serialization(_))));
    }

    #[test]
    fn test_default_path_file_name() {
        assert!(JsonFileStore::default_path().ends_with("candy_spin.json"));
    }
}
