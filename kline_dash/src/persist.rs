// kline_dash/src/persist.rs

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use crate::store::DatasetStore;

pub const SNAPSHOT_FILE: &str = "chart_data.json";
pub const DATA_DIR_ENV: &str = "KLINE_DASH_DATA_DIR";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "kline_dash")
}

fn dir_override() -> Option<PathBuf> {
    std::env::var(DATA_DIR_ENV)
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
}

/// Where the snapshot lives. `KLINE_DASH_DATA_DIR` wins, then the platform
/// data dir, then `./data`.
pub fn data_dir() -> PathBuf {
    dir_override()
        .or_else(|| project_dirs().map(|dirs| dirs.data_dir().to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("data"))
}

pub fn config_dir() -> PathBuf {
    dir_override()
        .or_else(|| project_dirs().map(|dirs| dirs.config_dir().to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("data"))
}

pub fn snapshot_path() -> PathBuf {
    data_dir().join(SNAPSHOT_FILE)
}

/// How appends reach disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PersistMode {
    /// Rewrite the whole snapshot after every bar.
    EveryAppend,
    /// Mark dirty on append; write once `debounce_ms` has passed since the
    /// first unsaved append.
    Debounced { debounce_ms: u64 },
}

impl Default for PersistMode {
    fn default() -> Self {
        PersistMode::EveryAppend
    }
}

/// The single persisted slot holding the full dataset.
#[derive(Debug)]
pub struct SnapshotCache {
    path: PathBuf,
    mode: PersistMode,
    dirty_since: Option<Instant>,
}

impl SnapshotCache {
    pub fn new(path: impl Into<PathBuf>, mode: PersistMode) -> Self {
        Self {
            path: path.into(),
            mode,
            dirty_since: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> PersistMode {
        self.mode
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty_since.is_some()
    }

    /// Last persisted store, or `None` when the slot is empty or unreadable.
    /// A snapshot that fails to parse is moved aside and otherwise ignored.
    pub fn load(&self) -> Option<DatasetStore> {
        if !self.path.exists() {
            tracing::debug!(path = ?self.path, "no snapshot yet");
            return None;
        }
        let store = read_json_or_archive::<DatasetStore>(&self.path)?;
        tracing::info!(
            path = ?self.path,
            series = store.series_count(),
            bars = store.bar_count(),
            "snapshot loaded"
        );
        Some(store)
    }

    /// Overwrite the slot with a full snapshot of `store`.
    pub fn save(&self, store: &DatasetStore) -> Result<()> {
        let parent = self.path.parent().context("snapshot path has no parent")?;
        fs::create_dir_all(parent).with_context(|| format!("create data dir {:?}", parent))?;

        let json = serde_json::to_vec(store).context("serialize snapshot")?;
        atomic_write(&self.path, &json)?;
        Ok(())
    }

    /// Called after every append. Returns whether the snapshot was written.
    /// A failed write leaves the cache dirty so a later flush retries it.
    pub fn record_append(&mut self, store: &DatasetStore, now: Instant) -> Result<bool> {
        self.dirty_since.get_or_insert(now);
        match self.mode {
            PersistMode::EveryAppend => {
                self.save(store)?;
                self.dirty_since = None;
                Ok(true)
            }
            PersistMode::Debounced { .. } => Ok(false),
        }
    }

    /// Write pending changes once the debounce window has elapsed.
    pub fn flush_if_due(&mut self, store: &DatasetStore, now: Instant) -> Result<bool> {
        let (Some(since), PersistMode::Debounced { debounce_ms }) = (self.dirty_since, self.mode)
        else {
            return Ok(false);
        };
        if now.saturating_duration_since(since) < Duration::from_millis(debounce_ms) {
            return Ok(false);
        }
        self.flush(store)
    }

    /// Write pending changes now, regardless of mode.
    pub fn flush(&mut self, store: &DatasetStore) -> Result<bool> {
        if self.dirty_since.is_none() {
            return Ok(false);
        }
        self.save(store)?;
        self.dirty_since = None;
        Ok(true)
    }
}

/// Read and parse a JSON file. Unreadable files are left in place; files that
/// read but don't parse are archived.
pub(crate) fn read_json_or_archive<T: for<'de> Deserialize<'de>>(path: &Path) -> Option<T> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(path = ?path, "read failed, leaving file in place: {err}");
            return None;
        }
    };
    match serde_json::from_slice::<T>(&bytes).context("parse json") {
        Ok(value) => Some(value),
        Err(err) => {
            archive_corrupt(path, &err);
            None
        }
    }
}

pub(crate) fn archive_corrupt(path: &Path, err: &anyhow::Error) {
    if !path.exists() {
        return;
    }
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let archived = path.with_extension(format!("corrupt.{ts}.json"));
    let _ = fs::rename(path, &archived);
    tracing::warn!(path = ?path, archived = ?archived, "unreadable file archived: {err:#}");
}

pub(crate) fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().context("no parent dir for path")?;
    let tmp = dir.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    {
        let mut f = fs::File::create(&tmp).with_context(|| format!("create tmp {:?}", tmp))?;
        f.write_all(bytes).with_context(|| "write tmp")?;
        let _ = f.sync_all();
    }

    fs::rename(&tmp, path).with_context(|| format!("rename {:?} -> {:?}", tmp, path))?;
    Ok(())
}
