//! Snapshot persistence for the in-memory event store.
//!
//! A snapshot is a JSON document tagged with [`EventSnapshot::VERSION`].
//! Files from another layout are refused on load, so a store never resumes
//! from sync progress it cannot interpret. Writes go to a sibling temp file
//! that is renamed over the target once flushed.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::types::EventSnapshot;

/// Default path for the snapshot file
pub const DEFAULT_SNAPSHOT_PATH: &str = "./ccip-event-snapshot.json";

/// Environment variable name for snapshot path configuration
pub const SNAPSHOT_PATH_ENV_VAR: &str = "CCIP_EVENT_SNAPSHOT_PATH";

#[derive(Debug)]
pub enum SnapshotError {
    Io { path: PathBuf, reason: String },
    Parse { path: PathBuf, reason: String },
    /// The file was written with a different snapshot layout. `found` is
    /// `None` for files that predate versioning.
    UnsupportedVersion { found: Option<u32>, expected: u32 },
    Serialize { reason: String },
}

impl core::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SnapshotError::Io { path, reason } => {
                write!(f, "Snapshot I/O failed on '{}': {}", path.display(), reason)
            }
            SnapshotError::Parse { path, reason } => {
                write!(f, "Invalid snapshot '{}': {}", path.display(), reason)
            }
            SnapshotError::UnsupportedVersion { found: Some(v), expected } => {
                write!(f, "Snapshot version {} is not supported (expected {})", v, expected)
            }
            SnapshotError::UnsupportedVersion { found: None, expected } => {
                write!(f, "Snapshot has no version (expected {})", expected)
            }
            SnapshotError::Serialize { reason } => {
                write!(f, "Failed to serialize snapshot: {}", reason)
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    pub snapshot_path: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            snapshot_path: DEFAULT_SNAPSHOT_PATH.to_string(),
        }
    }
}

impl SnapshotConfig {
    pub fn new(snapshot_path: String) -> Self {
        Self { snapshot_path }
    }

    /// Reads the path from the environment, falling back to the default
    pub fn from_env() -> Self {
        let snapshot_path = std::env::var(SNAPSHOT_PATH_ENV_VAR)
            .unwrap_or_else(|_| DEFAULT_SNAPSHOT_PATH.to_string());
        Self { snapshot_path }
    }
}

/// Only the version tag, read before committing to the full layout.
#[derive(Deserialize)]
struct SnapshotHeader {
    version: Option<u32>,
}

/// Loads and saves [`EventSnapshot`]s.
#[derive(Debug)]
pub struct SnapshotManager {
    path: PathBuf,
}

impl SnapshotManager {
    pub fn new(config: SnapshotConfig) -> Self {
        Self {
            path: PathBuf::from(config.snapshot_path),
        }
    }

    pub fn from_env() -> Self {
        Self::new(SnapshotConfig::from_env())
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.path
    }

    /// Loads the snapshot. A missing file yields an empty snapshot. A file
    /// that is unreadable, malformed or from another layout version is an
    /// error.
    pub fn load(&self) -> Result<EventSnapshot, SnapshotError> {
        if !self.path.exists() {
            return Ok(EventSnapshot::new());
        }
        let contents = fs::read_to_string(&self.path).map_err(|e| self.io_error(&self.path, e))?;
        self.decode(&contents)
    }

    fn decode(&self, contents: &str) -> Result<EventSnapshot, SnapshotError> {
        let parse_error = |e: serde_json::Error| SnapshotError::Parse {
            path: self.path.clone(),
            reason: e.to_string(),
        };

        let header: SnapshotHeader = serde_json::from_str(contents).map_err(parse_error)?;
        if header.version != Some(EventSnapshot::VERSION) {
            return Err(SnapshotError::UnsupportedVersion {
                found: header.version,
                expected: EventSnapshot::VERSION,
            });
        }
        serde_json::from_str(contents).map_err(parse_error)
    }

    /// Writes `snapshot` atomically, stamping the current layout version.
    pub fn save(&self, snapshot: &EventSnapshot) -> Result<(), SnapshotError> {
        if snapshot.version != EventSnapshot::VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: Some(snapshot.version),
                expected: EventSnapshot::VERSION,
            });
        }
        let json = serde_json::to_vec(snapshot).map_err(|e| SnapshotError::Serialize {
            reason: e.to_string(),
        })?;
        self.write_atomic(&json)?;

        tracing::debug!(
            path = %self.path.display(),
            logs = snapshot.log_count(),
            filters = snapshot.filters.len(),
            "Saved event snapshot"
        );
        Ok(())
    }

    fn write_atomic(&self, bytes: &[u8]) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(parent, e))?;
            }
        }

        let temp_path = self.temp_path();
        let mut file = fs::File::create(&temp_path).map_err(|e| self.io_error(&temp_path, e))?;
        file.write_all(bytes).map_err(|e| self.io_error(&temp_path, e))?;
        file.sync_all().map_err(|e| self.io_error(&temp_path, e))?;
        fs::rename(&temp_path, &self.path).map_err(|e| self.io_error(&self.path, e))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn io_error(&self, path: &Path, e: std::io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    }

    /// Loads the snapshot, starting from an empty store on any error.
    pub fn load_or_default(&self) -> EventSnapshot {
        match self.load() {
            Ok(snapshot) => snapshot,
            Err(e @ SnapshotError::UnsupportedVersion { .. }) => {
                tracing::info!(path = %self.path.display(), error = %e, "Discarding event snapshot, resyncing");
                EventSnapshot::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable event snapshot");
                EventSnapshot::new()
            }
        }
    }
}
