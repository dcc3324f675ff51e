//! Local key-value store used by the relay: the selected provider/backend and a
//! most-recent-first scan history capped at [`HISTORY_LIMIT`] entries.
//!
//! Entries are not deduplicated by URL; rescanning a page adds another entry.

use crate::analysis::ScanResult;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::warn;

pub const HISTORY_LIMIT: usize = 100;
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";
pub const DEFAULT_STORE_FILE: &str = "umbrella-store.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RelayConfig {
    pub provider: String,
    pub backend_url: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoreFile {
    config: RelayConfig,
    scan_history: Vec<ScanResult>,
}

/// JSON-file store. Every mutation re-reads the file, so separate handles on one path
/// see each other's writes, but updates are not locked: two processes mutating at the
/// same moment race, and the last write wins.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$UMBRELLA_STORE`, else `umbrella-store.json` in the working directory.
    pub fn default_path() -> PathBuf {
        std::env::var_os("UMBRELLA_STORE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Missing or unreadable stores read as empty; the next write replaces them.
    fn read(&self) -> StoreFile {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return StoreFile::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed reading local store");
                return StoreFile::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "local store is corrupt; ignoring it");
            StoreFile::default()
        })
    }

    fn write(&self, file: &StoreFile) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;

        let body = serde_json::to_vec_pretty(file).context("serialize local store")?;
        let mut tf = tempfile::NamedTempFile::new_in(dir).context("create temp file")?;
        tf.write_all(&body).context("write temp")?;
        tf.flush().context("flush temp")?;
        tf.persist(&self.path)
            .map_err(|e| anyhow::anyhow!(e))
            .with_context(|| format!("persist {}", self.path.display()))?;
        Ok(())
    }

    pub fn config(&self) -> RelayConfig {
        self.read().config
    }

    pub fn save_config(&self, config: RelayConfig) -> Result<()> {
        let mut file = self.read();
        file.config = config;
        self.write(&file)
    }

    pub fn history(&self) -> Vec<ScanResult> {
        self.read().scan_history
    }

    /// Prepend `scan`, dropping the oldest entries beyond [`HISTORY_LIMIT`].
    pub fn record(&self, scan: ScanResult) -> Result<()> {
        let mut file = self.read();
        file.scan_history.insert(0, scan);
        file.scan_history.truncate(HISTORY_LIMIT);
        self.write(&file)
    }

    pub fn clear_history(&self) -> Result<()> {
        let mut file = self.read();
        file.scan_history.clear();
        self.write(&file)
    }
}
