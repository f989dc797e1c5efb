//! `file` backend: world state persisted as a single JSON document.
//!
//! ```json
//! { "entries": { "<key>": { "value": "<base64>", "ts": "2024-01-01T00:00:00Z" } } }
//! ```
//!
//! Every mutation is a read-modify-write of the whole file. The new document
//! is written to a sibling `.tmp` file and renamed over the old one, so
//! readers only ever see a complete file. Keys are kept sorted so the file
//! diffs cleanly between runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{SecondsFormat, Utc};
use tracing::debug;

use crate::error::AppError;
use super::WorldState;

/// One stored value.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StateEntry {
    /// Raw value bytes, base64-encoded.
    value: String,
    /// RFC 3339 timestamp of the last write.
    ts: String,
}

/// On-disk shape of the state file.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct StateFile {
    #[serde(default)]
    entries: BTreeMap<String, StateEntry>,
}

pub struct FileWorldState {
    path: PathBuf,
    /// Serialises reads and read-modify-write cycles within this process.
    guard: Mutex<()>,
}

impl FileWorldState {
    /// Open the state file at `path`, creating it (and its parent
    /// directories) empty if it does not exist yet.
    pub fn open(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    AppError::State(format!("cannot create {}: {e}", parent.display()))
                })?;
            }
            Self::write_file(path, &StateFile::default())?;
            debug!(path = %path.display(), "created empty world state file");
        }
        Ok(Self {
            path: path.to_path_buf(),
            guard: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(path: &Path) -> Result<StateFile, AppError> {
        let data = fs::read_to_string(path)
            .map_err(|e| AppError::State(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&data)
            .map_err(|e| AppError::State(format!("malformed {}: {e}", path.display())))
    }

    fn write_file(path: &Path, file: &StateFile) -> Result<(), AppError> {
        let data = serde_json::to_string_pretty(file)
            .map_err(|e| AppError::State(format!("serialise state: {e}")))?;
        let tmp = Self::tmp_path(path);
        fs::write(&tmp, data)
            .map_err(|e| AppError::State(format!("cannot write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, path).map_err(|e| {
            AppError::State(format!("cannot replace {}: {e}", path.display()))
        })
    }

    /// `state.json` -> `state.json.tmp`, in the same directory so the rename
    /// stays on one filesystem.
    fn tmp_path(path: &Path) -> PathBuf {
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        path.with_file_name(name)
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, AppError> {
        self.guard
            .lock()
            .map_err(|_| AppError::State("file world state lock poisoned".into()))
    }

    /// Run `f` against the decoded file and write the result back.
    fn modify<F>(&self, f: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut StateFile),
    {
        let _held = self.lock()?;
        let mut file = Self::read_file(&self.path)?;
        f(&mut file);
        Self::write_file(&self.path, &file)
    }
}

impl WorldState for FileWorldState {
    fn backend(&self) -> &str {
        "file"
    }

    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        let file = {
            let _held = self.lock()?;
            Self::read_file(&self.path)?
        };
        file.entries
            .get(key)
            .map(|entry| {
                BASE64.decode(&entry.value).map_err(|e| {
                    AppError::State(format!("corrupt value for key '{key}': {e}"))
                })
            })
            .transpose()
    }

    fn put_state(&self, key: &str, value: &[u8]) -> Result<(), AppError> {
        let entry = StateEntry {
            value: BASE64.encode(value),
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        self.modify(|file| {
            file.entries.insert(key.to_string(), entry);
        })
    }

    fn del_state(&self, key: &str) -> Result<(), AppError> {
        self.modify(|file| {
            file.entries.remove(key);
        })
    }
}
