//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or an explicit path), then applies `MEMBER_LEDGER_WORK_DIR` and
//! `MEMBER_LEDGER_LOG_LEVEL` env overrides.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Which world-state backend the runner opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateBackend {
    /// Process-local map, discarded on exit.
    Memory,
    /// JSON document on disk.
    File,
}

/// World-state configuration.
#[derive(Debug, Clone)]
pub struct StateConfig {
    pub backend: StateBackend,
    /// Location of the state file (already resolved against `work_dir`).
    /// Ignored by the memory backend.
    pub path: PathBuf,
}

/// Fully-resolved runner configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub name: String,
    /// Working directory for persistent data (already expanded, no `~`).
    pub work_dir: PathBuf,
    pub log_level: String,
    /// Append logs here instead of stderr.
    pub log_file: Option<PathBuf>,
    pub state: StateConfig,
}

/// Raw TOML shape: `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    ledger: RawLedger,
    #[serde(default)]
    state: RawState,
}

#[derive(Deserialize)]
struct RawLedger {
    #[serde(default = "default_name")]
    name: String,
    work_dir: String,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    log_file: Option<String>,
}

#[derive(Deserialize)]
struct RawState {
    #[serde(default = "default_backend")]
    backend: StateBackend,
    #[serde(default = "default_state_path")]
    path: String,
}

impl Default for RawState {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_state_path(),
        }
    }
}

fn default_name() -> String { "member-ledger".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_backend() -> StateBackend { StateBackend::File }
fn default_state_path() -> String { "world_state.json".to_string() }

/// Load config from `path`, then apply env-var overrides.
pub fn load(path: &Path) -> Result<Config, AppError> {
    let work_dir_override = env::var("MEMBER_LEDGER_WORK_DIR").ok();
    let log_level_override = env::var("MEMBER_LEDGER_LOG_LEVEL").ok();
    load_from(
        path,
        work_dir_override.as_deref(),
        log_level_override.as_deref(),
    )
}

/// Internal loader: accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    work_dir_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let l = parsed.ledger;

    let work_dir = expand_home(work_dir_override.unwrap_or(&l.work_dir));
    let log_level = log_level_override.unwrap_or(&l.log_level).to_string();
    let log_file = l.log_file.map(|p| resolve_in(&work_dir, &p));
    let state_path = resolve_in(&work_dir, &parsed.state.path);

    Ok(Config {
        name: l.name,
        work_dir,
        log_level,
        log_file,
        state: StateConfig {
            backend: parsed.state.backend,
            path: state_path,
        },
    })
}

/// Absolute paths (after `~` expansion) are kept; relative ones hang off `work_dir`.
fn resolve_in(work_dir: &Path, path: &str) -> PathBuf {
    let p = expand_home(path);
    if p.is_absolute() { p } else { work_dir.join(p) }
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

/// In-memory `Config` for unit tests: no files touched.
#[cfg(test)]
impl Config {
    pub fn test_default(work_dir: &Path) -> Self {
        Self {
            name: "test".into(),
            work_dir: work_dir.to_path_buf(),
            log_level: "info".into(),
            log_file: None,
            state: StateConfig {
                backend: StateBackend::Memory,
                path: work_dir.join("world_state.json"),
            },
        }
    }
}
