//! Configuration Vault – reads/writes `~/.candytron/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Persisted user configuration stored in `~/.candytron/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Grid rows, numbered bottom to top.
    #[serde(default = "default_grid_rows")]
    pub grid_rows: u32,

    /// Grid columns, lettered left to right.
    #[serde(default = "default_grid_cols")]
    pub grid_cols: u32,

    /// How often the startup sequence retries calibration before giving up.
    #[serde(default = "default_calibration_attempts")]
    pub calibration_attempts: u32,

    /// Read-only poses shipped with the system.
    #[serde(default = "default_base_pose_file")]
    pub base_pose_file: PathBuf,

    /// Operator-saved poses; the only durable mutable state.
    #[serde(default = "default_local_pose_file")]
    pub local_pose_file: PathBuf,

    /// Use the simulated detector and arm instead of physical hardware.
    #[serde(default = "default_offline")]
    pub offline: bool,
}

fn default_grid_rows() -> u32 {
    3
}
fn default_grid_cols() -> u32 {
    4
}
fn default_calibration_attempts() -> u32 {
    10
}
fn default_base_pose_file() -> PathBuf {
    PathBuf::from("base-saved-poses.toml")
}
fn default_local_pose_file() -> PathBuf {
    PathBuf::from("local-saved-poses.toml")
}
fn default_offline() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid_rows: default_grid_rows(),
            grid_cols: default_grid_cols(),
            calibration_attempts: default_calibration_attempts(),
            base_pose_file: default_base_pose_file(),
            local_pose_file: default_local_pose_file(),
            offline: default_offline(),
        }
    }
}

/// Return the path to `~/.candytron/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
/// Extracted for testability without mutating environment variables.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".candytron").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `CANDYTRON_*` environment variable overrides to `cfg`.
///
/// Supported variables:
///
/// | Variable | Config field |
/// |---|---|
/// | `CANDYTRON_GRID_ROWS` | `grid_rows` |
/// | `CANDYTRON_GRID_COLS` | `grid_cols` |
/// | `CANDYTRON_BASE_POSES` | `base_pose_file` |
/// | `CANDYTRON_LOCAL_POSES` | `local_pose_file` |
/// | `CANDYTRON_OFFLINE` | `offline` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("CANDYTRON_GRID_ROWS")
        && let Ok(rows) = v.parse::<u32>()
    {
        cfg.grid_rows = rows;
    }
    if let Ok(v) = std::env::var("CANDYTRON_GRID_COLS")
        && let Ok(cols) = v.parse::<u32>()
    {
        cfg.grid_cols = cols;
    }
    if let Ok(v) = std::env::var("CANDYTRON_BASE_POSES") {
        cfg.base_pose_file = PathBuf::from(v);
    }
    if let Ok(v) = std::env::var("CANDYTRON_LOCAL_POSES") {
        cfg.local_pose_file = PathBuf::from(v);
    }
    if let Ok(v) = std::env::var("CANDYTRON_OFFLINE")
        && let Ok(offline) = v.parse::<bool>()
    {
        cfg.offline = offline;
    }
}

/// Save the config to disk, creating `~/.candytron/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))
}
