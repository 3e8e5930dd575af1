//! Persistent settings for the tool host.
//!
//! Settings are read from `config.json` in the platform config directory, then
//! overridden by `EXPLORER_*` environment variables. A missing or unreadable
//! file silently falls back to defaults.

use crate::error::{ExplorerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Files at or above this size are loaded with the chunked strategy.
pub const DEFAULT_CHUNK_THRESHOLD_BYTES: u64 = 100 * 1024 * 1024;
pub const DEFAULT_CHUNK_ROWS: usize = 100_000;
pub const DEFAULT_SAMPLE_ROWS: usize = 10_000;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Size policy for strategy selection. Fixed, not derived from available memory.
    pub chunk_threshold_bytes: u64,
    /// Rows per segment when streaming a large file
    pub chunk_rows: usize,
    /// Rows read for schema discovery before a chunked parse
    pub sample_rows: usize,
    /// Interpreter used by `run-script`
    pub python_executable: String,
    /// Optional deadline for a script run. `None` lets scripts run to completion.
    pub script_timeout_secs: Option<u64>,
    /// Overrides the platform log directory
    pub log_dir: Option<PathBuf>,
    pub file_logging: bool,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            chunk_threshold_bytes: DEFAULT_CHUNK_THRESHOLD_BYTES,
            chunk_rows: DEFAULT_CHUNK_ROWS,
            sample_rows: DEFAULT_SAMPLE_ROWS,
            python_executable: default_python().to_owned(),
            script_timeout_secs: None,
            log_dir: None,
            file_logging: true,
        }
    }
}

fn default_python() -> &'static str {
    if cfg!(target_os = "windows") {
        "python"
    } else {
        "python3"
    }
}

impl ExplorerConfig {
    pub fn script_timeout(&self) -> Option<Duration> {
        self.script_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// # Errors
    ///
    /// Returns [`ExplorerError::Config`] when a segment size is zero or the
    /// interpreter name is empty.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_rows == 0 {
            return Err(ExplorerError::Config("chunk_rows must be > 0".to_owned()));
        }
        if self.sample_rows == 0 {
            return Err(ExplorerError::Config("sample_rows must be > 0".to_owned()));
        }
        if self.python_executable.trim().is_empty() {
            return Err(ExplorerError::Config(
                "python_executable must not be empty".to_owned(),
            ));
        }
        Ok(())
    }

    /// Applies `EXPLORER_*` overrides. Unparseable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse::<u64>("EXPLORER_CHUNK_THRESHOLD_BYTES") {
            self.chunk_threshold_bytes = v;
        }
        if let Some(v) = env_parse::<usize>("EXPLORER_CHUNK_ROWS") {
            self.chunk_rows = v;
        }
        if let Some(v) = env_parse::<usize>("EXPLORER_SAMPLE_ROWS") {
            self.sample_rows = v;
        }
        if let Ok(exe) = std::env::var("EXPLORER_PYTHON")
            && !exe.trim().is_empty()
        {
            self.python_executable = exe;
        }
        if let Some(secs) = env_parse::<u64>("EXPLORER_SCRIPT_TIMEOUT_SECS") {
            self.script_timeout_secs = (secs > 0).then_some(secs);
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("data-explorer")
        .join("config.json")
}

pub fn load_config_from(path: &Path) -> ExplorerConfig {
    if path.exists()
        && let Ok(content) = std::fs::read_to_string(path)
        && let Ok(config) = serde_json::from_str::<ExplorerConfig>(&content)
    {
        return config;
    }
    tracing::debug!("No usable config at {}, using defaults", path.display());
    ExplorerConfig::default()
}

/// Loads the config file (if any) and applies environment overrides.
pub fn load_config() -> ExplorerConfig {
    let mut config = load_config_from(&config_path());
    config.apply_env_overrides();
    config
}

/// # Errors
///
/// Returns an error if the parent directory or the file cannot be written.
pub fn save_config_to(config: &ExplorerConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// # Errors
///
/// See [`save_config_to`].
pub fn save_config(config: &ExplorerConfig) -> Result<()> {
    save_config_to(config, &config_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_policy_constants() {
        let config = ExplorerConfig::default();
        assert_eq!(config.chunk_threshold_bytes, 104_857_600);
        assert_eq!(config.chunk_rows, 100_000);
        assert_eq!(config.sample_rows, 10_000);
        assert!(config.script_timeout().is_none(), "no deadline by default");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_chunk() {
        let config = ExplorerConfig {
            chunk_rows: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ExplorerError::Config(_))));
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let config = ExplorerConfig {
            script_timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(config.script_timeout().is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.json");
        let config = ExplorerConfig {
            chunk_rows: 42,
            script_timeout_secs: Some(30),
            ..Default::default()
        };
        save_config_to(&config, &path).expect("save");
        assert_eq!(load_config_from(&path), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"chunk_rows": 7}"#).expect("write");
        let config = load_config_from(&path);
        assert_eq!(config.chunk_rows, 7);
        assert_eq!(config.sample_rows, DEFAULT_SAMPLE_ROWS);
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").expect("write");
        assert_eq!(load_config_from(&path), ExplorerConfig::default());
    }
}
