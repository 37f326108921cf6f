use crate::errors::ConfigError;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const CONFIG_PATH_VAR: &str = "EQUIPMENT_REPORT_CONFIG";
pub const ENDPOINT_VAR: &str = "EQUIPMENT_REPORT_ENDPOINT";
pub const OUTPUT_DIR_VAR: &str = "EQUIPMENT_REPORT_OUTPUT_DIR";

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/api/upload/";

/// On-disk shape; every key is optional and falls back to the default.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct ConfigFile {
    pub endpoint: Option<String>,
    pub output_dir: Option<String>,
    pub timeout_secs: Option<u64>,
    pub repeat_table_header: Option<bool>,
    pub preview_rows: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub endpoint: String,
    pub output_dir: PathBuf,
    pub timeout: Duration,
    pub repeat_table_header: bool,
    pub preview_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            output_dir: PathBuf::from("."),
            timeout: Duration::from_secs(60),
            repeat_table_header: true,
            preview_rows: 5,
        }
    }
}

impl Config {
    fn apply_file(mut self, file: ConfigFile) -> Self {
        if let Some(endpoint) = file.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(dir) = file.output_dir {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(repeat) = file.repeat_table_header {
            self.repeat_table_header = repeat;
        }
        if let Some(rows) = file.preview_rows {
            self.preview_rows = rows;
        }
        self
    }

    fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(endpoint) = lookup(ENDPOINT_VAR).filter(|v| !v.trim().is_empty()) {
            self.endpoint = endpoint;
        }
        if let Some(dir) = lookup(OUTPUT_DIR_VAR).filter(|v| !v.trim().is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
        self
    }
}

pub fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Defaults, then the JSON file named by `EQUIPMENT_REPORT_CONFIG` (if set),
/// then individual environment overrides.
pub fn load() -> Result<Config, ConfigError> {
    load_with(|key| env::var(key).ok())
}

pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
    let mut config = Config::default();
    if let Some(path) = lookup(CONFIG_PATH_VAR).filter(|v| !v.trim().is_empty()) {
        let path = PathBuf::from(path);
        if path.exists() {
            config = config.apply_file(read_config_file(&path)?);
            debug!(path = %path.display(), "config file applied");
        } else {
            debug!(path = %path.display(), "config file not found, using defaults");
        }
    }
    Ok(config.apply_env(lookup))
}
