use crate::selection::{ViewSelection, ViewTags};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.yml";
pub const DATA_DIR_ENV: &str = "TIMEBLOCK_DATA_DIR";

/// User configuration loaded from `config.yml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the task and project blobs.
    pub data_dir: Option<PathBuf>,
    /// Where `export` writes when no `--out` is given.
    pub export_dir: Option<PathBuf>,
    /// View used when a command gets no view flags.
    pub default_view: ViewTags,
    /// `tracing` filter directive, overridden by `RUST_LOG`.
    pub log_filter: Option<String>,
}

pub fn config_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "timeblock").context("locating config directory")?;
    Ok(dirs.config_dir().join(CONFIG_FILE))
}

impl Config {
    /// Loads `path`, or the per-user config file when `path` is `None`.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path()?,
        };
        if !path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&path).with_context(|| format!("reading {:?}", path))?;
        Self::from_yaml(&data).with_context(|| format!("parsing {:?}", path))
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        if data.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml::from_str(data)?;
        config.default_view()?;
        Ok(config)
    }

    pub fn default_view(&self) -> Result<ViewSelection> {
        ViewSelection::from_view_tags(&self.default_view).context("invalid default_view")
    }

    /// Explicit data directory: `TIMEBLOCK_DATA_DIR` wins over the config file.
    pub fn data_dir_override(&self) -> Option<PathBuf> {
        std::env::var_os(DATA_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| self.data_dir.clone())
    }
}
