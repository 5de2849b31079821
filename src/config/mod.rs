use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::storage::{LayoutConfig, StorageSlot};

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub name: Option<String>,
    pub rpc: Option<String>,
    pub ws: Option<String>,
    pub ipc: Option<String>,
}

/// A named dynamic array on a known contract.
///
/// The declared slot and layout are explicit so a wrong storage assumption is
/// visible in config rather than buried in code.
#[derive(Debug, Clone, Deserialize)]
pub struct ArrayConfig {
    pub name: String,
    pub address: String,
    pub slot: StorageSlot,
    pub layout: String,
    pub stride: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,

    #[serde(default)]
    pub layouts: Vec<LayoutConfig>,

    #[serde(default)]
    pub arrays: Vec<ArrayConfig>,
}

impl Config {
    pub fn array(&self, name: &str) -> Option<&ArrayConfig> {
        self.arrays.iter().find(|a| a.name == name)
    }
}

/// Load config from `explicit`, or from the default location.
///
/// A missing file yields the default config; a malformed one is logged and
/// also yields the default.
pub fn load(explicit: Option<&Path>) -> Config {
    let Some(path) = explicit.map(Path::to_path_buf).or_else(config_path) else {
        return Config::default();
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) => {
            if explicit.is_some() {
                tracing::warn!(path = %path.display(), error = %err, "cannot read config");
            }
            return Config::default();
        }
    };
    match parse(&content) {
        Ok(config) => {
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring malformed config");
            Config::default()
        }
    }
}

pub fn parse(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(content)
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("SLOTSCOPE_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("slotscope").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("slotscope").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "slotscope", "slotscope")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Expand a leading `~/` against `$HOME`
pub fn expand_path(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(rest) = trimmed.strip_prefix("~/") {
        let home = std::env::var_os("HOME")?;
        return Some(PathBuf::from(home).join(rest));
    }
    Some(PathBuf::from(trimmed))
}
