use std::{
    env, fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{Config, Error, Result};

/// File name looked up in each configuration directory.
const CONFIG_FILE: &str = "config.ron";

/// A configuration plus the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: Config,
    /// `None` when built-in defaults are in use.
    pub path: Option<PathBuf>,
}

impl LoadedConfig {
    /// Built-in defaults, not backed by a file.
    pub fn defaults() -> Self {
        Self {
            config: Config::default(),
            path: None,
        }
    }

    /// Human-readable description of where the config came from.
    pub fn source(&self) -> String {
        match &self.path {
            Some(p) => p.display().to_string(),
            None => "No config file found, using default config".to_string(),
        }
    }
}

/// Candidate locations, most preferred first.
pub fn config_search_paths() -> Vec<PathBuf> {
    let Some(home) = env::var_os("HOME").map(PathBuf::from) else {
        return Vec::new();
    };
    vec![
        home.join(".config").join("keynav").join(CONFIG_FILE),
        home.join("Library")
            .join("Application Support")
            .join("keynav")
            .join(CONFIG_FILE),
    ]
}

/// Resolve the effective config path.
///
/// Policy:
/// 1) Use `explicit` when provided, whether or not it exists.
/// 2) Else the first existing entry of [`config_search_paths`].
/// 3) Else `None`, meaning built-in defaults.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }
    config_search_paths().into_iter().find(|p| p.exists())
}

/// Parse and validate RON text.
pub fn from_ron_str(text: &str) -> Result<Config> {
    let cfg: Config = ron::from_str(text).map_err(|e| Error::Parse {
        path: None,
        message: e.to_string(),
    })?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load and validate the config at `path`.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let text = fs::read_to_string(path).map_err(|e| Error::Read {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })?;
    from_ron_str(&text).map_err(|e| e.with_path(path))
}

/// Load following [`resolve_config_path`]; defaults when no file is found.
pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
    match resolve_config_path(explicit) {
        Some(path) => {
            info!("loading config from {}", path.display());
            let config = load_from_path(&path)?;
            Ok(LoadedConfig {
                config,
                path: Some(path),
            })
        }
        None => {
            debug!("no config file found, using defaults");
            Ok(LoadedConfig::defaults())
        }
    }
}
