//! Configuration file support.
//!
//! Two locations are read:
//! - Global: `~/.depconf/config.toml` - user-wide defaults
//! - Project: `.depconf/config.toml` - overrides for the current directory
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::artifact::Linkage;
use crate::sources::probe::ProbeOptions;

/// depconf configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where to look inside installation roots
    pub probe: ProbeConfig,

    /// Defaults for generated documents
    pub generate: GenerateConfig,
}

/// Probe settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    /// Include sub-directories (default: `include`)
    pub include_dirs: Option<Vec<String>>,

    /// Library sub-directories (default: `lib`, `lib64`, `bin`)
    pub lib_dirs: Option<Vec<String>>,

    /// Header file extensions without the dot
    pub header_extensions: Option<Vec<String>>,
}

/// Generation settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateConfig {
    /// Preferred variant when both exist (`shared` or `static`)
    pub linkage: Option<String>,

    /// Write paths relative to the config file when possible
    pub relocatable: Option<bool>,

    /// Version used when nothing declares one
    pub default_version: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load a file if it exists. A file that exists but does not parse is
    /// an error, not a silent default.
    pub fn load_if_exists(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.probe.include_dirs.is_some() {
            self.probe.include_dirs = other.probe.include_dirs;
        }
        if other.probe.lib_dirs.is_some() {
            self.probe.lib_dirs = other.probe.lib_dirs;
        }
        if other.probe.header_extensions.is_some() {
            self.probe.header_extensions = other.probe.header_extensions;
        }

        if other.generate.linkage.is_some() {
            self.generate.linkage = other.generate.linkage;
        }
        if other.generate.relocatable.is_some() {
            self.generate.relocatable = other.generate.relocatable;
        }
        if other.generate.default_version.is_some() {
            self.generate.default_version = other.generate.default_version;
        }
    }

    /// Parse the configured linkage preference.
    pub fn linkage(&self) -> Result<Linkage> {
        match &self.generate.linkage {
            Some(s) => s.parse().map_err(anyhow::Error::msg),
            None => Ok(Linkage::default()),
        }
    }

    pub fn relocatable(&self) -> bool {
        self.generate.relocatable.unwrap_or(true)
    }

    /// Probe options with configured directories applied over the defaults.
    pub fn probe_options(&self) -> ProbeOptions {
        let mut options = ProbeOptions::default();
        if let Some(dirs) = &self.probe.include_dirs {
            options.include_dirs = dirs.clone();
        }
        if let Some(dirs) = &self.probe.lib_dirs {
            options.lib_dirs = dirs.clone();
        }
        if let Some(exts) = &self.probe.header_extensions {
            options.header_extensions = exts
                .iter()
                .map(|e| e.trim_start_matches('.').to_string())
                .collect();
        }
        options
    }
}

/// Get the global depconf config directory (~/.depconf).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".depconf"))
}

/// Get the global config path (~/.depconf/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.depconf/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".depconf").join("config.toml")
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.depconf/config.toml)
/// 2. Global config (~/.depconf/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_if_exists(global_path)?);
    }
    config.merge(Config::load_if_exists(project_path)?);

    Ok(config)
}
