//! Command implementations.

use std::fmt;
use std::path::Path;

use anyhow::Result;

use depconf::ops::{GenerateRequest, GenerateSettings};
use depconf::util::config::{global_config_path, load_config, project_config_path};

use crate::cli::DependencyArgs;

pub mod batch;
pub mod completions;
pub mod generate;
pub mod probe;
pub mod verify;

/// Exit status 1 with every failure already printed.
#[derive(Debug)]
pub struct Failed;

impl fmt::Display for Failed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("one or more operations failed")
    }
}

impl std::error::Error for Failed {}

/// Settings from `~/.depconf/config.toml` and `.depconf/config.toml`.
pub fn load_settings() -> Result<GenerateSettings> {
    let cwd = std::env::current_dir()?;
    let global = global_config_path();
    let config = load_config(global.as_deref(), &project_config_path(&cwd))?;
    GenerateSettings::from_config(&config)
}

impl DependencyArgs {
    pub fn request(&self) -> GenerateRequest {
        let mut request = GenerateRequest::new(&self.name, self.roots.clone());
        request.hints = self.hints.clone();
        request
    }
}

/// Display a path relative to the working directory when shorter.
pub fn display_path(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(|p| p.display().to_string()))
        .unwrap_or_else(|| path.display().to_string())
}
