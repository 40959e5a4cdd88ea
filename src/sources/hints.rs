//! Per-dependency hints file (`depconf.toml`).
//!
//! Looked up at `<root>/share/<name>/depconf.toml`, or passed explicitly.
//! Hints refine naming and component edges; they never choose the mode.
//!
//! ```toml
//! namespace = "FFmpeg"
//! version = "5.1.6"
//! exclude = ["postproc"]
//!
//! [[components]]
//! name = "avformat"
//! dependencies = ["avcodec", "avutil"]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File name of the hints file.
pub const HINTS_FILE: &str = "depconf.toml";

/// Declared dependencies of one component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentHint {
    pub name: String,
    pub dependencies: Vec<String>,
}

/// Parsed hints for one dependency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Hints {
    /// Target namespace (`FFmpeg` for `FFmpeg::avcodec`)
    pub namespace: Option<String>,

    pub version: Option<String>,

    pub components: Vec<ComponentHint>,

    /// Library names to leave out of the inventory
    pub exclude: Vec<String>,

    /// Where the hints were read from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Hints {
    /// Load hints from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read hints file: {}", path.display()))?;

        let mut hints: Hints = toml::from_str(&contents)
            .with_context(|| format!("failed to parse hints file: {}", path.display()))?;
        hints.source = Some(path.to_path_buf());
        Ok(hints)
    }

    /// Conventional location of the hints file below an installation root.
    pub fn default_path(root: &Path, dependency: &str) -> PathBuf {
        root.join("share").join(dependency).join(HINTS_FILE)
    }

    /// The first conventional hints file that exists under `roots`.
    pub fn locate(roots: &[PathBuf], dependency: &str) -> Option<PathBuf> {
        roots
            .iter()
            .map(|root| Self::default_path(root, dependency))
            .find(|path| path.is_file())
    }

    pub fn is_excluded(&self, library: &str) -> bool {
        self.exclude.iter().any(|e| e == library)
    }
}
