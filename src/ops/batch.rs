//! Batch files for `depconf batch`.
//!
//! ```toml
//! [[dependency]]
//! name = "ffmpeg"
//! roots = ["/opt/ffmpeg"]
//! out = "cmake/FFmpeg"
//! mode = "prebuilt-multi-component"
//! ```
//!
//! Relative paths are resolved against the batch file's directory.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::core::mode::DistributionMode;
use crate::ops::generate::GenerateRequest;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BatchFile {
    #[serde(default, rename = "dependency")]
    dependencies: Vec<BatchEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BatchEntry {
    name: String,
    roots: Vec<PathBuf>,
    out: Option<PathBuf>,
    mode: Option<String>,
    namespace: Option<String>,
    version: Option<String>,
    hints: Option<PathBuf>,
}

/// Load the requests of a batch file.
pub fn load_batch(path: &Path) -> Result<Vec<GenerateRequest>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read batch file: {}", path.display()))?;
    let base = path.parent().unwrap_or(Path::new("."));
    parse_batch(&contents, base)
        .with_context(|| format!("invalid batch file: {}", path.display()))
}

fn parse_batch(contents: &str, base: &Path) -> Result<Vec<GenerateRequest>> {
    let file: BatchFile = toml::from_str(contents)?;
    if file.dependencies.is_empty() {
        bail!("no [[dependency]] entries");
    }

    let resolve = |p: PathBuf| if p.is_absolute() { p } else { base.join(p) };

    let mut requests = Vec::with_capacity(file.dependencies.len());
    for entry in file.dependencies {
        if entry.roots.is_empty() {
            bail!("dependency `{}` lists no roots", entry.name);
        }
        if requests
            .iter()
            .any(|r: &GenerateRequest| r.name == entry.name)
        {
            bail!("dependency `{}` is listed twice", entry.name);
        }

        let mode = entry
            .mode
            .as_deref()
            .map(str::parse::<DistributionMode>)
            .transpose()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("dependency `{}`", entry.name))?;

        requests.push(GenerateRequest {
            name: entry.name,
            roots: entry.roots.into_iter().map(resolve).collect(),
            destination: entry.out.map(resolve),
            mode,
            namespace: entry.namespace,
            version: entry.version,
            hints: entry.hints.map(resolve),
            dry_run: false,
        });
    }

    Ok(requests)
}
