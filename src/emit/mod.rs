//! Config emission.
//!
//! [`emit`] renders a validated [`TargetGraph`] into a [`ConfigDocument`]
//! without touching the filesystem; [`publish`] replaces the document in its
//! destination directory as a whole.

pub mod cmake;
pub mod metadata;

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::{NamedTempFile, TempPath};

use crate::core::errors::GenerateError;
use crate::core::target::TargetGraph;
use crate::util::fs::{write_atomic, write_synced};
use crate::util::hash::sha256_str;

pub use cmake::PathStyle;
pub use metadata::{GraphMetadata, TargetMetadata};

/// Where and how to emit.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Directory receiving the config files
    pub destination: PathBuf,
    /// Write paths relative to the config file when possible
    pub relocatable: bool,
}

impl EmitOptions {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        EmitOptions {
            destination: destination.into(),
            relocatable: true,
        }
    }

    pub fn relocatable(mut self, relocatable: bool) -> Self {
        self.relocatable = relocatable;
        self
    }
}

/// `<first root>/lib/cmake/<namespace>`, or a relative `cmake/<namespace>`
/// when the graph has no root.
pub fn default_destination(graph: &TargetGraph) -> PathBuf {
    match graph.prefixes().first() {
        Some(root) => root.join("lib").join("cmake").join(graph.namespace()),
        None => PathBuf::from("cmake").join(graph.namespace()),
    }
}

/// One rendered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub file_name: String,
    pub contents: String,
}

/// The serialized form of one target graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    pub dependency: String,
    pub destination: PathBuf,
    pub files: Vec<ConfigFile>,
}

impl ConfigDocument {
    /// Destination path of each file, in document order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .map(|f| self.destination.join(&f.file_name))
            .collect()
    }

    /// All files concatenated with headers, for dry runs.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (file, path) in self.files.iter().zip(self.paths()) {
            out.push_str(&format!("# ---- {} ----\n", path.display()));
            out.push_str(&file.contents);
            out.push('\n');
        }
        out
    }
}

/// Render the config files for `graph`.
pub fn emit(graph: &TargetGraph, options: &EmitOptions) -> ConfigDocument {
    let style = PathStyle::select(graph, &options.destination, options.relocatable);
    tracing::debug!(
        "emitting `{}` into {} ({:?})",
        graph.dependency(),
        options.destination.display(),
        style
    );

    let ns = graph.namespace();
    ConfigDocument {
        dependency: graph.dependency().to_string(),
        destination: options.destination.clone(),
        files: vec![
            ConfigFile {
                file_name: format!("{}Config.cmake", ns),
                contents: cmake::config_file(graph, &style),
            },
            ConfigFile {
                file_name: format!("{}ConfigVersion.cmake", ns),
                contents: cmake::version_file(graph),
            },
        ],
    }
}

/// Outcome of writing one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedFile {
    pub path: PathBuf,
    /// SHA-256 of the contents, hex encoded
    pub checksum: String,
    /// Whether the file was (re)written; false when already up to date
    pub fresh: bool,
}

/// Write every file of `doc` into its destination as one unit.
pub fn publish(doc: &ConfigDocument) -> Result<Vec<PublishedFile>, GenerateError> {
    publish_with(doc, write_synced)
}

/// [`publish`] with a custom writer for the staged copies.
///
/// Changed files are first written next to their destination. Only when
/// every copy is staged are they renamed into place; if a rename fails the
/// files already replaced get their previous contents back. The destination
/// therefore holds the old document or the new one, never a mix.
pub fn publish_with<W>(doc: &ConfigDocument, mut write: W) -> Result<Vec<PublishedFile>, GenerateError>
where
    W: FnMut(&Path, &[u8]) -> io::Result<()>,
{
    let serialization = |path: &Path, source: io::Error| GenerateError::Serialization {
        dependency: doc.dependency.clone(),
        path: path.to_path_buf(),
        source,
    };

    let mut published = Vec::with_capacity(doc.files.len());
    let mut staged = Vec::new();

    for (file, path) in doc.files.iter().zip(doc.paths()) {
        let previous = std::fs::read(&path).ok();
        let fresh = previous.as_deref() != Some(file.contents.as_bytes());
        if fresh {
            let copy = stage(&path, file.contents.as_bytes(), &mut write)
                .map_err(|e| serialization(&path, e))?;
            staged.push(Staged {
                path: path.clone(),
                copy,
                previous,
            });
        } else {
            tracing::debug!("{} is up to date", path.display());
        }

        published.push(PublishedFile {
            checksum: sha256_str(&file.contents),
            path,
            fresh,
        });
    }

    commit(staged).map_err(|(path, e)| serialization(&path, e))?;
    Ok(published)
}

/// A new file waiting next to the one it replaces.
struct Staged {
    path: PathBuf,
    copy: TempPath,
    previous: Option<Vec<u8>>,
}

fn stage<W>(path: &Path, contents: &[u8], write: &mut W) -> io::Result<TempPath>
where
    W: FnMut(&Path, &[u8]) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let copy = NamedTempFile::new_in(dir)?.into_temp_path();
    write(&copy, contents)?;
    Ok(copy)
}

fn commit(staged: Vec<Staged>) -> Result<(), (PathBuf, io::Error)> {
    let mut replaced: Vec<(PathBuf, Option<Vec<u8>>)> = Vec::with_capacity(staged.len());

    for Staged { path, copy, previous } in staged {
        if let Err(e) = copy.persist(&path) {
            roll_back(&replaced);
            return Err((path, e.error));
        }
        tracing::info!("wrote {}", path.display());
        replaced.push((path, previous));
    }
    Ok(())
}

fn roll_back(replaced: &[(PathBuf, Option<Vec<u8>>)]) {
    for (path, previous) in replaced.iter().rev() {
        let restored = match previous {
            Some(contents) => write_atomic(path, contents),
            None => std::fs::remove_file(path),
        };
        match restored {
            Ok(()) => tracing::debug!("restored {}", path.display()),
            Err(e) => tracing::warn!("failed to restore {}: {}", path.display(), e),
        }
    }
}
