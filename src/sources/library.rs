//! Library file name parsing and per-root binary inventory.
//!
//! All spellings of one library in a directory collapse into one artifact:
//! `libz.so -> libz.so.1 -> libz.so.1.3.1` becomes a single shared `z`
//! located at the real file with soname `libz.so.1`. DLLs pair with their
//! import libraries across directories (`bin/z.dll` + `lib/z.lib`).

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::core::artifact::{BinaryArtifact, BinaryKind};
use crate::sources::pkgconfig::strip_lib_prefix;

/// What a file name says about a library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryFile {
    /// `libz.a`
    Archive { name: String },
    /// `libz.so`, `libz.so.1.3`, `libz.1.dylib`
    SharedObject { name: String, version: Option<String> },
    /// `z.dll`, `avcodec-59.dll`
    Dll { name: String },
    /// `z.lib`: static archive or import library, depending on a DLL
    MsvcLib { name: String },
    /// `libz.dll.a`
    MingwImportLib { name: String },
}

impl LibraryFile {
    pub fn name(&self) -> &str {
        match self {
            LibraryFile::Archive { name }
            | LibraryFile::SharedObject { name, .. }
            | LibraryFile::Dll { name }
            | LibraryFile::MsvcLib { name }
            | LibraryFile::MingwImportLib { name } => name,
        }
    }
}

fn is_version(s: &str) -> bool {
    !s.is_empty() && s.split('.').all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

/// Classify a file name. Returns `None` for anything that is not a library.
pub fn parse_file_name(file_name: &str) -> Option<LibraryFile> {
    if let Some(stem) = file_name.strip_suffix(".dll.a") {
        let name = stem.strip_prefix("lib").unwrap_or(stem);
        return (!name.is_empty()).then(|| LibraryFile::MingwImportLib {
            name: name.to_string(),
        });
    }

    if let Some(rest) = file_name.strip_prefix("lib") {
        if let Some(name) = rest.strip_suffix(".a") {
            return (!name.is_empty()).then(|| LibraryFile::Archive {
                name: name.to_string(),
            });
        }

        if let Some(name) = rest.strip_suffix(".so") {
            return (!name.is_empty()).then(|| LibraryFile::SharedObject {
                name: name.to_string(),
                version: None,
            });
        }
        if let Some((name, version)) = rest.split_once(".so.") {
            return (!name.is_empty() && is_version(version)).then(|| {
                LibraryFile::SharedObject {
                    name: name.to_string(),
                    version: Some(version.to_string()),
                }
            });
        }

        if let Some(stem) = rest.strip_suffix(".dylib") {
            // libfoo.1.2.dylib: the version starts at the first `.<digit>`
            let split = stem
                .match_indices('.')
                .map(|(i, _)| i)
                .find(|&i| is_version(&stem[i + 1..]));
            let (name, version) = match split {
                Some(i) => (&stem[..i], Some(stem[i + 1..].to_string())),
                None => (stem, None),
            };
            return (!name.is_empty()).then(|| LibraryFile::SharedObject {
                name: name.to_string(),
                version,
            });
        }
    }

    if let Some(stem) = file_name.strip_suffix(".dll") {
        let name = match stem.rsplit_once('-') {
            Some((base, digits)) if is_version(digits) && !base.is_empty() => base,
            _ => stem,
        };
        return (!name.is_empty()).then(|| LibraryFile::Dll {
            name: strip_lib_prefix(name).to_string(),
        });
    }

    if let Some(stem) = file_name.strip_suffix(".lib") {
        return (!stem.is_empty()).then(|| LibraryFile::MsvcLib {
            name: strip_lib_prefix(stem).to_string(),
        });
    }

    None
}

/// Pointer width from an ELF header (`EI_CLASS`), if the file is ELF.
pub fn elf_pointer_width(path: &Path) -> Option<u8> {
    let mut header = [0u8; 5];
    let mut file = std::fs::File::open(path).ok()?;
    file.read_exact(&mut header).ok()?;
    if &header[..4] != b"\x7fELF" {
        return None;
    }
    match header[4] {
        1 => Some(32),
        2 => Some(64),
        _ => None,
    }
}

/// List a directory non-recursively, sorted by file name, skipping
/// dangling symlinks.
fn list_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
        let path = entry.path();

        match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => continue,
            Err(_) => {
                tracing::warn!("skipping dangling symlink {}", path.display());
                continue;
            }
        }

        if let Some(name) = entry.file_name().to_str() {
            files.push((name.to_string(), path.to_path_buf()));
        }
    }

    Ok(files)
}

fn canonical(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path).with_context(|| format!("failed to resolve {}", path.display()))
}

#[derive(Default)]
struct SharedSpellings {
    /// (version, path) per spelling, in file-name order
    spellings: Vec<(Option<String>, PathBuf)>,
}

impl SharedSpellings {
    fn into_artifact(self, name: &str) -> Result<BinaryArtifact> {
        let real = self
            .spellings
            .iter()
            .max_by_key(|(v, _)| v.as_ref().map(|v| v.len()).unwrap_or(0))
            .map(|(_, p)| p.clone())
            .with_context(|| format!("no files for shared library `{}`", name))?;
        let location = canonical(&real)?;

        let soname = self
            .spellings
            .iter()
            .filter(|(_, p)| p.extension().is_some_and(|e| e != "dylib"))
            .find(|(v, _)| v.as_ref().is_some_and(|v| !v.contains('.')))
            .and_then(|(_, p)| p.file_name())
            .map(|n| n.to_string_lossy().into_owned());

        let mut artifact = BinaryArtifact::new(name, BinaryKind::Shared, &location)
            .with_pointer_width(elf_pointer_width(&location));
        if let Some(soname) = soname {
            artifact = artifact.with_soname(soname);
        }
        Ok(artifact)
    }
}

/// Inventory the library directories of one root.
pub fn scan_library_dirs(dirs: &[PathBuf]) -> Result<Vec<BinaryArtifact>> {
    let mut artifacts = Vec::new();
    let mut dlls: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut msvc_libs: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut mingw_import: BTreeMap<String, PathBuf> = BTreeMap::new();

    for dir in dirs.iter().filter(|d| d.is_dir()) {
        tracing::debug!("scanning {}", dir.display());

        let mut shared: Vec<(String, SharedSpellings)> = Vec::new();

        for (file_name, path) in list_files(dir)? {
            let Some(parsed) = parse_file_name(&file_name) else {
                continue;
            };

            match parsed {
                LibraryFile::Archive { name } => {
                    artifacts.push(BinaryArtifact::new(name, BinaryKind::Static, canonical(&path)?));
                }
                LibraryFile::SharedObject { name, version } => {
                    match shared.iter_mut().find(|(n, _)| *n == name) {
                        Some((_, group)) => group.spellings.push((version, path)),
                        None => {
                            let mut group = SharedSpellings::default();
                            group.spellings.push((version, path));
                            shared.push((name, group));
                        }
                    }
                }
                LibraryFile::Dll { name } => {
                    dlls.entry(name).or_insert(canonical(&path)?);
                }
                LibraryFile::MsvcLib { name } => {
                    msvc_libs.entry(name).or_insert(canonical(&path)?);
                }
                LibraryFile::MingwImportLib { name } => {
                    mingw_import.entry(name).or_insert(canonical(&path)?);
                }
            }
        }

        for (name, group) in shared {
            artifacts.push(group.into_artifact(&name)?);
        }
    }

    for (name, dll) in dlls {
        let import = msvc_libs.remove(&name).or_else(|| mingw_import.remove(&name));
        let mut artifact = BinaryArtifact::new(&name, BinaryKind::Shared, dll);
        match import {
            Some(import) => artifact = artifact.with_import_lib(import),
            None => tracing::warn!("DLL for `{}` has no import library", name),
        }
        artifacts.push(artifact);
    }

    for (name, lib) in msvc_libs {
        artifacts.push(BinaryArtifact::new(name, BinaryKind::Static, lib));
    }

    for (name, lib) in mingw_import {
        tracing::warn!(
            "skipping import library {} for `{}`: no DLL found",
            lib.display(),
            name
        );
    }

    Ok(artifacts)
}
