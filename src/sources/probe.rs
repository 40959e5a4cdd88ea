//! Artifact prober - inventories installation roots.
//!
//! Roots are visited in caller order; within a root every listing is sorted
//! by file name, so the inventory never depends on directory order.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::core::artifact::{
    ArtifactSet, BinaryArtifact, BinaryKind, BuildSystem, HeaderRoot,
    SourceTree,
};
use crate::core::errors::{GenerateError, Stage};
use crate::sources::hints::Hints;
use crate::sources::library::scan_library_dirs;
use crate::sources::pkgconfig::PkgConfig;
use crate::util::fs::glob_files;

/// Build descriptors that mark a source tree, in detection order.
const DESCRIPTORS: &[(&str, BuildSystem)] = &[
    ("CMakeLists.txt", BuildSystem::CMake),
    ("meson.build", BuildSystem::Meson),
    ("configure", BuildSystem::Autotools),
    ("configure.ac", BuildSystem::Autotools),
    ("Makefile", BuildSystem::Make),
    ("GNUmakefile", BuildSystem::Make),
    ("makefile", BuildSystem::Make),
    ("MODULE.bazel", BuildSystem::Bazel),
    ("WORKSPACE", BuildSystem::Bazel),
    ("WORKSPACE.bazel", BuildSystem::Bazel),
    ("BUILD.bazel", BuildSystem::Bazel),
    ("Jamroot", BuildSystem::B2),
    ("jamroot.jam", BuildSystem::B2),
    ("*.pro", BuildSystem::QMake),
    ("*.gyp", BuildSystem::Gyp),
    ("build.ninja", BuildSystem::Ninja),
];

/// Where to look inside a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    pub include_dirs: Vec<String>,
    pub lib_dirs: Vec<String>,
    /// Without the leading dot
    pub header_extensions: Vec<String>,
    /// Explicit hints file, instead of `<root>/share/<name>/depconf.toml`
    pub hints_file: Option<PathBuf>,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        ProbeOptions {
            include_dirs: vec!["include".to_string()],
            lib_dirs: vec!["lib".to_string(), "lib64".to_string(), "bin".to_string()],
            header_extensions: ["h", "hh", "hpp", "hxx", "h++", "inl", "ipp", "tcc"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            hints_file: None,
        }
    }
}

/// Inventories candidate roots for one dependency.
#[derive(Debug, Clone, Default)]
pub struct Prober {
    options: ProbeOptions,
}

impl Prober {
    pub fn new(options: ProbeOptions) -> Self {
        Prober { options }
    }

    pub fn options(&self) -> &ProbeOptions {
        &self.options
    }

    /// Inventory `roots` for the dependency `name`.
    pub fn probe(&self, name: &str, roots: &[PathBuf]) -> Result<ArtifactSet, GenerateError> {
        let invalid = |reason: String, artifact: Option<PathBuf>| GenerateError::InvalidArtifact {
            dependency: name.to_string(),
            stage: Stage::Probe,
            reason,
            artifact,
        };

        let mut existing = Vec::new();
        for root in roots {
            match std::fs::canonicalize(root) {
                Ok(path) if path.is_dir() => existing.push(path),
                _ => tracing::warn!("root {} does not exist, skipping", root.display()),
            }
        }
        if existing.is_empty() {
            return Err(GenerateError::NotFound {
                dependency: name.to_string(),
                roots: roots.to_vec(),
            });
        }

        let hints = self
            .load_hints(name, &existing)
            .map_err(|(e, path)| invalid(format!("{:#}", e), Some(path)))?;

        let mut builder = ArtifactSet::builder(name);
        let mut binaries: Vec<BinaryArtifact> = Vec::new();
        let mut descriptors: Vec<PkgConfig> = Vec::new();

        for root in &existing {
            builder = builder.root(root);

            if let Some(tree) = detect_source_tree(root) {
                tracing::debug!(
                    "{} is a {} source tree",
                    root.display(),
                    tree.build_system
                );
                builder = builder.source_tree(tree);
                continue;
            }

            for header_root in self.header_roots(root) {
                builder = builder.header_root(header_root);
            }

            let lib_dirs: Vec<PathBuf> =
                self.options.lib_dirs.iter().map(|d| root.join(d)).collect();
            let found = scan_library_dirs(&lib_dirs)
                .map_err(|e| invalid(format!("{:#}", e), Some(root.clone())))?;
            binaries.extend(found.into_iter().filter(|b| {
                let excluded = hints.is_excluded(&b.name);
                if excluded {
                    tracing::debug!("excluding {}", b.path.display());
                }
                !excluded
            }));

            for path in self.descriptor_files(root) {
                let pc = PkgConfig::load(&path)
                    .map_err(|e| invalid(format!("{:#}", e), Some(path.clone())))?;
                builder = builder.metadata_file(&path);
                descriptors.push(pc);
            }
        }

        let (binaries, markers, loose) = attach_metadata(binaries, descriptors, &hints);
        for binary in binaries.into_iter().chain(markers) {
            builder = builder.binary(binary);
        }
        for descriptor in loose {
            builder = builder.loose_metadata(descriptor);
        }

        let set = builder.hints(hints).build();
        if set.is_empty() {
            return Err(GenerateError::NotFound {
                dependency: name.to_string(),
                roots: existing,
            });
        }

        tracing::info!(
            "probed `{}`: {} header root(s), {} binary artifact(s), {} source tree(s)",
            name,
            set.header_roots().len(),
            set.binaries().len(),
            set.source_trees().len()
        );
        Ok(set)
    }

    fn load_hints(
        &self,
        name: &str,
        roots: &[PathBuf],
    ) -> Result<Hints, (anyhow::Error, PathBuf)> {
        let path = match &self.options.hints_file {
            Some(path) => Some(path.clone()),
            None => Hints::locate(roots, name),
        };

        match path {
            Some(path) => {
                tracing::debug!("using hints from {}", path.display());
                Hints::load(&path).map_err(|e| (e, path))
            }
            None => Ok(Hints::default()),
        }
    }

    /// Configured include directories that hold at least one header.
    fn header_roots(&self, root: &Path) -> Vec<HeaderRoot> {
        let mut found = Vec::new();

        for dir in &self.options.include_dirs {
            let path = root.join(dir);
            if !path.is_dir() || !self.contains_header(&path) {
                continue;
            }

            let subdirs = WalkDir::new(&path)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_dir())
                .filter_map(|e| e.file_name().to_str().map(str::to_string))
                .collect();

            let path = std::fs::canonicalize(&path).unwrap_or(path);
            found.push(HeaderRoot::new(path, subdirs));
        }

        found
    }

    fn contains_header(&self, dir: &Path) -> bool {
        WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .any(|e| match e.path().extension().and_then(|x| x.to_str()) {
                Some(ext) => self
                    .options
                    .header_extensions
                    .iter()
                    .any(|h| h.eq_ignore_ascii_case(ext)),
                None => true,
            })
    }

    /// `*.pc` under `<lib dir>/pkgconfig` and `share/pkgconfig`.
    fn descriptor_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut patterns: Vec<String> = self
            .options
            .lib_dirs
            .iter()
            .map(|d| format!("{}/pkgconfig/*.pc", d))
            .collect();
        patterns.push("share/pkgconfig/*.pc".to_string());

        match glob_files(root, &patterns) {
            Ok(files) => files
                .into_iter()
                .filter_map(|f| std::fs::canonicalize(&f).ok())
                .collect(),
            Err(e) => {
                tracing::warn!("failed to list pkg-config files in {}: {}", root.display(), e);
                Vec::new()
            }
        }
    }
}

/// The first recognized build descriptor directly inside `root`.
pub fn detect_source_tree(root: &Path) -> Option<SourceTree> {
    for (pattern, build_system) in DESCRIPTORS {
        let descriptor = if pattern.contains('*') {
            glob_files(root, &[pattern.to_string()])
                .ok()
                .and_then(|files| files.into_iter().next())
        } else {
            Some(root.join(pattern)).filter(|p| p.is_file())
        };

        if let Some(descriptor) = descriptor {
            return Some(SourceTree::new(root, *build_system, descriptor));
        }
    }
    None
}

/// Pair descriptors with the libraries they describe. Unmatched descriptors
/// that carry more than include paths become interface markers; the rest
/// are returned as loose metadata.
fn attach_metadata(
    binaries: Vec<BinaryArtifact>,
    descriptors: Vec<PkgConfig>,
    hints: &Hints,
) -> (Vec<BinaryArtifact>, Vec<BinaryArtifact>, Vec<PkgConfig>) {
    let binaries: Vec<BinaryArtifact> = binaries
        .into_iter()
        .map(|binary| match descriptors.iter().find(|pc| pc.describes(&binary.name)) {
            Some(pc) => binary.with_metadata(pc.clone()),
            None => binary,
        })
        .collect();

    let is_present = |lib: &str| binaries.iter().any(|b| b.name == lib);

    let mut markers: Vec<BinaryArtifact> = Vec::new();
    let mut loose: Vec<PkgConfig> = Vec::new();
    for pc in &descriptors {
        let name = pc.library_name();
        if binaries.iter().any(|b| pc.describes(&b.name))
            || hints.is_excluded(name)
            || hints.is_excluded(&pc.module)
        {
            continue;
        }
        if !pc.propagates_beyond_includes(is_present) {
            tracing::debug!("{} only adds include paths", pc.path.display());
            loose.push(pc.clone());
            continue;
        }
        if markers.iter().any(|m| m.name == name) {
            tracing::warn!("skipping duplicate descriptor {}", pc.path.display());
            continue;
        }
        markers.push(
            BinaryArtifact::new(name, BinaryKind::Interface, &pc.path).with_metadata(pc.clone()),
        );
    }

    (binaries, markers, loose)
}
