//! Artifact inventory - what the prober found on disk.
//!
//! An `ArtifactSet` is created once per generation run and never mutated
//! afterwards. Construction goes through [`ArtifactSetBuilder`], which is
//! what the prober (and tests) use to assemble one.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::sources::hints::Hints;
use crate::sources::pkgconfig::PkgConfig;

/// How a binary artifact is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryKind {
    /// Static archive (.a / .lib)
    Static,
    /// Shared object (.so / .dylib / .dll)
    Shared,
    /// Interface descriptor with nothing to link
    Interface,
}

impl BinaryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryKind::Static => "static",
            BinaryKind::Shared => "shared",
            BinaryKind::Interface => "interface",
        }
    }

    /// Whether a linker can consume the artifact.
    pub fn is_linkable(&self) -> bool {
        matches!(self, BinaryKind::Static | BinaryKind::Shared)
    }
}

impl fmt::Display for BinaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Preferred variant when a library ships both static and shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    #[default]
    Shared,
    Static,
}

impl std::str::FromStr for Linkage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shared" | "dynamic" => Ok(Linkage::Shared),
            "static" => Ok(Linkage::Static),
            _ => Err(format!(
                "invalid linkage '{}'; expected 'shared' or 'static'",
                s
            )),
        }
    }
}

/// One discovered binary file (or interface descriptor).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryArtifact {
    /// Logical library name without prefix, extension or version (`avcodec`)
    pub name: String,

    pub kind: BinaryKind,

    /// The real file: archive, fully-versioned shared object, DLL, or the
    /// `.pc` descriptor for interface markers
    pub path: PathBuf,

    /// ELF soname spelling (`libavcodec.so.59`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soname: Option<String>,

    /// Import library paired with a DLL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_lib: Option<PathBuf>,

    /// 32 or 64, when the file header tells
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer_width: Option<u8>,

    /// pkg-config descriptor describing this library
    #[serde(skip)]
    pub metadata: Option<PkgConfig>,
}

impl BinaryArtifact {
    pub fn new(name: impl Into<String>, kind: BinaryKind, path: impl Into<PathBuf>) -> Self {
        BinaryArtifact {
            name: name.into(),
            kind,
            path: path.into(),
            soname: None,
            import_lib: None,
            pointer_width: None,
            metadata: None,
        }
    }

    pub fn with_soname(mut self, soname: impl Into<String>) -> Self {
        self.soname = Some(soname.into());
        self
    }

    pub fn with_import_lib(mut self, path: impl Into<PathBuf>) -> Self {
        self.import_lib = Some(path.into());
        self
    }

    pub fn with_pointer_width(mut self, width: Option<u8>) -> Self {
        self.pointer_width = width;
        self
    }

    pub fn with_metadata(mut self, metadata: PkgConfig) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// An include directory that holds headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderRoot {
    pub path: PathBuf,

    /// Immediate sub-directory names, sorted
    pub subdirs: Vec<String>,
}

impl HeaderRoot {
    pub fn new(path: impl Into<PathBuf>, subdirs: Vec<String>) -> Self {
        HeaderRoot {
            path: path.into(),
            subdirs,
        }
    }

    /// Whether this root holds the headers of `component`
    /// (`include/libavcodec` or `include/avcodec`).
    pub fn serves(&self, component: &str) -> bool {
        let prefixed = format!("lib{}", component);
        self.subdirs
            .iter()
            .any(|d| d.eq_ignore_ascii_case(component) || d.eq_ignore_ascii_case(&prefixed))
    }
}

/// Build systems recognized in source trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildSystem {
    CMake,
    Meson,
    Autotools,
    Make,
    Bazel,
    B2,
    QMake,
    Gyp,
    Ninja,
}

impl BuildSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildSystem::CMake => "cmake",
            BuildSystem::Meson => "meson",
            BuildSystem::Autotools => "autotools",
            BuildSystem::Make => "make",
            BuildSystem::Bazel => "bazel",
            BuildSystem::B2 => "b2",
            BuildSystem::QMake => "qmake",
            BuildSystem::Gyp => "gyp",
            BuildSystem::Ninja => "ninja",
        }
    }
}

impl fmt::Display for BuildSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source tree with a recognized build descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceTree {
    pub root: PathBuf,
    pub build_system: BuildSystem,
    pub descriptor: PathBuf,
}

impl SourceTree {
    pub fn new(
        root: impl Into<PathBuf>,
        build_system: BuildSystem,
        descriptor: impl Into<PathBuf>,
    ) -> Self {
        SourceTree {
            root: root.into(),
            build_system,
            descriptor: descriptor.into(),
        }
    }
}

/// All spellings of one library: at most one static and one shared file.
#[derive(Debug, Clone, Copy)]
pub struct LibraryGroup<'a> {
    pub name: &'a str,
    pub static_lib: Option<&'a BinaryArtifact>,
    pub shared_lib: Option<&'a BinaryArtifact>,
}

impl<'a> LibraryGroup<'a> {
    /// The variant to link for the given preference, falling back to the
    /// other one when only that exists.
    pub fn select(&self, linkage: Linkage) -> &'a BinaryArtifact {
        let (first, second) = match linkage {
            Linkage::Shared => (self.shared_lib, self.static_lib),
            Linkage::Static => (self.static_lib, self.shared_lib),
        };
        first
            .or(second)
            .expect("library group always holds at least one variant")
    }

    /// The shared variant if any, else the static one.
    pub fn primary(&self) -> &'a BinaryArtifact {
        self.select(Linkage::Shared)
    }
}

/// The same library and kind found at two different places.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryConflict {
    pub name: String,
    pub kind: BinaryKind,
    pub first: PathBuf,
    pub second: PathBuf,
}

impl LibraryConflict {
    pub fn paths(&self) -> Vec<PathBuf> {
        vec![self.first.clone(), self.second.clone()]
    }
}

impl fmt::Display for LibraryConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} library `{}` found twice: {} and {}",
            self.kind,
            self.name,
            self.first.display(),
            self.second.display()
        )
    }
}

/// The raw inventory for one dependency.
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    name: String,
    roots: Vec<PathBuf>,
    header_roots: Vec<HeaderRoot>,
    binaries: Vec<BinaryArtifact>,
    metadata_files: Vec<PathBuf>,
    loose_metadata: Vec<PkgConfig>,
    source_trees: Vec<SourceTree>,
    hints: Hints,
}

impl ArtifactSet {
    pub fn builder(name: impl Into<String>) -> ArtifactSetBuilder {
        ArtifactSetBuilder {
            set: ArtifactSet {
                name: name.into(),
                roots: Vec::new(),
                header_roots: Vec::new(),
                binaries: Vec::new(),
                metadata_files: Vec::new(),
                loose_metadata: Vec::new(),
                source_trees: Vec::new(),
                hints: Hints::default(),
            },
        }
    }

    /// Dependency identity.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Installation roots that existed when probed, in caller order.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn header_roots(&self) -> &[HeaderRoot] {
        &self.header_roots
    }

    pub fn binaries(&self) -> &[BinaryArtifact] {
        &self.binaries
    }

    /// Every native metadata file seen (`*.pc`), described or not.
    pub fn metadata_files(&self) -> &[PathBuf] {
        &self.metadata_files
    }

    /// Descriptors that describe no library and only add include paths.
    pub fn loose_metadata(&self) -> &[PkgConfig] {
        &self.loose_metadata
    }

    pub fn source_trees(&self) -> &[SourceTree] {
        &self.source_trees
    }

    pub fn hints(&self) -> &Hints {
        &self.hints
    }

    /// Whether the prober found nothing at all.
    pub fn is_empty(&self) -> bool {
        self.header_roots.is_empty() && self.binaries.is_empty() && self.source_trees.is_empty()
    }

    /// Binaries tagged `interface`.
    pub fn interface_markers(&self) -> impl Iterator<Item = &BinaryArtifact> {
        self.binaries
            .iter()
            .filter(|b| b.kind == BinaryKind::Interface)
    }

    /// Linkable binaries grouped into logical libraries, in discovery order.
    pub fn libraries(&self) -> Result<Vec<LibraryGroup<'_>>, LibraryConflict> {
        let mut groups: Vec<LibraryGroup<'_>> = Vec::new();

        for binary in self.binaries.iter().filter(|b| b.kind.is_linkable()) {
            let index = match groups.iter().position(|g| g.name == binary.name) {
                Some(index) => index,
                None => {
                    groups.push(LibraryGroup {
                        name: &binary.name,
                        static_lib: None,
                        shared_lib: None,
                    });
                    groups.len() - 1
                }
            };

            let slot = match binary.kind {
                BinaryKind::Static => &mut groups[index].static_lib,
                _ => &mut groups[index].shared_lib,
            };
            if let Some(existing) = slot {
                if existing.path != binary.path {
                    return Err(LibraryConflict {
                        name: binary.name.clone(),
                        kind: binary.kind,
                        first: existing.path.clone(),
                        second: binary.path.clone(),
                    });
                }
            } else {
                *slot = Some(binary);
            }
        }

        Ok(groups)
    }

    /// Every path the set refers to, for error reports.
    pub fn all_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.roots.clone();
        paths.extend(self.header_roots.iter().map(|h| h.path.clone()));
        paths.extend(self.binaries.iter().map(|b| b.path.clone()));
        paths.extend(self.source_trees.iter().map(|s| s.descriptor.clone()));
        paths
    }

    /// The first version native metadata declares: described libraries and
    /// markers first, then loose descriptors.
    pub fn metadata_version(&self) -> Option<&str> {
        self.binaries
            .iter()
            .filter_map(|b| b.metadata.as_ref())
            .chain(self.loose_metadata.iter())
            .find_map(|pc| pc.version.as_deref())
    }
}

/// Assembles an [`ArtifactSet`].
#[derive(Debug)]
pub struct ArtifactSetBuilder {
    set: ArtifactSet,
}

impl ArtifactSetBuilder {
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.set.roots.push(root.into());
        self
    }

    pub fn header_root(mut self, header_root: HeaderRoot) -> Self {
        if !self.set.header_roots.iter().any(|h| h.path == header_root.path) {
            self.set.header_roots.push(header_root);
        }
        self
    }

    pub fn binary(mut self, binary: BinaryArtifact) -> Self {
        self.set.binaries.push(binary);
        self
    }

    pub fn metadata_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.set.metadata_files.push(path.into());
        self
    }

    pub fn loose_metadata(mut self, descriptor: PkgConfig) -> Self {
        self.set.loose_metadata.push(descriptor);
        self
    }

    pub fn source_tree(mut self, tree: SourceTree) -> Self {
        self.set.source_trees.push(tree);
        self
    }

    pub fn hints(mut self, hints: Hints) -> Self {
        self.set.hints = hints;
        self
    }

    pub fn build(self) -> ArtifactSet {
        self.set
    }
}
