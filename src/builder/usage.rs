//! Usage requirements derived from pkg-config flags.

use std::path::{Path, PathBuf};

use crate::core::artifact::BinaryKind;
use crate::core::target::UsageRequirements;
use crate::sources::pkgconfig::{Flag, PkgConfig};

/// Include directories and requirements one descriptor propagates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorUsage {
    /// `-I` directories that exist, canonicalized. Relative ones are taken
    /// from the descriptor's directory.
    pub include_dirs: Vec<PathBuf>,
    pub usage: UsageRequirements,
}

/// Translate a descriptor for a target of the given kind.
///
/// `is_internal` tells whether a `-l` name is a library of the dependency
/// itself; those are expressed as target edges, not link flags.
/// `Libs.private` is only honored for static variants, and `-L` only for
/// interface targets, which have no imported location to link against.
pub fn from_descriptor(
    pc: &PkgConfig,
    kind: BinaryKind,
    is_internal: impl Fn(&str) -> bool,
) -> DescriptorUsage {
    let mut out = DescriptorUsage::default();

    for flag in &pc.cflags {
        match flag {
            Flag::Include(dir) => match std::fs::canonicalize(descriptor_relative(pc, dir)) {
                Ok(dir) => {
                    if !out.include_dirs.contains(&dir) {
                        out.include_dirs.push(dir);
                    }
                }
                Err(_) => tracing::debug!(
                    "{}: dropping missing include dir {}",
                    pc.path.display(),
                    dir.display()
                ),
            },
            Flag::Define(define) => push_unique(&mut out.usage.compile_definitions, define),
            Flag::Pthread => {
                push_unique(&mut out.usage.compile_options, "-pthread");
                push_unique(&mut out.usage.link_options, "-pthread");
            }
            Flag::Other(option) => push_unique(&mut out.usage.compile_options, option),
            Flag::LibDir(_) | Flag::Lib(_) => {}
        }
    }

    let private: &[Flag] = if kind == BinaryKind::Static {
        &pc.libs_private
    } else {
        &[]
    };
    for flag in pc.libs.iter().chain(private) {
        match flag {
            Flag::Lib(name) if !is_internal(name) => {
                push_unique(&mut out.usage.link_libraries, name)
            }
            Flag::LibDir(dir) if kind == BinaryKind::Interface => {
                push_unique(&mut out.usage.link_options, &format!("-L{}", dir.display()))
            }
            Flag::Pthread => push_unique(&mut out.usage.link_options, "-pthread"),
            Flag::Other(option) => push_unique(&mut out.usage.link_options, option),
            _ => {}
        }
    }

    out
}

fn descriptor_relative(pc: &PkgConfig, dir: &Path) -> PathBuf {
    match pc.path.parent() {
        Some(base) if dir.is_relative() => base.join(dir),
        _ => dir.to_path_buf(),
    }
}

fn push_unique(into: &mut Vec<String>, item: &str) {
    if !into.iter().any(|i| i == item) {
        into.push(item.to_string());
    }
}
