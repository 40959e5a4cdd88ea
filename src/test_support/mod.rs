//! Test utilities for depconf unit tests.
//!
//! [`InstallTree`] lays out a fake installation prefix in a temporary
//! directory; [`MockExecutor`] stands in for CMake and the consumer program
//! in harness tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use depconf::test_support::InstallTree;
//!
//! let tree = InstallTree::new()
//!     .header("include/zlib.h")
//!     .shared_lib("lib", "z", "1.3.1")
//!     .build();
//! ```

pub mod fixtures;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tempfile::TempDir;

use crate::ops::verify::CommandRunner;
use crate::util::process::ProcessOutput;

pub use fixtures::*;

/// Header bytes of a 64-bit ELF object, enough for pointer-width probing.
pub const ELF64_STUB: &[u8] = b"\x7fELF\x02\x01\x01\x00";

/// Builder for a fake installation prefix.
pub struct InstallTree {
    tmp: TempDir,
}

impl InstallTree {
    pub fn new() -> Self {
        InstallTree {
            tmp: TempDir::new().expect("failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.tmp.path()
    }

    /// Write a file relative to the root, creating parent directories.
    pub fn file(self, rel: &str, contents: impl AsRef<[u8]>) -> Self {
        let path = self.tmp.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create dir");
        }
        std::fs::write(&path, contents).expect("failed to write file");
        self
    }

    /// Write a header with an include guard.
    pub fn header(self, rel: &str) -> Self {
        let guard = rel.to_uppercase().replace(['/', '.', '-'], "_");
        let contents = format!("#ifndef {guard}\n#define {guard}\n#endif\n");
        self.file(rel, contents)
    }

    /// `<dir>/lib<name>.a`
    pub fn static_lib(self, dir: &str, name: &str) -> Self {
        self.file(&format!("{}/lib{}.a", dir, name), "!<arch>\n")
    }

    /// `<dir>/lib<name>.so.<version>` plus the usual `.so.<major>` and
    /// `.so` symlinks.
    pub fn shared_lib(self, dir: &str, name: &str, version: &str) -> Self {
        let real = format!("lib{}.so.{}", name, version);
        let tree = self.file(&format!("{}/{}", dir, real), ELF64_STUB);

        let major = version.split('.').next().unwrap_or(version);
        let mut links = vec![format!("lib{}.so", name)];
        if major != version {
            links.push(format!("lib{}.so.{}", name, major));
        }
        for link in links {
            tree.link(dir, &real, &link);
        }
        tree
    }

    #[cfg(unix)]
    fn link(&self, dir: &str, target: &str, link: &str) {
        std::os::unix::fs::symlink(target, self.tmp.path().join(dir).join(link))
            .expect("failed to create symlink");
    }

    #[cfg(not(unix))]
    fn link(&self, dir: &str, target: &str, link: &str) {
        let dir = self.tmp.path().join(dir);
        std::fs::copy(dir.join(target), dir.join(link)).expect("failed to copy library");
    }

    /// A pkg-config descriptor with a relocatable prefix.
    pub fn pkgconfig(self, rel: &str, body: &str) -> Self {
        let depth = Path::new(rel).components().count() - 1;
        let prefix = std::iter::repeat("..").take(depth).collect::<Vec<_>>().join("/");
        let contents = format!(
            "prefix=${{pcfiledir}}/{prefix}\nlibdir=${{prefix}}/lib\nincludedir=${{prefix}}/include\n\n{body}"
        );
        self.file(rel, contents)
    }

    pub fn build(self) -> TempDir {
        self.tmp
    }
}

impl Default for InstallTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Mock process executor for harness tests.
///
/// Commands are matched by substring against `program args...`, first
/// match wins.
#[derive(Debug, Default)]
pub struct MockExecutor {
    expectations: Vec<(String, ProcessOutput)>,
    calls: Vec<String>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer any command containing `substring` with `output`.
    pub fn expect_contains(mut self, substring: &str, output: ProcessOutput) -> Self {
        self.expectations.push((substring.to_string(), output));
        self
    }

    pub fn run(&mut self, program: &Path, args: &[String]) -> Result<ProcessOutput> {
        let full_cmd = std::iter::once(program.display().to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.push(full_cmd.clone());

        for (pattern, output) in &self.expectations {
            if full_cmd.contains(pattern.as_str()) {
                return Ok(output.clone());
            }
        }
        bail!("unexpected command: {}", full_cmd)
    }

    /// Commands run so far.
    pub fn calls(&self) -> &[String] {
        &self.calls
    }
}

impl CommandRunner for MockExecutor {
    fn run(&mut self, program: &Path, args: &[String]) -> Result<ProcessOutput> {
        MockExecutor::run(self, program, args)
    }
}

/// Canonical path of `rel` under `root`.
pub fn canonical(root: &Path, rel: &str) -> PathBuf {
    std::fs::canonicalize(root.join(rel)).expect("path should exist")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_tree_layout() {
        let tree = InstallTree::new()
            .header("include/zlib.h")
            .shared_lib("lib", "z", "1.3.1")
            .build();

        assert!(tree.path().join("include/zlib.h").is_file());
        assert!(tree.path().join("lib/libz.so.1.3.1").is_file());
        assert!(tree.path().join("lib/libz.so.1").exists());
        assert!(tree.path().join("lib/libz.so").exists());
    }

    #[test]
    fn test_pkgconfig_prefix_is_relative() {
        let tree = InstallTree::new()
            .pkgconfig("lib/pkgconfig/z.pc", "Name: z\n")
            .build();
        let contents =
            std::fs::read_to_string(tree.path().join("lib/pkgconfig/z.pc")).unwrap();
        assert!(contents.starts_with("prefix=${pcfiledir}/../..\n"));
    }

    #[test]
    fn test_mock_executor() {
        let mut exec = MockExecutor::new().expect_contains("--build", ProcessOutput::ok(""));

        assert!(exec
            .run(Path::new("cmake"), &["--build".into(), "out".into()])
            .unwrap()
            .success());
        assert!(exec.run(Path::new("ctest"), &[]).is_err());
        assert_eq!(exec.calls(), ["cmake --build out", "ctest"]);
    }
}
