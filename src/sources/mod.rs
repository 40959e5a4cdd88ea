//! Artifact sources.
//!
//! Everything that reads an installation root: the prober itself plus the
//! parsers for library file names, pkg-config descriptors and hints files.

pub mod hints;
pub mod library;
pub mod pkgconfig;
pub mod probe;

pub use hints::Hints;
pub use pkgconfig::PkgConfig;
pub use probe::{ProbeOptions, Prober};
