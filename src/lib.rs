//! depconf - CMake package configuration for installed C/C++ dependencies
//!
//! This crate inspects an installation prefix (headers, libraries,
//! pkg-config descriptors, source trees), classifies how the dependency is
//! distributed, and emits `<Name>Config.cmake` and `<Name>ConfigVersion.cmake`
//! so downstream projects can `find_package` it.
//!
//! The pipeline is probe, classify, build, emit:
//!
//! ```rust,ignore
//! use depconf::ops::{generate, GenerateRequest, GenerateSettings};
//!
//! let request = GenerateRequest::new("zlib", vec!["/opt/zlib".into()]);
//! let outcome = generate(&request, &GenerateSettings::default())?;
//! println!("{}", outcome.metadata.handle);
//! ```

pub mod builder;
pub mod core;
pub mod emit;
pub mod ops;
pub mod sources;
pub mod util;

/// Test utilities for depconf unit tests.
///
/// Only compiled for unit tests. Provides fake installation prefixes and a
/// scripted command runner.
#[cfg(test)]
pub mod test_support;

pub use core::{
    artifact::ArtifactSet, errors::GenerateError, mode::DistributionMode, target::TargetGraph,
};
pub use emit::ConfigDocument;
