//! Core data structures for depconf.
//!
//! This module contains the foundational types of the pipeline:
//! - The artifact inventory a probe produces
//! - Distribution modes and the classifier
//! - The target graph emitted as a config document
//! - Generation errors

pub mod artifact;
pub mod errors;
pub mod mode;
pub mod target;
pub mod version;

pub use artifact::{ArtifactSet, BinaryArtifact, BinaryKind, HeaderRoot, Linkage, SourceTree};
pub use errors::{GenerateError, Stage};
pub use mode::{classify, DistributionMode};
pub use target::{Target, TargetGraph, TargetId, TargetKind};
