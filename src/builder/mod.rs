//! Target model construction.
//!
//! Converts a classified artifact inventory into the target graph the
//! emitter serializes.

pub mod model;
pub mod usage;

pub use model::{build, ModelOptions};
pub use usage::{from_descriptor, DescriptorUsage};
