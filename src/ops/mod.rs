//! High-level operations.
//!
//! This module contains the implementation of depconf commands.

pub mod batch;
pub mod generate;
pub mod verify;

pub use batch::load_batch;
pub use generate::{
    generate, generate_batch, probe, BatchItem, GenerateOutcome, GenerateRequest,
    GenerateSettings, ProbeReport,
};
pub use verify::{format_result, verify, VerifyOptions, VerifyResult};
