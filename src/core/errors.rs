//! Generation error types and diagnostics.
//!
//! Every error names the dependency, the stage that failed and the artifact
//! at fault. None of them is retried: without a change on disk the outcome
//! would be the same.

use std::fmt;
use std::io;
use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::core::mode::DistributionMode;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Probe,
    Classify,
    Build,
    Emit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Probe => write!(f, "probe"),
            Stage::Classify => write!(f, "classify"),
            Stage::Build => write!(f, "build"),
            Stage::Emit => write!(f, "emit"),
        }
    }
}

/// Error during config generation for one dependency.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum GenerateError {
    #[error("no headers, libraries or source tree found for `{dependency}`")]
    #[diagnostic(
        code(depconf::probe::not_found),
        help("Point --root at the installation prefix (the directory holding include/ and lib/)")
    )]
    NotFound {
        dependency: String,
        roots: Vec<PathBuf>,
    },

    #[error("cannot classify `{dependency}`: {reason}")]
    #[diagnostic(code(depconf::classify::unclassifiable))]
    Unclassifiable {
        dependency: String,
        reason: String,
        artifacts: Vec<PathBuf>,
    },

    #[error("invalid artifact for `{dependency}`: {reason}")]
    #[diagnostic(code(depconf::build::invalid_artifact))]
    InvalidArtifact {
        dependency: String,
        stage: Stage,
        reason: String,
        artifact: Option<PathBuf>,
    },

    #[error("`{dependency}` was requested as {requested} but looks like {inferred}")]
    #[diagnostic(
        code(depconf::classify::mode_mismatch),
        help("Drop --mode, or fix the installation so it matches the requested mode")
    )]
    ModeMismatch {
        dependency: String,
        requested: DistributionMode,
        inferred: DistributionMode,
    },

    #[error("failed to write config for `{dependency}` to {}", path.display())]
    #[diagnostic(code(depconf::emit::serialization))]
    Serialization {
        dependency: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl GenerateError {
    /// The dependency the failing pipeline was generating.
    pub fn dependency(&self) -> &str {
        match self {
            GenerateError::NotFound { dependency, .. }
            | GenerateError::Unclassifiable { dependency, .. }
            | GenerateError::InvalidArtifact { dependency, .. }
            | GenerateError::ModeMismatch { dependency, .. }
            | GenerateError::Serialization { dependency, .. } => dependency,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            GenerateError::NotFound { .. } => Stage::Probe,
            GenerateError::Unclassifiable { .. } | GenerateError::ModeMismatch { .. } => {
                Stage::Classify
            }
            GenerateError::InvalidArtifact { stage, .. } => *stage,
            GenerateError::Serialization { .. } => Stage::Emit,
        }
    }

    /// Short machine-readable kind, used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerateError::NotFound { .. } => "not-found",
            GenerateError::Unclassifiable { .. } => "unclassifiable",
            GenerateError::InvalidArtifact { .. } => "invalid-artifact",
            GenerateError::ModeMismatch { .. } => "mode-mismatch",
            GenerateError::Serialization { .. } => "serialization",
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string())
            .with_context(format!("stage: {}", self.stage()));

        match self {
            GenerateError::NotFound { roots, .. } => {
                let mut diag = diag;
                for root in roots {
                    diag = diag.with_context(format!("searched {}", root.display()));
                }
                diag.with_suggestion(suggestions::CHECK_ROOT)
                    .with_suggestion(suggestions::SOURCE_TREE)
            }

            GenerateError::Unclassifiable { artifacts, .. } => {
                let mut diag = diag;
                for artifact in artifacts {
                    diag = diag.with_context(format!("artifact: {}", artifact.display()));
                }
                diag.with_suggestion(suggestions::EXCLUDE_LIBRARY)
                    .with_suggestion(suggestions::SPLIT_ROOTS)
            }

            GenerateError::InvalidArtifact { artifact, .. } => {
                let diag = match artifact {
                    Some(path) => diag.with_location(path),
                    None => diag,
                };
                diag.with_suggestion(suggestions::FIX_HINTS)
            }

            GenerateError::ModeMismatch { inferred, .. } => diag
                .with_context(format!("inferred from the installed files: {}", inferred))
                .with_suggestion(suggestions::INSPECT_PROBE),

            GenerateError::Serialization { path, source, .. } => diag
                .with_location(path)
                .with_context(source.to_string())
                .with_suggestion(suggestions::CHECK_PERMISSIONS),
        }
    }
}
