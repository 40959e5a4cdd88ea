//! Distribution modes and the shape-based classifier.
//!
//! A dependency is never told what it is. The classifier looks at the
//! inventory the prober produced and decides, with the first matching rule:
//!
//! 1. headers, no binaries                      -> `HeaderOnly`
//! 2. only interface markers (headers optional) -> `InterfaceLibrariesOnly`
//! 3. two or more linkable libraries            -> `PrebuiltMultiComponent`
//! 4. exactly one linkable library              -> `PrebuiltSingleTarget`
//! 5. nothing installed, but a source tree      -> `SourceBuildable`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::artifact::ArtifactSet;
use crate::core::errors::GenerateError;

/// The shape in which a dependency is physically installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistributionMode {
    /// Headers only, nothing to link.
    HeaderOnly,

    /// One prebuilt library.
    PrebuiltSingleTarget,

    /// Several prebuilt libraries behind an umbrella target.
    PrebuiltMultiComponent,

    /// Interface descriptors only: flags and include paths, no binary.
    InterfaceLibrariesOnly,

    /// Nothing installed yet, a source tree with a build descriptor.
    SourceBuildable,
}

impl DistributionMode {
    /// All modes, in classification-rule order.
    pub const ALL: [DistributionMode; 5] = [
        DistributionMode::HeaderOnly,
        DistributionMode::InterfaceLibrariesOnly,
        DistributionMode::PrebuiltMultiComponent,
        DistributionMode::PrebuiltSingleTarget,
        DistributionMode::SourceBuildable,
    ];

    /// Stable kebab-case spelling, as accepted on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionMode::HeaderOnly => "header-only",
            DistributionMode::PrebuiltSingleTarget => "prebuilt-single-target",
            DistributionMode::PrebuiltMultiComponent => "prebuilt-multi-component",
            DistributionMode::InterfaceLibrariesOnly => "interface-libraries-only",
            DistributionMode::SourceBuildable => "source-buildable",
        }
    }

    /// Whether targets of this mode never carry a binary.
    pub fn is_binary_free(&self) -> bool {
        matches!(
            self,
            DistributionMode::HeaderOnly
                | DistributionMode::InterfaceLibrariesOnly
                | DistributionMode::SourceBuildable
        )
    }
}

impl fmt::Display for DistributionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistributionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "header-only" | "headers" => Ok(DistributionMode::HeaderOnly),
            "prebuilt-single-target" | "single" => Ok(DistributionMode::PrebuiltSingleTarget),
            "prebuilt-multi-component" | "components" => {
                Ok(DistributionMode::PrebuiltMultiComponent)
            }
            "interface-libraries-only" | "interface" => {
                Ok(DistributionMode::InterfaceLibrariesOnly)
            }
            "source-buildable" | "source" => Ok(DistributionMode::SourceBuildable),
            _ => Err(format!(
                "invalid mode '{}'; expected one of: {}",
                s,
                DistributionMode::ALL
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

/// Decide the distribution mode of an artifact set.
///
/// Pure: the result depends only on the contents of `set`, never on the
/// order in which the prober happened to discover them.
pub fn classify(set: &ArtifactSet) -> Result<DistributionMode, GenerateError> {
    let unclassifiable = |reason: String, artifacts: Vec<std::path::PathBuf>| {
        GenerateError::Unclassifiable {
            dependency: set.name().to_string(),
            reason,
            artifacts,
        }
    };

    let libraries = set
        .libraries()
        .map_err(|conflict| unclassifiable(conflict.to_string(), conflict.paths()))?;
    let markers: Vec<_> = set.interface_markers().collect();
    let has_headers = !set.header_roots().is_empty();

    // Rule 1
    if libraries.is_empty() && markers.is_empty() && has_headers {
        return Ok(DistributionMode::HeaderOnly);
    }

    // Rule 2
    if libraries.is_empty() && !markers.is_empty() {
        return Ok(DistributionMode::InterfaceLibrariesOnly);
    }

    // Rule 3
    if libraries.len() > 1 {
        return Ok(DistributionMode::PrebuiltMultiComponent);
    }

    // Rule 4
    if libraries.len() == 1 {
        if !markers.is_empty() {
            let mut artifacts = vec![libraries[0].primary().path.clone()];
            artifacts.extend(markers.iter().map(|m| m.path.clone()));
            return Err(unclassifiable(
                format!(
                    "one library (`{}`) found together with {} interface descriptor(s)",
                    libraries[0].name,
                    markers.len()
                ),
                artifacts,
            ));
        }
        return Ok(DistributionMode::PrebuiltSingleTarget);
    }

    // Rule 5
    if !set.source_trees().is_empty() {
        return Ok(DistributionMode::SourceBuildable);
    }

    Err(unclassifiable(
        "no classification rule matches the discovered artifacts".to_string(),
        set.all_paths(),
    ))
}
