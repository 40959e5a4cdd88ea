//! Machine-readable summary of a generated document.

use std::path::PathBuf;

use serde::Serialize;

use crate::core::mode::DistributionMode;
use crate::core::target::{BuildInstruction, LinkInput, TargetGraph, TargetKind, UsageRequirements};
use crate::emit::PublishedFile;

#[derive(Debug, Clone, Serialize)]
pub struct TargetMetadata {
    /// Qualified name (`FFmpeg::avcodec`)
    pub name: String,
    pub kind: TargetKind,
    pub include_dirs: Vec<PathBuf>,
    pub link: Vec<LinkInput>,
    #[serde(flatten)]
    pub usage: UsageRequirements,
    /// Qualified names of required targets
    pub dependencies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildInstruction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphMetadata {
    pub dependency: String,
    pub mode: DistributionMode,
    pub namespace: String,
    pub version: String,
    pub handle: String,
    pub components: Vec<String>,
    pub targets: Vec<TargetMetadata>,
    pub files: Vec<PublishedFile>,
}

impl GraphMetadata {
    pub fn new(graph: &TargetGraph, files: Vec<PublishedFile>) -> Self {
        let targets = graph
            .iter()
            .map(|(id, target)| TargetMetadata {
                name: graph.qualified_name(id),
                kind: target.kind,
                include_dirs: target.include_dirs.clone(),
                link: target.link.clone(),
                usage: target.usage.clone(),
                dependencies: target
                    .deps
                    .iter()
                    .map(|dep| graph.qualified_name(*dep))
                    .collect(),
                build: target.build.clone(),
            })
            .collect();

        GraphMetadata {
            dependency: graph.dependency().to_string(),
            mode: graph.mode(),
            namespace: graph.namespace().to_string(),
            version: graph.version().to_string(),
            handle: graph.qualified_name(graph.handle()),
            components: graph.components().into_iter().map(String::from).collect(),
            targets,
            files,
        }
    }

    /// Qualified names of every target, in document order.
    pub fn target_names(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self)
            .unwrap_or_else(|e| format!(r#"{{"error": "failed to serialize metadata: {}"}}"#, e))
    }
}
