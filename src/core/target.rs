//! Target graph - what gets declared for consumers.
//!
//! Targets live in a flat vector and refer to each other by [`TargetId`].
//! Edges point from a dependent to what it requires (umbrella -> component).

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use crate::core::artifact::BuildSystem;
use crate::core::mode::DistributionMode;

/// Stable index of a target inside its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TargetId(usize);

impl TargetId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// What a target declares itself as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Nothing to link: headers, flags or an umbrella
    Interface,
    /// Imported static archive
    Static,
    /// Imported shared library
    Shared,
    /// Placeholder for a library still to be built from source
    Source,
}

impl TargetKind {
    /// The library type keyword for an imported target.
    pub fn cmake_keyword(&self) -> &'static str {
        match self {
            TargetKind::Static => "STATIC",
            TargetKind::Shared => "SHARED",
            TargetKind::Interface | TargetKind::Source => "INTERFACE",
        }
    }
}

/// One library reference a target links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LinkInput {
    Static {
        path: PathBuf,
    },
    Shared {
        location: PathBuf,
        #[serde(skip_serializing_if = "Option::is_none")]
        soname: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        implib: Option<PathBuf>,
    },
}

impl LinkInput {
    /// The file a build system ends up reading.
    pub fn location(&self) -> &PathBuf {
        match self {
            LinkInput::Static { path } => path,
            LinkInput::Shared { location, .. } => location,
        }
    }
}

/// Usage requirements propagated to consumers beyond includes and links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsageRequirements {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub compile_definitions: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub compile_options: Vec<String>,

    /// Libraries outside the dependency (`m`, `pthread`)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub link_libraries: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub link_options: Vec<String>,
}

impl UsageRequirements {
    pub fn is_empty(&self) -> bool {
        self.compile_definitions.is_empty()
            && self.compile_options.is_empty()
            && self.link_libraries.is_empty()
            && self.link_options.is_empty()
    }

    /// Append `other`, skipping entries already present.
    pub fn merge(&mut self, other: &UsageRequirements) {
        extend_unique(&mut self.compile_definitions, &other.compile_definitions);
        extend_unique(&mut self.compile_options, &other.compile_options);
        extend_unique(&mut self.link_libraries, &other.link_libraries);
        extend_unique(&mut self.link_options, &other.link_options);
    }
}

fn extend_unique(into: &mut Vec<String>, from: &[String]) {
    for item in from {
        if !into.contains(item) {
            into.push(item.clone());
        }
    }
}

/// Pointer to a source tree that a later build step resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInstruction {
    pub source_dir: PathBuf,
    pub build_system: BuildSystem,
    pub descriptor: PathBuf,
}

/// A named node in the graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Target {
    /// Unqualified name (`avcodec`)
    pub name: String,

    pub kind: TargetKind,

    pub mode: DistributionMode,

    /// Ordered, never duplicated
    pub include_dirs: Vec<PathBuf>,

    pub link: Vec<LinkInput>,

    pub usage: UsageRequirements,

    #[serde(skip)]
    pub deps: Vec<TargetId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildInstruction>,
}

impl Target {
    pub fn new(name: impl Into<String>, kind: TargetKind, mode: DistributionMode) -> Self {
        Target {
            name: name.into(),
            kind,
            mode,
            include_dirs: Vec::new(),
            link: Vec::new(),
            usage: UsageRequirements::default(),
            deps: Vec::new(),
            build: None,
        }
    }

    /// Add an include directory unless it is already listed.
    pub fn add_include_dir(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        if !self.include_dirs.contains(&dir) {
            self.include_dirs.push(dir);
        }
    }

    pub fn with_include_dirs(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        for dir in dirs {
            self.add_include_dir(dir);
        }
        self
    }

    pub fn with_link(mut self, input: LinkInput) -> Self {
        self.link.push(input);
        self
    }

    pub fn with_usage(mut self, usage: UsageRequirements) -> Self {
        self.usage.merge(&usage);
        self
    }

    pub fn with_build(mut self, build: BuildInstruction) -> Self {
        self.build = Some(build);
        self
    }
}

/// Graph shape violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    DanglingEdge { from: String, to: usize },
    Cycle { members: Vec<String> },
    DuplicateName(String),
    Empty,
    HeaderOnlyShape(String),
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::DanglingEdge { from, to } => {
                write!(f, "target `{}` depends on unknown target #{}", from, to)
            }
            GraphError::Cycle { members } => {
                write!(f, "dependency cycle: {}", members.join(" -> "))
            }
            GraphError::DuplicateName(name) => write!(f, "target `{}` declared twice", name),
            GraphError::Empty => write!(f, "no targets"),
            GraphError::HeaderOnlyShape(reason) => {
                write!(f, "header-only dependency must be one target without links: {}", reason)
            }
        }
    }
}

/// The targets of one dependency plus their edges.
#[derive(Debug, Clone)]
pub struct TargetGraph {
    dependency: String,
    namespace: String,
    version: String,
    mode: DistributionMode,
    targets: Vec<Target>,
    handle: Option<TargetId>,
    prefixes: Vec<PathBuf>,
    pointer_width: Option<u8>,
}

impl TargetGraph {
    pub fn new(
        dependency: impl Into<String>,
        namespace: impl Into<String>,
        version: impl Into<String>,
        mode: DistributionMode,
    ) -> Self {
        TargetGraph {
            dependency: dependency.into(),
            namespace: namespace.into(),
            version: version.into(),
            mode,
            targets: Vec::new(),
            handle: None,
            prefixes: Vec::new(),
            pointer_width: None,
        }
    }

    /// Record the installation roots the targets' paths live under.
    pub fn with_prefixes(mut self, prefixes: Vec<PathBuf>) -> Self {
        self.prefixes = prefixes;
        self
    }

    /// Record the pointer width the prebuilt binaries were built for.
    pub fn with_pointer_width(mut self, width: Option<u8>) -> Self {
        self.pointer_width = width;
        self
    }

    /// Add a target, returning its id. Ids follow insertion order.
    pub fn add_target(&mut self, target: Target) -> TargetId {
        self.targets.push(target);
        TargetId(self.targets.len() - 1)
    }

    /// Declare that `from` requires `to`.
    pub fn add_edge(&mut self, from: TargetId, to: TargetId) {
        if let Some(target) = self.targets.get_mut(from.0) {
            if !target.deps.contains(&to) {
                target.deps.push(to);
            }
        }
    }

    /// Mark the target consumers reference.
    pub fn set_handle(&mut self, id: TargetId) {
        self.handle = Some(id);
    }

    pub fn dependency(&self) -> &str {
        &self.dependency
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn mode(&self) -> DistributionMode {
        self.mode
    }

    pub fn prefixes(&self) -> &[PathBuf] {
        &self.prefixes
    }

    pub fn pointer_width(&self) -> Option<u8> {
        self.pointer_width
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn get(&self, id: TargetId) -> Option<&Target> {
        self.targets.get(id.0)
    }

    /// Targets with their ids, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (TargetId, &Target)> {
        self.targets.iter().enumerate().map(|(i, t)| (TargetId(i), t))
    }

    pub fn find(&self, name: &str) -> Option<TargetId> {
        self.targets
            .iter()
            .position(|t| t.name == name)
            .map(TargetId)
    }

    /// The handle target, defaulting to the last one added.
    pub fn handle(&self) -> TargetId {
        self.handle
            .unwrap_or_else(|| TargetId(self.targets.len().saturating_sub(1)))
    }

    /// `<namespace>::<name>` for a target.
    pub fn qualified_name(&self, id: TargetId) -> String {
        let name = self.get(id).map(|t| t.name.as_str()).unwrap_or("<unknown>");
        format!("{}::{}", self.namespace, name)
    }

    /// All qualified names, in insertion order.
    pub fn qualified_names(&self) -> Vec<String> {
        self.iter().map(|(id, _)| self.qualified_name(id)).collect()
    }

    /// Non-handle targets a consumer may ask for as components.
    pub fn components(&self) -> Vec<&str> {
        let handle = self.handle();
        self.iter()
            .filter(|(id, _)| *id != handle)
            .map(|(_, t)| t.name.as_str())
            .collect()
    }

    fn to_petgraph(&self) -> (DiGraph<TargetId, ()>, Vec<NodeIndex>) {
        let mut graph = DiGraph::new();
        let nodes: Vec<NodeIndex> = self.iter().map(|(id, _)| graph.add_node(id)).collect();
        for (id, target) in self.iter() {
            for dep in &target.deps {
                if let Some(&to) = nodes.get(dep.0) {
                    graph.add_edge(nodes[id.0], to, ());
                }
            }
        }
        (graph, nodes)
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.targets.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut seen: HashMap<&str, TargetId> = HashMap::new();
        for (id, target) in self.iter() {
            if seen.insert(target.name.as_str(), id).is_some() {
                return Err(GraphError::DuplicateName(target.name.clone()));
            }
            for dep in &target.deps {
                if dep.0 >= self.targets.len() {
                    return Err(GraphError::DanglingEdge {
                        from: target.name.clone(),
                        to: dep.0,
                    });
                }
            }
        }

        let (graph, _) = self.to_petgraph();
        if toposort(&graph, None).is_err() {
            let members = tarjan_scc(&graph)
                .into_iter()
                .find(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
                .map(|scc| {
                    let mut ids: Vec<TargetId> = scc.iter().map(|n| graph[*n]).collect();
                    ids.sort();
                    let mut names: Vec<String> =
                        ids.iter().map(|id| self.targets[id.0].name.clone()).collect();
                    names.push(names[0].clone());
                    names
                })
                .unwrap_or_default();
            return Err(GraphError::Cycle { members });
        }

        if self.mode == DistributionMode::HeaderOnly {
            if self.targets.len() != 1 {
                return Err(GraphError::HeaderOnlyShape(format!(
                    "{} targets",
                    self.targets.len()
                )));
            }
            if !self.targets[0].link.is_empty() {
                return Err(GraphError::HeaderOnlyShape(
                    "target has link inputs".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Ids ordered so that every target comes after what it requires.
    pub fn topological_order(&self) -> Vec<TargetId> {
        let (graph, _) = self.to_petgraph();
        match toposort(&graph, None) {
            Ok(order) => order.into_iter().rev().map(|n| graph[n]).collect(),
            Err(_) => self.iter().map(|(id, _)| id).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(names: &[&str]) -> (TargetGraph, Vec<TargetId>) {
        let mut graph = TargetGraph::new(
            "ffmpeg",
            "FFmpeg",
            "5.1.6",
            DistributionMode::PrebuiltMultiComponent,
        );
        let ids = names
            .iter()
            .map(|n| {
                graph.add_target(Target::new(
                    *n,
                    TargetKind::Shared,
                    DistributionMode::PrebuiltMultiComponent,
                ))
            })
            .collect();
        (graph, ids)
    }

    #[test]
    fn test_include_dirs_are_deduplicated() {
        let target = Target::new("eigen", TargetKind::Interface, DistributionMode::HeaderOnly)
            .with_include_dirs([
                PathBuf::from("/opt/eigen/include"),
                PathBuf::from("/opt/eigen/include/eigen3"),
                PathBuf::from("/opt/eigen/include"),
            ]);
        assert_eq!(target.include_dirs.len(), 2);
        assert_eq!(target.include_dirs[0], PathBuf::from("/opt/eigen/include"));
    }

    #[test]
    fn test_valid_graph() {
        let (mut graph, ids) = graph_with(&["avutil", "avcodec", "ffmpeg"]);
        graph.add_edge(ids[1], ids[0]);
        graph.add_edge(ids[2], ids[0]);
        graph.add_edge(ids[2], ids[1]);
        graph.set_handle(ids[2]);

        assert!(graph.validate().is_ok());
        assert_eq!(graph.qualified_name(graph.handle()), "FFmpeg::ffmpeg");
        assert_eq!(graph.components(), vec!["avutil", "avcodec"]);

        let order = graph.topological_order();
        let pos = |id: TargetId| order.iter().position(|x| *x == id).unwrap();
        assert!(pos(ids[0]) < pos(ids[1]));
        assert!(pos(ids[1]) < pos(ids[2]));
    }

    #[test]
    fn test_cycle_is_reported_with_members() {
        let (mut graph, ids) = graph_with(&["a", "b", "c"]);
        graph.add_edge(ids[0], ids[1]);
        graph.add_edge(ids[1], ids[0]);

        match graph.validate() {
            Err(GraphError::Cycle { members }) => {
                assert_eq!(members, vec!["a", "b", "a"]);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_self_edge_is_a_cycle() {
        let (mut graph, ids) = graph_with(&["a"]);
        graph.add_edge(ids[0], ids[0]);
        assert!(matches!(graph.validate(), Err(GraphError::Cycle { .. })));
    }

    #[test]
    fn test_dangling_edge() {
        let (mut graph, ids) = graph_with(&["a"]);
        graph.add_edge(ids[0], TargetId(7));
        assert!(matches!(
            graph.validate(),
            Err(GraphError::DanglingEdge { to: 7, .. })
        ));
    }

    #[test]
    fn test_duplicate_names() {
        let (graph, _) = graph_with(&["a", "a"]);
        assert_eq!(
            graph.validate(),
            Err(GraphError::DuplicateName("a".to_string()))
        );
    }

    #[test]
    fn test_header_only_shape() {
        let mut graph = TargetGraph::new("eigen", "Eigen3", "3.4.0", DistributionMode::HeaderOnly);
        graph.add_target(
            Target::new("eigen", TargetKind::Interface, DistributionMode::HeaderOnly).with_link(
                LinkInput::Static {
                    path: PathBuf::from("/x/libeigen.a"),
                },
            ),
        );
        assert!(matches!(
            graph.validate(),
            Err(GraphError::HeaderOnlyShape(_))
        ));
    }
}
