//! Target model builder.
//!
//! Turns a classified [`ArtifactSet`] into a [`TargetGraph`]. Pure: all
//! filesystem facts were gathered by the prober, apart from resolving the
//! `-I` directories descriptors mention.

use std::path::PathBuf;

use crate::builder::usage::{self, DescriptorUsage};
use crate::core::artifact::{ArtifactSet, BinaryArtifact, BinaryKind, LibraryGroup, Linkage};
use crate::core::errors::{GenerateError, Stage};
use crate::core::mode::DistributionMode;
use crate::core::target::{
    BuildInstruction, GraphError, LinkInput, Target, TargetGraph, TargetId, TargetKind,
};
use crate::core::version::resolve_version;
use crate::sources::pkgconfig::strip_lib_prefix;

/// Umbrella name used when a component already took the dependency name.
pub const COLLISION_UMBRELLA: &str = "components";

/// Caller choices for the model.
#[derive(Debug, Clone, Default)]
pub struct ModelOptions {
    /// Overrides the hints file and the dependency name
    pub namespace: Option<String>,
    /// Overrides the hints file and pkg-config metadata
    pub version: Option<String>,
    /// Used when nothing declares a valid version
    pub default_version: Option<String>,
    pub linkage: Linkage,
}

/// Build the target graph for `set` in the given mode.
pub fn build(
    set: &ArtifactSet,
    mode: DistributionMode,
    options: &ModelOptions,
) -> Result<TargetGraph, GenerateError> {
    let ctx = Context { set, mode, options };

    let namespace = ctx.namespace()?;
    let version = resolve_version(
        [
            options.version.as_deref(),
            set.hints().version.as_deref(),
            set.metadata_version(),
        ],
        options.default_version.as_deref(),
    );

    let pointer_width = if mode.is_binary_free() {
        None
    } else {
        ctx.pointer_width(&ctx.libraries()?)
    };

    let mut graph = TargetGraph::new(set.name(), namespace, version, mode)
        .with_prefixes(set.roots().to_vec())
        .with_pointer_width(pointer_width);

    match mode {
        DistributionMode::HeaderOnly => ctx.header_only(&mut graph)?,
        DistributionMode::PrebuiltSingleTarget => ctx.single_target(&mut graph)?,
        DistributionMode::PrebuiltMultiComponent => ctx.multi_component(&mut graph)?,
        DistributionMode::InterfaceLibrariesOnly => ctx.interface_only(&mut graph)?,
        DistributionMode::SourceBuildable => ctx.source_buildable(&mut graph)?,
    }

    graph.validate().map_err(|e| ctx.graph_error(e))?;

    tracing::info!(
        "built {} target(s) for `{}` as {} (handle {})",
        graph.len(),
        set.name(),
        mode,
        graph.qualified_name(graph.handle())
    );
    Ok(graph)
}

struct Context<'a> {
    set: &'a ArtifactSet,
    mode: DistributionMode,
    options: &'a ModelOptions,
}

impl<'a> Context<'a> {
    fn invalid(&self, reason: String, artifact: Option<PathBuf>) -> GenerateError {
        GenerateError::InvalidArtifact {
            dependency: self.set.name().to_string(),
            stage: Stage::Build,
            reason,
            artifact,
        }
    }

    fn graph_error(&self, err: GraphError) -> GenerateError {
        self.invalid(err.to_string(), self.set.hints().source.clone())
    }

    fn namespace(&self) -> Result<String, GenerateError> {
        let namespace = self
            .options
            .namespace
            .as_deref()
            .or(self.set.hints().namespace.as_deref())
            .unwrap_or(self.set.name());

        let valid = !namespace.is_empty()
            && namespace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+'));
        if !valid {
            return Err(self.invalid(
                format!("`{}` is not a usable namespace", namespace),
                self.set.hints().source.clone(),
            ));
        }
        Ok(namespace.to_string())
    }

    fn libraries(&self) -> Result<Vec<LibraryGroup<'a>>, GenerateError> {
        self.set.libraries().map_err(|conflict| GenerateError::Unclassifiable {
            dependency: self.set.name().to_string(),
            reason: conflict.to_string(),
            artifacts: conflict.paths(),
        })
    }

    fn is_internal(&self, name: &str) -> bool {
        self.set
            .binaries()
            .iter()
            .any(|b| b.kind.is_linkable() && b.name == name)
    }

    fn all_header_dirs(&self) -> Vec<PathBuf> {
        self.set
            .header_roots()
            .iter()
            .map(|h| h.path.clone())
            .collect()
    }

    /// Header roots serving `component`, or all of them if none does.
    fn header_dirs_for(&self, component: &str) -> Vec<PathBuf> {
        let serving: Vec<PathBuf> = self
            .set
            .header_roots()
            .iter()
            .filter(|h| h.serves(component))
            .map(|h| h.path.clone())
            .collect();
        if serving.is_empty() {
            self.all_header_dirs()
        } else {
            serving
        }
    }

    fn descriptor_usage(&self, artifact: &BinaryArtifact) -> DescriptorUsage {
        match &artifact.metadata {
            Some(pc) => usage::from_descriptor(pc, artifact.kind, |n| self.is_internal(n)),
            None => DescriptorUsage::default(),
        }
    }

    fn library_target(&self, name: &str, group: &LibraryGroup<'_>) -> Target {
        let artifact = group.select(self.options.linkage);
        let (kind, link) = match artifact.kind {
            BinaryKind::Static => (
                TargetKind::Static,
                LinkInput::Static {
                    path: artifact.path.clone(),
                },
            ),
            _ => (
                TargetKind::Shared,
                LinkInput::Shared {
                    location: artifact.path.clone(),
                    soname: artifact.soname.clone(),
                    implib: artifact.import_lib.clone(),
                },
            ),
        };

        let described = self.descriptor_usage(artifact);
        Target::new(name, kind, self.mode)
            .with_include_dirs(self.header_dirs_for(group.name))
            .with_include_dirs(described.include_dirs)
            .with_link(link)
            .with_usage(described.usage)
    }

    fn pointer_width(&self, groups: &[LibraryGroup<'_>]) -> Option<u8> {
        groups
            .iter()
            .find_map(|g| g.select(self.options.linkage).pointer_width)
    }

    /// Fails unless the set holds exactly the artifacts `self.mode` describes.
    fn require_shape(&self, libraries: usize) -> Result<(), GenerateError> {
        let markers = self.set.interface_markers().count();
        let headers = self.set.header_roots().len();
        let problem = match self.mode {
            DistributionMode::HeaderOnly if headers == 0 => Some("no header roots".to_string()),
            DistributionMode::HeaderOnly if libraries + markers > 0 => Some(format!(
                "{} libraries and {} interface descriptor(s) next to the headers",
                libraries, markers
            )),
            DistributionMode::PrebuiltSingleTarget if libraries != 1 => {
                Some(format!("{} libraries found, expected exactly one", libraries))
            }
            DistributionMode::PrebuiltSingleTarget if markers > 0 => Some(format!(
                "{} interface descriptor(s) next to the library",
                markers
            )),
            DistributionMode::PrebuiltMultiComponent if libraries < 2 => Some(format!(
                "{} discovered component(s), expected at least two",
                libraries
            )),
            DistributionMode::InterfaceLibrariesOnly if markers == 0 => {
                Some("no interface descriptors".to_string())
            }
            DistributionMode::InterfaceLibrariesOnly if libraries > 0 => Some(format!(
                "{} libraries next to the interface descriptors",
                libraries
            )),
            _ => None,
        };
        match problem {
            Some(problem) => Err(self.invalid(
                format!("{} for {}", problem, self.mode),
                self.set.roots().first().cloned(),
            )),
            None => Ok(()),
        }
    }

    fn header_only(&self, graph: &mut TargetGraph) -> Result<(), GenerateError> {
        self.require_shape(self.libraries()?.len())?;
        let mut target = Target::new(self.set.name(), TargetKind::Interface, self.mode)
            .with_include_dirs(self.all_header_dirs());
        for pc in self.set.loose_metadata() {
            let described = usage::from_descriptor(pc, BinaryKind::Interface, |_| false);
            target = target.with_include_dirs(described.include_dirs);
        }
        let id = graph.add_target(target);
        graph.set_handle(id);
        Ok(())
    }

    fn single_target(&self, graph: &mut TargetGraph) -> Result<(), GenerateError> {
        let groups = self.libraries()?;
        self.require_shape(groups.len())?;
        let [group] = groups.as_slice() else {
            return Err(self.invalid("no library to describe".to_string(), None));
        };

        let id = graph.add_target(self.library_target(self.set.name(), group));
        graph.set_handle(id);
        Ok(())
    }

    fn multi_component(&self, graph: &mut TargetGraph) -> Result<(), GenerateError> {
        let mut groups = self.libraries()?;
        self.require_shape(groups.len())?;
        groups.sort_by(|a, b| a.name.cmp(b.name));

        let ids: Vec<(String, TargetId)> = groups
            .iter()
            .map(|g| {
                let id = graph.add_target(self.library_target(g.name, g));
                (g.name.to_string(), id)
            })
            .collect();

        let requires: Vec<(String, Vec<String>)> = groups
            .iter()
            .map(|g| (g.name.to_string(), descriptor_requires(g.primary())))
            .collect();
        self.add_edges(graph, &ids, &requires)?;
        self.add_umbrella(graph, &ids);
        Ok(())
    }

    fn interface_only(&self, graph: &mut TargetGraph) -> Result<(), GenerateError> {
        self.require_shape(self.libraries()?.len())?;
        let mut markers: Vec<&BinaryArtifact> = self.set.interface_markers().collect();
        markers.sort_by(|a, b| a.name.cmp(&b.name));

        let ids: Vec<(String, TargetId)> = markers
            .iter()
            .map(|marker| {
                let described = self.descriptor_usage(marker);
                let target = Target::new(&marker.name, TargetKind::Interface, self.mode)
                    .with_include_dirs(described.include_dirs)
                    .with_include_dirs(self.all_header_dirs())
                    .with_usage(described.usage);
                (marker.name.clone(), graph.add_target(target))
            })
            .collect();

        let requires: Vec<(String, Vec<String>)> = markers
            .iter()
            .map(|m| (m.name.clone(), descriptor_requires(m)))
            .collect();
        self.add_edges(graph, &ids, &requires)?;

        match ids.as_slice() {
            [(name, id)] if name == self.set.name() => graph.set_handle(*id),
            _ => self.add_umbrella(graph, &ids),
        }
        Ok(())
    }

    fn source_buildable(&self, graph: &mut TargetGraph) -> Result<(), GenerateError> {
        let trees = self.set.source_trees();
        let tree = trees
            .first()
            .ok_or_else(|| self.invalid("no source tree".to_string(), None))?;
        if trees.len() > 1 {
            tracing::warn!(
                "`{}` has {} source trees, using {}",
                self.set.name(),
                trees.len(),
                tree.root.display()
            );
        }

        let target = Target::new(self.set.name(), TargetKind::Source, self.mode).with_build(
            BuildInstruction {
                source_dir: tree.root.clone(),
                build_system: tree.build_system,
                descriptor: tree.descriptor.clone(),
            },
        );
        let id = graph.add_target(target);
        graph.set_handle(id);
        Ok(())
    }

    /// Component edges from descriptor `Requires` and the hints file.
    fn add_edges(
        &self,
        graph: &mut TargetGraph,
        ids: &[(String, TargetId)],
        requires: &[(String, Vec<String>)],
    ) -> Result<(), GenerateError> {
        let lookup = |name: &str| ids.iter().find(|(n, _)| n == name).map(|(_, id)| *id);

        for (component, modules) in requires {
            let Some(from) = lookup(component) else { continue };
            for module in modules {
                match lookup(strip_lib_prefix(module)).or_else(|| lookup(module)) {
                    Some(to) => graph.add_edge(from, to),
                    None => tracing::debug!(
                        "`{}` requires `{}`, which is not part of `{}`",
                        component,
                        module,
                        self.set.name()
                    ),
                }
            }
        }

        let hints = self.set.hints();
        for hint in &hints.components {
            let from = lookup(&hint.name).ok_or_else(|| {
                self.invalid(
                    format!("hints name unknown component `{}`", hint.name),
                    hints.source.clone(),
                )
            })?;
            for dep in &hint.dependencies {
                let to = lookup(dep).ok_or_else(|| {
                    self.invalid(
                        format!("component `{}` depends on unknown component `{}`", hint.name, dep),
                        hints.source.clone(),
                    )
                })?;
                graph.add_edge(from, to);
            }
        }

        Ok(())
    }

    fn add_umbrella(&self, graph: &mut TargetGraph, ids: &[(String, TargetId)]) {
        let name = if ids.iter().any(|(n, _)| n == self.set.name()) {
            COLLISION_UMBRELLA
        } else {
            self.set.name()
        };

        let umbrella = graph.add_target(Target::new(name, TargetKind::Interface, self.mode));
        for (_, id) in ids {
            graph.add_edge(umbrella, *id);
        }
        graph.set_handle(umbrella);
    }
}

fn descriptor_requires(artifact: &BinaryArtifact) -> Vec<String> {
    artifact
        .metadata
        .as_ref()
        .map(|pc| {
            pc.requires
                .iter()
                .chain(&pc.requires_private)
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::artifact::{BuildSystem, HeaderRoot, SourceTree};
    use crate::core::mode::classify;
    use crate::sources::hints::{ComponentHint, Hints};
    use crate::sources::probe::Prober;
    use crate::test_support;

    fn probe_and_build(name: &str, tree: &tempfile::TempDir) -> TargetGraph {
        let set = Prober::default()
            .probe(name, &[tree.path().to_path_buf()])
            .unwrap();
        let mode = classify(&set).unwrap();
        build(&set, mode, &ModelOptions::default()).unwrap()
    }

    fn shared(name: &str) -> BinaryArtifact {
        BinaryArtifact::new(name, BinaryKind::Shared, format!("/opt/d/lib/lib{}.so.1", name))
    }

    #[test]
    fn test_header_only_model() {
        let tree = test_support::eigen();
        let graph = probe_and_build("eigen", &tree);

        assert_eq!(graph.len(), 1);
        assert_eq!(graph.qualified_name(graph.handle()), "eigen::eigen");
        assert_eq!(graph.version(), "3.4.0");

        let target = graph.get(graph.handle()).unwrap();
        assert_eq!(target.kind, TargetKind::Interface);
        assert!(target.link.is_empty());
        assert_eq!(target.include_dirs.len(), 2);
        assert!(target.include_dirs[0].ends_with("include"));
        assert!(target.include_dirs[1].ends_with("include/eigen3"));
    }

    #[test]
    fn test_single_target_model() {
        let tree = test_support::x264();
        let graph = probe_and_build("x264", &tree);

        assert_eq!(graph.len(), 1);
        assert_eq!(graph.qualified_name(graph.handle()), "x264::x264");
        assert_eq!(graph.version(), "0.164.3095");
        assert_eq!(graph.pointer_width(), Some(64));

        let target = graph.get(graph.handle()).unwrap();
        assert_eq!(target.kind, TargetKind::Shared);
        match &target.link[0] {
            LinkInput::Shared { location, soname, .. } => {
                assert!(location.ends_with("libx264.so.164"));
                assert_eq!(soname.as_deref(), Some("libx264.so.164"));
            }
            other => panic!("unexpected link input: {:?}", other),
        }
        // shared variant: Libs.private is not propagated
        assert!(target.usage.link_libraries.is_empty());
    }

    #[test]
    fn test_multi_component_model() {
        let tree = test_support::ffmpeg_components();
        let graph = probe_and_build("ffmpeg", &tree);

        assert_eq!(graph.namespace(), "FFmpeg");
        assert_eq!(graph.version(), "5.1.6");
        assert_eq!(
            graph.qualified_names(),
            vec![
                "FFmpeg::avcodec",
                "FFmpeg::avformat",
                "FFmpeg::avutil",
                "FFmpeg::swresample",
                "FFmpeg::swscale",
                "FFmpeg::ffmpeg",
            ]
        );
        assert_eq!(graph.qualified_name(graph.handle()), "FFmpeg::ffmpeg");

        let dep_names = |name: &str| -> Vec<String> {
            let id = graph.find(name).unwrap();
            graph
                .get(id)
                .unwrap()
                .deps
                .iter()
                .map(|d| graph.get(*d).unwrap().name.clone())
                .collect()
        };
        assert_eq!(dep_names("avformat"), vec!["avcodec", "avutil"]);
        assert_eq!(dep_names("avcodec"), vec!["swresample", "avutil"]);
        assert_eq!(dep_names("ffmpeg").len(), 5);

        let avcodec = graph.get(graph.find("avcodec").unwrap()).unwrap();
        assert_eq!(avcodec.include_dirs.len(), 1);
        assert!(avcodec.usage.link_libraries.is_empty());
    }

    #[test]
    fn test_interface_only_model() {
        let tree = test_support::ffmpeg_interface();
        let graph = probe_and_build("ffmpeg", &tree);

        assert_eq!(
            graph.qualified_names(),
            vec![
                "ffmpeg::avcodec",
                "ffmpeg::avformat",
                "ffmpeg::avutil",
                "ffmpeg::ffmpeg"
            ]
        );
        for (_, target) in graph.iter() {
            assert_eq!(target.kind, TargetKind::Interface);
            assert!(target.link.is_empty());
        }

        let avcodec = graph.get(graph.find("avcodec").unwrap()).unwrap();
        assert_eq!(avcodec.usage.link_libraries, vec!["avcodec"]);
        assert_eq!(avcodec.usage.compile_definitions, vec!["__STDC_CONSTANT_MACROS"]);
        // own -I (include/) and the header root (include/) collapse
        assert_eq!(avcodec.include_dirs.len(), 1);
    }

    #[test]
    fn test_single_marker_named_like_dependency_is_handle() {
        let marker = BinaryArtifact::new("gl", BinaryKind::Interface, "/usr/lib/pkgconfig/gl.pc");
        let set = ArtifactSet::builder("gl").binary(marker).build();

        let graph = build(
            &set,
            DistributionMode::InterfaceLibrariesOnly,
            &ModelOptions::default(),
        )
        .unwrap();
        assert_eq!(graph.qualified_names(), vec!["gl::gl"]);
    }

    #[test]
    fn test_umbrella_name_collision() {
        let set = ArtifactSet::builder("x264")
            .binary(shared("x264"))
            .binary(shared("x264-extra"))
            .build();

        let graph = build(
            &set,
            DistributionMode::PrebuiltMultiComponent,
            &ModelOptions::default(),
        )
        .unwrap();
        assert_eq!(
            graph.qualified_name(graph.handle()),
            format!("x264::{}", COLLISION_UMBRELLA)
        );
        assert!(graph.find("x264").is_some());
    }

    #[test]
    fn test_source_model() {
        let set = ArtifactSet::builder("yaml-cpp")
            .source_tree(SourceTree::new(
                "/src/yaml-cpp",
                BuildSystem::CMake,
                "/src/yaml-cpp/CMakeLists.txt",
            ))
            .build();

        let graph = build(&set, DistributionMode::SourceBuildable, &ModelOptions::default())
            .unwrap();
        let target = graph.get(graph.handle()).unwrap();
        assert_eq!(target.kind, TargetKind::Source);
        assert!(target.include_dirs.is_empty());
        assert!(target.link.is_empty());
        assert_eq!(
            target.build.as_ref().unwrap().descriptor,
            PathBuf::from("/src/yaml-cpp/CMakeLists.txt")
        );
        assert_eq!(graph.version(), "0.0.1");
    }

    fn assert_invalid(set: &ArtifactSet, mode: DistributionMode, needle: &str) {
        match build(set, mode, &ModelOptions::default()) {
            Err(GenerateError::InvalidArtifact { reason, .. }) => {
                assert!(reason.contains(needle), "{}: {}", mode, reason)
            }
            other => panic!("{}: expected InvalidArtifact, got {:?}", mode, other.map(|g| g.qualified_names())),
        }
    }

    #[test]
    fn test_mode_without_its_artifacts_is_invalid() {
        let headers = ArtifactSet::builder("ffmpeg")
            .root("/opt/ffmpeg")
            .header_root(HeaderRoot::new("/opt/ffmpeg/include", vec![]))
            .build();
        assert_invalid(&headers, DistributionMode::PrebuiltMultiComponent, "0 discovered component(s)");
        assert_invalid(&headers, DistributionMode::InterfaceLibrariesOnly, "no interface descriptors");
        assert_invalid(&headers, DistributionMode::PrebuiltSingleTarget, "0 libraries found");
        assert_invalid(&headers, DistributionMode::SourceBuildable, "no source tree");

        let one = ArtifactSet::builder("z").binary(shared("z")).build();
        assert_invalid(&one, DistributionMode::PrebuiltMultiComponent, "1 discovered component(s)");
        assert_invalid(&one, DistributionMode::HeaderOnly, "no header roots");
    }

    #[test]
    fn test_single_target_rejects_extra_libraries() {
        let set = ArtifactSet::builder("dep")
            .binary(shared("a"))
            .binary(shared("b"))
            .build();
        assert_invalid(&set, DistributionMode::PrebuiltSingleTarget, "2 libraries found");
    }

    #[test]
    fn test_binary_free_modes_reject_libraries() {
        let set = ArtifactSet::builder("gl")
            .header_root(HeaderRoot::new("/usr/include", vec![]))
            .binary(shared("gl"))
            .binary(BinaryArtifact::new("glx", BinaryKind::Interface, "/usr/lib/pkgconfig/glx.pc"))
            .build();
        assert_invalid(&set, DistributionMode::HeaderOnly, "1 libraries and 1 interface descriptor(s)");
        assert_invalid(&set, DistributionMode::InterfaceLibrariesOnly, "1 libraries next to");
        assert_invalid(&set, DistributionMode::PrebuiltSingleTarget, "interface descriptor(s) next to the library");
    }

    #[test]
    fn test_hint_cycle_is_invalid_artifact() {
        let hints = Hints {
            components: vec![
                ComponentHint {
                    name: "a".into(),
                    dependencies: vec!["b".into()],
                },
                ComponentHint {
                    name: "b".into(),
                    dependencies: vec!["a".into()],
                },
            ],
            ..Hints::default()
        };
        let set = ArtifactSet::builder("dep")
            .binary(shared("a"))
            .binary(shared("b"))
            .hints(hints)
            .build();

        let err = build(
            &set,
            DistributionMode::PrebuiltMultiComponent,
            &ModelOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.stage(), Stage::Build);
        assert!(err.to_string().contains("dependency cycle: a -> b -> a"));
    }

    #[test]
    fn test_unknown_hint_component() {
        let hints = Hints {
            components: vec![ComponentHint {
                name: "a".into(),
                dependencies: vec!["zz".into()],
            }],
            ..Hints::default()
        };
        let set = ArtifactSet::builder("dep")
            .binary(shared("a"))
            .binary(shared("b"))
            .hints(hints)
            .build();

        let err = build(
            &set,
            DistributionMode::PrebuiltMultiComponent,
            &ModelOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GenerateError::InvalidArtifact { .. }));
        assert!(err.to_string().contains("unknown component `zz`"));
    }

    #[test]
    fn test_static_preference() {
        let set = ArtifactSet::builder("z")
            .header_root(HeaderRoot::new("/opt/z/include", vec![]))
            .binary(BinaryArtifact::new("z", BinaryKind::Static, "/opt/z/lib/libz.a"))
            .binary(shared("z"))
            .build();

        let options = ModelOptions {
            linkage: Linkage::Static,
            ..ModelOptions::default()
        };
        let graph = build(&set, DistributionMode::PrebuiltSingleTarget, &options).unwrap();
        assert_eq!(graph.get(graph.handle()).unwrap().kind, TargetKind::Static);
    }

    #[test]
    fn test_caller_overrides() {
        let set = ArtifactSet::builder("z")
            .header_root(HeaderRoot::new("/opt/z/include", vec![]))
            .hints(Hints {
                namespace: Some("ZLIB".into()),
                version: Some("1.3".into()),
                ..Hints::default()
            })
            .build();

        let options = ModelOptions {
            namespace: Some("Zed".into()),
            version: Some("2.0".into()),
            ..ModelOptions::default()
        };
        let graph = build(&set, DistributionMode::HeaderOnly, &options).unwrap();
        assert_eq!(graph.namespace(), "Zed");
        assert_eq!(graph.version(), "2.0");

        let graph = build(&set, DistributionMode::HeaderOnly, &ModelOptions::default()).unwrap();
        assert_eq!(graph.namespace(), "ZLIB");
        assert_eq!(graph.version(), "1.3");
    }

    #[test]
    fn test_invalid_namespace() {
        let set = ArtifactSet::builder("z")
            .header_root(HeaderRoot::new("/opt/z/include", vec![]))
            .build();
        let options = ModelOptions {
            namespace: Some("bad name".into()),
            ..ModelOptions::default()
        };
        assert!(matches!(
            build(&set, DistributionMode::HeaderOnly, &options),
            Err(GenerateError::InvalidArtifact { .. })
        ));
    }
}
