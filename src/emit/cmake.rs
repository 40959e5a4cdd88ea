//! CMake package configuration text.
//!
//! Everything here is a pure function of the graph and the destination, so
//! emitting twice yields the same bytes.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::core::target::{LinkInput, Target, TargetGraph};
use crate::core::version::numeric_part;
use crate::util::fs::{relative_path, to_forward_slashes};

const IMPORT_PREFIX: &str = "_IMPORT_PREFIX";

/// How paths are written into the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStyle {
    /// Absolute paths with forward slashes
    Absolute,
    /// Relative to `root`, located from the config file itself. `depth` is
    /// how many directories the destination lies below `root`.
    Relocatable { root: PathBuf, depth: usize },
}

impl PathStyle {
    /// Relocatable when `destination` and every path the graph refers to
    /// live under one installation root.
    pub fn select(graph: &TargetGraph, destination: &Path, relocatable: bool) -> PathStyle {
        if !relocatable {
            return PathStyle::Absolute;
        }

        let referenced = referenced_paths(graph);
        graph
            .prefixes()
            .iter()
            .find(|root| {
                destination.starts_with(root) && referenced.iter().all(|p| p.starts_with(root))
            })
            .map(|root| PathStyle::Relocatable {
                root: root.clone(),
                depth: relative_path(root, destination).components().count(),
            })
            .unwrap_or(PathStyle::Absolute)
    }

    fn render(&self, path: &Path) -> String {
        match self {
            PathStyle::Absolute => escape(&to_forward_slashes(path)),
            PathStyle::Relocatable { root, .. } => {
                let rel = to_forward_slashes(&relative_path(root, path));
                if rel.is_empty() {
                    format!("${{{}}}", IMPORT_PREFIX)
                } else {
                    format!("${{{}}}/{}", IMPORT_PREFIX, escape(&rel))
                }
            }
        }
    }
}

fn referenced_paths(graph: &TargetGraph) -> Vec<&Path> {
    let mut paths: Vec<&Path> = Vec::new();
    for (_, target) in graph.iter() {
        paths.extend(target.include_dirs.iter().map(|p| p.as_path()));
        for input in &target.link {
            paths.push(input.location());
            if let LinkInput::Shared {
                implib: Some(implib),
                ..
            } = input
            {
                paths.push(implib);
            }
        }
        if let Some(build) = &target.build {
            paths.push(&build.source_dir);
            paths.push(&build.descriptor);
        }
    }
    paths
}

/// Escape a value for a quoted CMake argument.
fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$")
        .replace(';', "\\;")
}

fn join(items: impl IntoIterator<Item = String>) -> String {
    items.into_iter().collect::<Vec<_>>().join(";")
}

/// `<namespace>Config.cmake`.
pub fn config_file(graph: &TargetGraph, style: &PathStyle) -> String {
    let ns = graph.namespace();
    let handle = graph.qualified_name(graph.handle());
    let mut out = String::new();

    writeln!(
        out,
        "# Generated by depconf for `{}` ({}). Do not edit.",
        graph.dependency(),
        graph.mode()
    )
    .unwrap();
    writeln!(out).unwrap();
    writeln!(out, "if(NOT TARGET {})", handle).unwrap();

    if let PathStyle::Relocatable { depth, .. } = style {
        writeln!(
            out,
            "  set({} \"${{CMAKE_CURRENT_LIST_DIR}}\")",
            IMPORT_PREFIX
        )
        .unwrap();
        for _ in 0..*depth {
            writeln!(
                out,
                "  get_filename_component({0} \"${{{0}}}\" PATH)",
                IMPORT_PREFIX
            )
            .unwrap();
        }
    }

    for (id, target) in graph.iter() {
        writeln!(out).unwrap();
        write_target(&mut out, graph, &graph.qualified_name(id), target, style);
    }

    if matches!(style, PathStyle::Relocatable { .. }) {
        writeln!(out).unwrap();
        writeln!(out, "  unset({})", IMPORT_PREFIX).unwrap();
    }
    writeln!(out, "endif()").unwrap();
    writeln!(out).unwrap();

    writeln!(out, "set({}_FOUND TRUE)", ns).unwrap();
    let components = graph.components();
    if components.is_empty() {
        writeln!(out, "set({}_COMPONENTS)", ns).unwrap();
    } else {
        writeln!(out, "set({}_COMPONENTS {})", ns, components.join(" ")).unwrap();
    }
    write_component_check(&mut out, ns);

    out
}

fn write_target(
    out: &mut String,
    graph: &TargetGraph,
    qualified: &str,
    target: &Target,
    style: &PathStyle,
) {
    writeln!(
        out,
        "  add_library({} {} IMPORTED)",
        qualified,
        target.kind.cmake_keyword()
    )
    .unwrap();

    let mut properties: Vec<(&str, String)> = Vec::new();

    for input in &target.link {
        match input {
            LinkInput::Static { path } => {
                properties.push(("IMPORTED_LOCATION", style.render(path)));
            }
            LinkInput::Shared {
                location,
                soname,
                implib,
            } => {
                properties.push(("IMPORTED_LOCATION", style.render(location)));
                if let Some(soname) = soname {
                    properties.push(("IMPORTED_SONAME", escape(soname)));
                }
                if let Some(implib) = implib {
                    properties.push(("IMPORTED_IMPLIB", style.render(implib)));
                }
            }
        }
    }

    if !target.include_dirs.is_empty() {
        properties.push((
            "INTERFACE_INCLUDE_DIRECTORIES",
            join(target.include_dirs.iter().map(|d| style.render(d))),
        ));
    }
    if !target.usage.compile_definitions.is_empty() {
        properties.push((
            "INTERFACE_COMPILE_DEFINITIONS",
            join(target.usage.compile_definitions.iter().map(|d| escape(d))),
        ));
    }
    if !target.usage.compile_options.is_empty() {
        properties.push((
            "INTERFACE_COMPILE_OPTIONS",
            join(target.usage.compile_options.iter().map(|o| escape(o))),
        ));
    }

    let links: Vec<String> = target
        .deps
        .iter()
        .map(|dep| graph.qualified_name(*dep))
        .chain(target.usage.link_libraries.iter().map(|l| escape(l)))
        .chain(target.usage.link_options.iter().map(|o| escape(o)))
        .collect();
    if !links.is_empty() {
        properties.push(("INTERFACE_LINK_LIBRARIES", join(links)));
    }

    if let Some(build) = &target.build {
        properties.push(("INTERFACE_DEPCONF_SOURCE_DIR", style.render(&build.source_dir)));
        properties.push(("INTERFACE_DEPCONF_BUILD_SYSTEM", build.build_system.to_string()));
        properties.push(("INTERFACE_DEPCONF_BUILD_DESCRIPTOR", style.render(&build.descriptor)));
    }

    if properties.is_empty() {
        return;
    }
    writeln!(out, "  set_target_properties({} PROPERTIES", qualified).unwrap();
    for (name, value) in properties {
        writeln!(out, "    {} \"{}\"", name, value).unwrap();
    }
    writeln!(out, "  )").unwrap();
}

fn write_component_check(out: &mut String, ns: &str) {
    writeln!(out).unwrap();
    writeln!(out, "foreach(_depconf_comp IN LISTS {}_FIND_COMPONENTS)", ns).unwrap();
    writeln!(
        out,
        "  list(FIND {}_COMPONENTS \"${{_depconf_comp}}\" _depconf_index)",
        ns
    )
    .unwrap();
    writeln!(out, "  if(_depconf_index EQUAL -1)").unwrap();
    writeln!(out, "    set({}_${{_depconf_comp}}_FOUND FALSE)", ns).unwrap();
    writeln!(out, "    if({}_FIND_REQUIRED_${{_depconf_comp}})", ns).unwrap();
    writeln!(out, "      set({}_FOUND FALSE)", ns).unwrap();
    writeln!(
        out,
        "      set({}_NOT_FOUND_MESSAGE \"unknown component: ${{_depconf_comp}}\")",
        ns
    )
    .unwrap();
    writeln!(out, "    endif()").unwrap();
    writeln!(out, "  else()").unwrap();
    writeln!(out, "    set({}_${{_depconf_comp}}_FOUND TRUE)", ns).unwrap();
    writeln!(out, "  endif()").unwrap();
    writeln!(out, "endforeach()").unwrap();
    writeln!(out, "unset(_depconf_comp)").unwrap();
    writeln!(out, "unset(_depconf_index)").unwrap();
}

/// `<namespace>ConfigVersion.cmake` with same-major compatibility.
pub fn version_file(graph: &TargetGraph) -> String {
    let version = graph.version();
    let numeric = numeric_part(version);
    let major = numeric.split('.').next().unwrap_or(numeric);
    let mut out = String::new();

    writeln!(
        out,
        "# Generated by depconf for `{}` ({}). Do not edit.",
        graph.dependency(),
        graph.mode()
    )
    .unwrap();
    writeln!(out).unwrap();
    writeln!(out, "set(PACKAGE_VERSION \"{}\")", escape(version)).unwrap();
    writeln!(out).unwrap();
    writeln!(out, "if(\"{}\" VERSION_LESS PACKAGE_FIND_VERSION)", numeric).unwrap();
    writeln!(out, "  set(PACKAGE_VERSION_COMPATIBLE FALSE)").unwrap();
    writeln!(out, "else()").unwrap();
    writeln!(out, "  if(PACKAGE_FIND_VERSION_MAJOR STREQUAL \"{}\")", major).unwrap();
    writeln!(out, "    set(PACKAGE_VERSION_COMPATIBLE TRUE)").unwrap();
    writeln!(out, "  else()").unwrap();
    writeln!(out, "    set(PACKAGE_VERSION_COMPATIBLE FALSE)").unwrap();
    writeln!(out, "  endif()").unwrap();
    writeln!(out, "  if(PACKAGE_FIND_VERSION STREQUAL PACKAGE_VERSION)").unwrap();
    writeln!(out, "    set(PACKAGE_VERSION_EXACT TRUE)").unwrap();
    writeln!(out, "  endif()").unwrap();
    writeln!(out, "endif()").unwrap();

    // binary-free documents fit any architecture
    let bytes = match graph.pointer_width() {
        Some(bits) if !graph.mode().is_binary_free() => bits / 8,
        _ => return out,
    };

    writeln!(out).unwrap();
    writeln!(
        out,
        "if(CMAKE_SIZEOF_VOID_P AND NOT CMAKE_SIZEOF_VOID_P STREQUAL \"{}\")",
        bytes
    )
    .unwrap();
    writeln!(
        out,
        "  set(PACKAGE_VERSION \"${{PACKAGE_VERSION}} ({}bit)\")",
        u32::from(bytes) * 8
    )
    .unwrap();
    writeln!(out, "  set(PACKAGE_VERSION_UNSUITABLE TRUE)").unwrap();
    writeln!(out, "endif()").unwrap();

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::artifact::BuildSystem;
    use crate::core::mode::DistributionMode;
    use crate::core::target::{BuildInstruction, TargetKind, UsageRequirements};

    fn x264_graph(root: &str) -> TargetGraph {
        let mode = DistributionMode::PrebuiltSingleTarget;
        let mut graph = TargetGraph::new("x264", "x264", "0.164.3095", mode)
            .with_prefixes(vec![PathBuf::from(root)])
            .with_pointer_width(Some(64));
        let target = Target::new("x264", TargetKind::Shared, mode)
            .with_include_dirs([PathBuf::from(format!("{}/include", root))])
            .with_link(LinkInput::Shared {
                location: PathBuf::from(format!("{}/lib/libx264.so.164", root)),
                soname: Some("libx264.so.164".to_string()),
                implib: None,
            })
            .with_usage(UsageRequirements {
                link_options: vec!["-pthread".to_string()],
                ..UsageRequirements::default()
            });
        let id = graph.add_target(target);
        graph.set_handle(id);
        graph
    }

    #[test]
    fn test_relocatable_style() {
        let graph = x264_graph("/opt/x264");
        let style = PathStyle::select(&graph, Path::new("/opt/x264/lib/cmake/x264"), true);
        assert_eq!(
            style,
            PathStyle::Relocatable {
                root: PathBuf::from("/opt/x264"),
                depth: 3
            }
        );

        let text = config_file(&graph, &style);
        assert_eq!(text.matches("get_filename_component(_IMPORT_PREFIX").count(), 3);
        assert!(text.contains("IMPORTED_LOCATION \"${_IMPORT_PREFIX}/lib/libx264.so.164\""));
        assert!(text.contains("IMPORTED_SONAME \"libx264.so.164\""));
        assert!(text.contains("INTERFACE_INCLUDE_DIRECTORIES \"${_IMPORT_PREFIX}/include\""));
        assert!(text.contains("INTERFACE_LINK_LIBRARIES \"-pthread\""));
        assert!(text.contains("add_library(x264::x264 SHARED IMPORTED)"));
    }

    #[test]
    fn test_absolute_style_outside_root() {
        let graph = x264_graph("/opt/x264");
        assert_eq!(
            PathStyle::select(&graph, Path::new("/home/me/cmake"), true),
            PathStyle::Absolute
        );
        assert_eq!(
            PathStyle::select(&graph, Path::new("/opt/x264/lib/cmake/x264"), false),
            PathStyle::Absolute
        );

        let text = config_file(&graph, &PathStyle::Absolute);
        assert!(!text.contains("_IMPORT_PREFIX"));
        assert!(text.contains("IMPORTED_LOCATION \"/opt/x264/lib/libx264.so.164\""));
    }

    #[test]
    fn test_property_order_is_fixed() {
        let graph = x264_graph("/opt/x264");
        let text = config_file(&graph, &PathStyle::Absolute);
        let pos = |needle: &str| text.find(needle).unwrap();
        assert!(pos("IMPORTED_LOCATION") < pos("IMPORTED_SONAME"));
        assert!(pos("IMPORTED_SONAME") < pos("INTERFACE_INCLUDE_DIRECTORIES"));
        assert!(pos("INTERFACE_INCLUDE_DIRECTORIES") < pos("INTERFACE_LINK_LIBRARIES"));
    }

    #[test]
    fn test_umbrella_and_components() {
        let mode = DistributionMode::PrebuiltMultiComponent;
        let mut graph = TargetGraph::new("ffmpeg", "FFmpeg", "5.1.6", mode);
        let avutil = graph.add_target(
            Target::new("avutil", TargetKind::Shared, mode).with_link(LinkInput::Shared {
                location: PathBuf::from("/x/lib/libavutil.so.57"),
                soname: None,
                implib: None,
            }),
        );
        let umbrella = graph.add_target(Target::new("ffmpeg", TargetKind::Interface, mode));
        graph.add_edge(umbrella, avutil);
        graph.set_handle(umbrella);

        let text = config_file(&graph, &PathStyle::Absolute);
        assert!(text.starts_with("# Generated by depconf for `ffmpeg` (prebuilt-multi-component)"));
        assert!(text.contains("if(NOT TARGET FFmpeg::ffmpeg)"));
        assert!(text.contains("add_library(FFmpeg::ffmpeg INTERFACE IMPORTED)"));
        assert!(text.contains("INTERFACE_LINK_LIBRARIES \"FFmpeg::avutil\""));
        assert!(text.contains("set(FFmpeg_FOUND TRUE)"));
        assert!(text.contains("set(FFmpeg_COMPONENTS avutil)"));
        assert!(text.contains("FFmpeg_NOT_FOUND_MESSAGE"));
        assert!(text.find("FFmpeg::avutil SHARED").unwrap() < text.find("FFmpeg::ffmpeg INTERFACE").unwrap());
    }

    #[test]
    fn test_source_target_properties() {
        let mode = DistributionMode::SourceBuildable;
        let mut graph = TargetGraph::new("yaml-cpp", "yaml-cpp", "0.0.1", mode);
        graph.add_target(Target::new("yaml-cpp", TargetKind::Source, mode).with_build(
            BuildInstruction {
                source_dir: PathBuf::from("/src/yaml-cpp"),
                build_system: BuildSystem::CMake,
                descriptor: PathBuf::from("/src/yaml-cpp/CMakeLists.txt"),
            },
        ));

        let text = config_file(&graph, &PathStyle::Absolute);
        assert!(text.contains("add_library(yaml-cpp::yaml-cpp INTERFACE IMPORTED)"));
        assert!(text.contains("    INTERFACE_DEPCONF_SOURCE_DIR \"/src/yaml-cpp\""));
        assert!(text.contains("    INTERFACE_DEPCONF_BUILD_SYSTEM \"cmake\""));
        assert!(text.contains("    INTERFACE_DEPCONF_BUILD_DESCRIPTOR \"/src/yaml-cpp/CMakeLists.txt\""));
        assert!(!text.contains("IMPORTED_LOCATION"));
        assert!(text.contains("set(yaml-cpp_COMPONENTS)"));
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape(r#"NAME="x""#), r#"NAME=\"x\""#);
        assert_eq!(escape("a;b"), "a\\;b");
        assert_eq!(escape("${HOME}"), "\\${HOME}");
    }

    #[test]
    fn test_version_file_pointer_check() {
        let graph = x264_graph("/opt/x264");
        let text = version_file(&graph);
        assert!(text.contains("set(PACKAGE_VERSION \"0.164.3095\")"));
        assert!(text.contains("PACKAGE_FIND_VERSION_MAJOR STREQUAL \"0\""));
        assert!(text.contains("CMAKE_SIZEOF_VOID_P STREQUAL \"8\""));
        assert!(text.contains("(64bit)"));
    }

    #[test]
    fn test_version_file_binary_free_has_no_pointer_check() {
        let mut graph = TargetGraph::new("eigen", "eigen", "3.4.0-rc1", DistributionMode::HeaderOnly)
            .with_pointer_width(Some(64));
        graph.add_target(Target::new("eigen", TargetKind::Interface, DistributionMode::HeaderOnly));

        let text = version_file(&graph);
        assert!(text.contains("if(\"3.4.0\" VERSION_LESS PACKAGE_FIND_VERSION)"));
        assert!(text.contains("STREQUAL \"3\""));
        assert!(!text.contains("CMAKE_SIZEOF_VOID_P"));
    }
}
