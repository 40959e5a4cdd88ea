//! `depconf probe` command

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Result;

use crate::cli::ProbeArgs;
use crate::commands::load_settings;
use depconf::core::artifact::ArtifactSet;
use depconf::ops::probe;
use depconf::util::shell::Status;
use depconf::util::Shell;

pub fn execute(args: ProbeArgs, shell: &Arc<Shell>) -> Result<()> {
    let settings = load_settings()?;
    let request = args.dependency.request();

    shell.status(Status::Probing, &request.name);
    let report = probe(&request, &settings)?;

    if shell.is_json() {
        shell.json_event(&serde_json::json!({
            "reason": "probed",
            "dependency": report.set.name(),
            "roots": report.set.roots(),
            "header_roots": report.set.header_roots(),
            "binaries": report.set.binaries(),
            "metadata_files": report.set.metadata_files(),
            "source_trees": report.set.source_trees(),
            "mode": report.mode.as_ref().ok(),
        }));
    } else {
        shell.print(format_inventory(&report.set));
    }

    let mode = report.mode?;
    shell.status(Status::Classified, format!("{} as {}", request.name, mode));
    Ok(())
}

fn format_inventory(set: &ArtifactSet) -> String {
    let mut out = String::new();

    writeln!(out, "{}", set.name()).unwrap();
    for root in set.roots() {
        writeln!(out, "  root: {}", root.display()).unwrap();
    }

    if !set.header_roots().is_empty() {
        writeln!(out, "\nheaders:").unwrap();
        for header_root in set.header_roots() {
            if header_root.subdirs.is_empty() {
                writeln!(out, "  {}", header_root.path.display()).unwrap();
            } else {
                writeln!(
                    out,
                    "  {} ({})",
                    header_root.path.display(),
                    header_root.subdirs.join(", ")
                )
                .unwrap();
            }
        }
    }

    if !set.binaries().is_empty() {
        writeln!(out, "\nbinaries:").unwrap();
        for binary in set.binaries() {
            write!(out, "  {:<16} {:<9} {}", binary.name, binary.kind.as_str(), binary.path.display())
                .unwrap();
            if let Some(soname) = &binary.soname {
                write!(out, " [soname {}]", soname).unwrap();
            }
            writeln!(out).unwrap();
        }
    }

    if !set.metadata_files().is_empty() {
        writeln!(out, "\nmetadata:").unwrap();
        for file in set.metadata_files() {
            writeln!(out, "  {}", file.display()).unwrap();
        }
    }

    if !set.source_trees().is_empty() {
        writeln!(out, "\nsource trees:").unwrap();
        for tree in set.source_trees() {
            writeln!(
                out,
                "  {} ({}, {})",
                tree.root.display(),
                tree.build_system,
                tree.descriptor.display()
            )
            .unwrap();
        }
    }

    out
}
