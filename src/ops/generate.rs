//! Implementation of `depconf generate`, `depconf probe` and batch runs.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use rayon::prelude::*;

use crate::builder::{self, ModelOptions};
use crate::core::artifact::{ArtifactSet, Linkage};
use crate::core::errors::GenerateError;
use crate::core::mode::{classify, DistributionMode};
use crate::core::target::TargetGraph;
use crate::emit::{self, ConfigDocument, EmitOptions, GraphMetadata};
use crate::sources::probe::{ProbeOptions, Prober};
use crate::util::config::Config;
use crate::util::fs::absolute_path;

/// One dependency to generate.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub name: String,
    pub roots: Vec<PathBuf>,

    /// Destination directory (default: `<first root>/lib/cmake/<namespace>`)
    pub destination: Option<PathBuf>,

    /// Asserted mode; contradicting the inferred one is an error
    pub mode: Option<DistributionMode>,

    pub namespace: Option<String>,
    pub version: Option<String>,

    /// Explicit hints file
    pub hints: Option<PathBuf>,

    /// Render without writing
    pub dry_run: bool,
}

impl GenerateRequest {
    pub fn new(name: impl Into<String>, roots: Vec<PathBuf>) -> Self {
        GenerateRequest {
            name: name.into(),
            roots,
            ..GenerateRequest::default()
        }
    }
}

/// Settings shared by every request of a run.
#[derive(Debug, Clone)]
pub struct GenerateSettings {
    pub probe: ProbeOptions,
    pub linkage: Linkage,
    pub relocatable: bool,
    pub default_version: Option<String>,
}

impl Default for GenerateSettings {
    fn default() -> Self {
        GenerateSettings {
            probe: ProbeOptions::default(),
            linkage: Linkage::default(),
            relocatable: true,
            default_version: None,
        }
    }
}

impl GenerateSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(GenerateSettings {
            probe: config.probe_options(),
            linkage: config.linkage()?,
            relocatable: config.relocatable(),
            default_version: config.generate.default_version.clone(),
        })
    }
}

/// Result of one successful pipeline.
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub mode: DistributionMode,
    pub graph: TargetGraph,
    pub document: ConfigDocument,
    /// Target names, files and checksums; no files on a dry run
    pub metadata: GraphMetadata,
}

impl GenerateOutcome {
    /// Qualified names of every target, for chaining.
    pub fn target_names(&self) -> Vec<&str> {
        self.metadata.target_names()
    }
}

fn prober_for(request: &GenerateRequest, settings: &GenerateSettings) -> Prober {
    let mut options = settings.probe.clone();
    if request.hints.is_some() {
        options.hints_file = request.hints.clone();
    }
    Prober::new(options)
}

/// Probe, classify, build, emit and (unless a dry run) publish.
pub fn generate(
    request: &GenerateRequest,
    settings: &GenerateSettings,
) -> Result<GenerateOutcome, GenerateError> {
    tracing::debug!("generating `{}` from {:?}", request.name, request.roots);

    let set = prober_for(request, settings).probe(&request.name, &request.roots)?;
    let mode = classify(&set)?;
    if let Some(requested) = request.mode {
        if requested != mode {
            return Err(GenerateError::ModeMismatch {
                dependency: request.name.clone(),
                requested,
                inferred: mode,
            });
        }
    }

    let graph = builder::build(
        &set,
        mode,
        &ModelOptions {
            namespace: request.namespace.clone(),
            version: request.version.clone(),
            default_version: settings.default_version.clone(),
            linkage: settings.linkage,
        },
    )?;

    let destination = match &request.destination {
        Some(dir) => absolute_path(dir),
        None => emit::default_destination(&graph),
    };
    let document = emit::emit(
        &graph,
        &EmitOptions::new(destination).relocatable(settings.relocatable),
    );

    let files = if request.dry_run {
        Vec::new()
    } else {
        emit::publish(&document)?
    };
    let metadata = GraphMetadata::new(&graph, files);

    Ok(GenerateOutcome {
        mode,
        graph,
        document,
        metadata,
    })
}

/// Inventory and classification without building anything.
#[derive(Debug)]
pub struct ProbeReport {
    pub set: ArtifactSet,
    pub mode: Result<DistributionMode, GenerateError>,
}

/// Probe and classify. Classification failures are reported alongside the
/// inventory so it can still be inspected.
pub fn probe(
    request: &GenerateRequest,
    settings: &GenerateSettings,
) -> Result<ProbeReport, GenerateError> {
    let set = prober_for(request, settings).probe(&request.name, &request.roots)?;
    let mode = classify(&set);
    Ok(ProbeReport { set, mode })
}

/// Outcome of one dependency in a batch.
#[derive(Debug)]
pub struct BatchItem {
    pub name: String,
    pub result: Result<GenerateOutcome, GenerateError>,
}

/// Run independent pipelines in parallel. A failing dependency never stops
/// its siblings; results come back in request order.
pub fn generate_batch<F>(
    requests: &[GenerateRequest],
    settings: &GenerateSettings,
    on_done: F,
) -> Vec<BatchItem>
where
    F: Fn(&BatchItem) + Sync,
{
    warn_shared_destinations(requests);

    requests
        .par_iter()
        .map(|request| {
            let item = BatchItem {
                name: request.name.clone(),
                result: generate(request, settings),
            };
            on_done(&item);
            item
        })
        .collect()
}

fn warn_shared_destinations(requests: &[GenerateRequest]) {
    let mut seen: HashMap<PathBuf, &str> = HashMap::new();
    for request in requests {
        let Some(dest) = &request.destination else {
            continue;
        };
        if let Some(previous) = seen.insert(absolute_path(dest), &request.name) {
            tracing::warn!(
                "`{}` and `{}` share destination {}; the last one written wins",
                previous,
                request.name,
                dest.display()
            );
        }
    }
}
