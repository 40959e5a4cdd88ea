//! `depconf batch` command

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::BatchArgs;
use crate::commands::{load_settings, Failed};
use depconf::ops::{generate_batch, load_batch, BatchItem};
use depconf::util::shell::Status;
use depconf::util::{diagnostic, Shell};

pub fn execute(args: BatchArgs, shell: &Arc<Shell>) -> Result<()> {
    let settings = load_settings()?;
    let requests = load_batch(&args.file)?;

    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = args.jobs {
        pool = pool.num_threads(jobs);
    }
    let pool = pool.build().context("failed to start worker threads")?;

    let progress = shell.progress(requests.len() as u64, "Generating");
    let items = pool.install(|| {
        generate_batch(&requests, &settings, |item| {
            match &item.result {
                Ok(outcome) => progress.status(
                    Status::Finished,
                    format!("{} as {} (`{}`)", item.name, outcome.mode, outcome.metadata.handle),
                ),
                Err(_) => progress.status(Status::Failed, &item.name),
            }
            progress.inc(&item.name);
        })
    });
    progress.finish();

    let failed = report(&items, shell);
    if failed > 0 {
        if !shell.is_json() {
            shell.error(format!("{} of {} dependencies failed", failed, items.len()));
        }
        return Err(Failed.into());
    }

    shell.status(
        Status::Finished,
        format!("{} dependencies", items.len()),
    );
    Ok(())
}

/// Print each failure in full; returns how many failed.
fn report(items: &[BatchItem], shell: &Shell) -> usize {
    let mut failed = 0;
    for item in items {
        if shell.is_json() {
            let event = match &item.result {
                Ok(outcome) => serde_json::json!({
                    "reason": "generated",
                    "dependency": item.name,
                    "metadata": outcome.metadata,
                }),
                Err(e) => serde_json::json!({
                    "reason": "failed",
                    "dependency": item.name,
                    "kind": e.kind(),
                    "stage": e.stage().to_string(),
                    "message": e.to_string(),
                }),
            };
            shell.json_event(&event);
        }

        if let Err(e) = &item.result {
            failed += 1;
            if !shell.is_json() {
                diagnostic::emit(&e.to_diagnostic(), shell.use_color());
            }
        }
    }
    failed
}
