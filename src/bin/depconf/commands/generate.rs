//! `depconf generate` command

use std::sync::Arc;

use anyhow::Result;

use crate::cli::GenerateArgs;
use crate::commands::{display_path, load_settings};
use depconf::ops::{generate, GenerateOutcome};
use depconf::util::shell::Status;
use depconf::util::Shell;

pub fn execute(args: GenerateArgs, shell: &Arc<Shell>) -> Result<()> {
    let mut settings = load_settings()?;
    if args.absolute {
        settings.relocatable = false;
    }

    let mut request = args.dependency.request();
    request.destination = args.out;
    request.mode = args.mode;
    request.namespace = args.namespace;
    request.version = args.version;
    request.dry_run = args.dry_run;

    shell.status(Status::Generating, &request.name);
    let outcome = generate(&request, &settings)?;

    if shell.is_json() {
        shell.json_event(&serde_json::json!({
            "reason": "generated",
            "dry_run": request.dry_run,
            "metadata": outcome.metadata,
            "document": request.dry_run.then(|| outcome.document.render()),
        }));
        return Ok(());
    }

    report(&outcome, request.dry_run, shell);
    Ok(())
}

fn report(outcome: &GenerateOutcome, dry_run: bool, shell: &Shell) {
    shell.status(
        Status::Classified,
        format!("{} as {}", outcome.metadata.dependency, outcome.mode),
    );

    if dry_run {
        shell.print(outcome.document.render());
    } else {
        for file in &outcome.metadata.files {
            let status = if file.fresh { Status::Wrote } else { Status::Fresh };
            shell.status(status, display_path(&file.path));
        }
    }

    if shell.is_verbose() {
        for name in outcome.target_names() {
            shell.note(name);
        }
    }

    shell.status(
        Status::Finished,
        format!(
            "`{}` ({} target{})",
            outcome.metadata.handle,
            outcome.metadata.targets.len(),
            if outcome.metadata.targets.len() == 1 { "" } else { "s" }
        ),
    );
}
