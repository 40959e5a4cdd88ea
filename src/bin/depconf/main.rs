//! depconf CLI - CMake package configs for installed C/C++ dependencies

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands, MessageFormat};
use depconf::core::errors::GenerateError;
use depconf::util::{diagnostic, Shell};

fn main() {
    let cli = Cli::parse();

    let shell = Arc::new(Shell::from_flags(
        cli.quiet,
        cli.verbose,
        cli.color,
        cli.message_format == MessageFormat::Json,
    ));

    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli, &shell) {
        report(&shell, &e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default = if verbose {
        "depconf=debug"
    } else if quiet {
        "depconf=error"
    } else {
        "depconf=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli, shell: &Arc<Shell>) -> Result<()> {
    match cli.command {
        Commands::Generate(args) => commands::generate::execute(args, shell),
        Commands::Probe(args) => commands::probe::execute(args, shell),
        Commands::Batch(args) => commands::batch::execute(args, shell),
        Commands::Verify(args) => commands::verify::execute(args, shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

fn report(shell: &Shell, error: &anyhow::Error) {
    if error.is::<commands::Failed>() {
        // the command already reported each failure
        return;
    }
    if shell.is_json() {
        shell.error(format!("{:#}", error));
    } else if let Some(generate_error) = error.downcast_ref::<GenerateError>() {
        diagnostic::emit(&generate_error.to_diagnostic(), shell.use_color());
    } else {
        eprintln!("error: {:#}", error);
    }
}
