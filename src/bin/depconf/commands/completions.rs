//! `depconf completions` command

use anyhow::Result;
use clap::CommandFactory;

use crate::cli::{Cli, CompletionsArgs};

pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    let mut stdout = std::io::stdout().lock();

    clap_complete::generate(args.shell, &mut cmd, bin_name, &mut stdout);
    Ok(())
}
