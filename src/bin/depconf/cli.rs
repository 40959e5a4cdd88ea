//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use depconf::core::mode::DistributionMode;
use depconf::ops::verify::Language;
use depconf::util::shell::ColorChoice;

/// depconf - generate CMake package configs for installed C/C++ dependencies
#[derive(Parser)]
#[command(name = "depconf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Print errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Coloring of status output
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Output format for results
    #[arg(long, global = true, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the CMake package config for a dependency
    Generate(GenerateArgs),

    /// Show what an installation contains and how it classifies
    Probe(ProbeArgs),

    /// Generate configs for every dependency in a batch file
    Batch(BatchArgs),

    /// Generate, then build and run a consumer program against the config
    Verify(VerifyArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Identity and location of a dependency.
#[derive(Args, Debug, Clone)]
pub struct DependencyArgs {
    /// Dependency name
    pub name: String,

    /// Installation root to probe (repeatable)
    #[arg(long = "root", short = 'r', required = true)]
    pub roots: Vec<PathBuf>,

    /// Hints file (default: <root>/share/<name>/depconf.toml)
    #[arg(long)]
    pub hints: Option<PathBuf>,
}

#[derive(Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub dependency: DependencyArgs,

    /// Destination directory (default: <first root>/lib/cmake/<namespace>)
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,

    /// Expected distribution mode; fails if the installation says otherwise
    #[arg(long, value_parser = parse_mode)]
    pub mode: Option<DistributionMode>,

    /// Target namespace (default: from hints, else the dependency name)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Version recorded in the config (default: from hints or pkg-config)
    #[arg(long = "version", id = "dependency_version")]
    pub version: Option<String>,

    /// Print the config files instead of writing them
    #[arg(long)]
    pub dry_run: bool,

    /// Write absolute paths even inside the installation root
    #[arg(long)]
    pub absolute: bool,
}

#[derive(Args)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub dependency: DependencyArgs,
}

#[derive(Args)]
pub struct BatchArgs {
    /// Batch file listing [[dependency]] entries
    pub file: PathBuf,

    /// Number of parallel jobs (default: number of CPUs)
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub dependency: DependencyArgs,

    /// Consumer program: a directory with main.cpp/main.c, or one source file
    #[arg(long)]
    pub consumer: PathBuf,

    /// Text that must appear in the consumer's output (repeatable)
    #[arg(long = "marker", short = 'm')]
    pub markers: Vec<String>,

    /// Consumer language (default: from the source extension)
    #[arg(long, value_enum)]
    pub language: Option<Language>,

    /// Destination directory for the generated config
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,

    /// Scratch directory for the consumer build (default: a temp dir)
    #[arg(long)]
    pub work_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

fn parse_mode(s: &str) -> Result<DistributionMode, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "depconf",
            "--message-format",
            "json",
            "generate",
            "ffmpeg",
            "--root",
            "/opt/ffmpeg",
            "--mode",
            "prebuilt-multi-component",
            "--version",
            "5.1",
        ])
        .unwrap();

        assert_eq!(cli.message_format, MessageFormat::Json);
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.dependency.name, "ffmpeg");
        assert_eq!(args.mode, Some(DistributionMode::PrebuiltMultiComponent));
        assert_eq!(args.version.as_deref(), Some("5.1"));
    }

    #[test]
    fn test_root_is_required() {
        assert!(Cli::try_parse_from(["depconf", "probe", "zlib"]).is_err());
    }
}
