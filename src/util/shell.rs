//! User-facing output.
//!
//! Every status line goes through [`Shell`] so that quiet, verbose and JSON
//! modes are honored in one place:
//! - status messages are right-aligned verbs followed by a message
//! - JSON mode prints one event object per line on stdout and nothing else
//! - batch runs get an `indicatif` progress bar in normal mode

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

/// Shell output mode - Human and Json are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellMode {
    Human {
        verbosity: Verbosity,
        color: ColorChoice,
    },
    Json,
}

impl Default for ShellMode {
    fn default() -> Self {
        ShellMode::Human {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Auto,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only
    Quiet,
    #[default]
    Normal,
    /// Per-step lines instead of progress bars
    Verbose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

/// Semantic status of a message; the shell picks text and color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Probing,
    Generating,
    Verifying,

    Classified,
    Wrote,
    Fresh,
    Finished,
    Passed,

    Info,

    Skipped,
    Warning,

    Failed,
    Error,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Probing => "Probing",
            Status::Generating => "Generating",
            Status::Verifying => "Verifying",
            Status::Classified => "Classified",
            Status::Wrote => "Wrote",
            Status::Fresh => "Fresh",
            Status::Finished => "Finished",
            Status::Passed => "Passed",
            Status::Info => "Info",
            Status::Skipped => "Skipped",
            Status::Warning => "Warning",
            Status::Failed => "Failed",
            Status::Error => "error",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Classified
            | Status::Wrote
            | Status::Fresh
            | Status::Finished
            | Status::Passed => "\x1b[1;32m",
            Status::Probing | Status::Generating | Status::Verifying => "\x1b[1;36m",
            Status::Info => "\x1b[1;34m",
            Status::Skipped | Status::Warning => "\x1b[1;33m",
            Status::Failed | Status::Error => "\x1b[1;31m",
        }
    }

    fn is_error(&self) -> bool {
        matches!(self, Status::Failed | Status::Error)
    }
}

const STATUS_WIDTH: usize = 12;

/// Central shell for all CLI output.
#[derive(Debug)]
pub struct Shell {
    mode: ShellMode,
    use_color: bool,
}

impl Shell {
    pub fn new(mode: ShellMode) -> Self {
        let use_color = match &mode {
            ShellMode::Json => false,
            ShellMode::Human { color, .. } => match color {
                ColorChoice::Auto => io::stderr().is_terminal(),
                ColorChoice::Always => true,
                ColorChoice::Never => false,
            },
        };

        Shell { mode, use_color }
    }

    /// JSON mode takes precedence over quiet/verbose.
    pub fn from_flags(quiet: bool, verbose: bool, color: ColorChoice, json: bool) -> Self {
        let mode = if json {
            ShellMode::Json
        } else {
            let verbosity = if quiet {
                Verbosity::Quiet
            } else if verbose {
                Verbosity::Verbose
            } else {
                Verbosity::Normal
            };
            ShellMode::Human { verbosity, color }
        };

        Shell::new(mode)
    }

    pub fn mode(&self) -> &ShellMode {
        &self.mode
    }

    pub fn is_quiet(&self) -> bool {
        matches!(
            self.mode,
            ShellMode::Human {
                verbosity: Verbosity::Quiet,
                ..
            }
        )
    }

    pub fn is_verbose(&self) -> bool {
        matches!(
            self.mode,
            ShellMode::Human {
                verbosity: Verbosity::Verbose,
                ..
            }
        )
    }

    pub fn is_json(&self) -> bool {
        matches!(self.mode, ShellMode::Json)
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// `{status:>12} {message}` on stderr. Quiet mode keeps errors only;
    /// JSON mode drops everything.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_json() || (self.is_quiet() && !status.is_error()) {
            return;
        }
        eprintln!("{} {}", self.format_status(status), msg);
    }

    pub fn note(&self, msg: impl Display) {
        self.status(Status::Info, msg);
    }

    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    /// In JSON mode this becomes an `error` event.
    pub fn error(&self, msg: impl Display) {
        if self.is_json() {
            self.json_event(&serde_json::json!({
                "reason": "error",
                "message": msg.to_string()
            }));
        } else {
            self.status(Status::Error, msg);
        }
    }

    /// Print a JSON event line to stdout. Ignored in human mode.
    pub fn json_event(&self, event: &serde_json::Value) {
        if !self.is_json() {
            return;
        }
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", event);
        let _ = stdout.flush();
    }

    /// Print command output on stdout. Ignored in JSON mode.
    pub fn print(&self, text: impl Display) {
        if self.is_json() {
            return;
        }
        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "{}", text);
        let _ = stdout.flush();
    }

    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();
        if self.use_color {
            format!(
                "{}{:>width$}\x1b[0m",
                status.color_code(),
                text,
                width = STATUS_WIDTH
            )
        } else {
            format!("{:>width$}", text, width = STATUS_WIDTH)
        }
    }

    /// A progress bar over `total` items, drawn only in normal human mode.
    pub fn progress(self: &Arc<Self>, total: u64, msg: impl Display) -> Progress {
        Progress::new(Arc::clone(self), total, msg.to_string())
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(ShellMode::default())
    }
}

/// Progress over a fixed number of items. Shareable across worker threads.
pub struct Progress {
    shell: Arc<Shell>,
    pb: Option<ProgressBar>,
    total: u64,
    current: AtomicU64,
    message: String,
}

impl Progress {
    fn new(shell: Arc<Shell>, total: u64, message: String) -> Self {
        let pb = if shell.is_quiet() || shell.is_verbose() || shell.is_json() || total <= 1 {
            None
        } else {
            let pb = ProgressBar::new(total);
            if let Ok(style) =
                ProgressStyle::default_bar().template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len}")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb.set_message(message.clone());
            Some(pb)
        };

        Progress {
            shell,
            pb,
            total,
            current: AtomicU64::new(0),
            message,
        }
    }

    /// Count one finished item named `item`.
    pub fn inc(&self, item: &str) {
        let current = self.current.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(pb) = &self.pb {
            pb.inc(1);
        }

        if self.shell.is_json() {
            self.shell.json_event(&serde_json::json!({
                "reason": "progress",
                "current": current,
                "total": self.total,
                "item": item,
                "message": self.message
            }));
        } else if self.shell.is_verbose() {
            eprintln!("  {} [{}/{}] {}", self.message, current, self.total, item);
        }
    }

    /// Print a status line without tearing the bar.
    pub fn status(&self, status: Status, msg: impl Display) {
        match &self.pb {
            Some(pb) => pb.suspend(|| self.shell.status(status, msg)),
            None => self.shell.status(status, msg),
        }
    }

    pub fn finish(&self) {
        if let Some(pb) = &self.pb {
            pb.finish_and_clear();
        }
    }

    pub fn position(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_modes() {
        let shell = Shell::new(ShellMode::Human {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Never,
        });
        assert!(!shell.is_quiet());
        assert!(!shell.is_verbose());
        assert!(!shell.is_json());
        assert!(!shell.use_color());

        assert!(Shell::new(ShellMode::Json).is_json());
    }

    #[test]
    fn test_status_formatting() {
        let shell = Shell::new(ShellMode::Human {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Never,
        });

        let formatted = shell.format_status(Status::Generating);
        assert_eq!(formatted.trim(), "Generating");
        assert_eq!(formatted.len(), STATUS_WIDTH);
    }

    #[test]
    fn test_from_flags() {
        assert!(Shell::from_flags(true, false, ColorChoice::Auto, false).is_quiet());
        assert!(Shell::from_flags(false, true, ColorChoice::Auto, false).is_verbose());

        let shell = Shell::from_flags(true, true, ColorChoice::Auto, true);
        assert!(shell.is_json());
        assert!(!shell.is_quiet());
    }

    #[test]
    fn test_progress_counts_across_threads() {
        let shell = Arc::new(Shell::new(ShellMode::Human {
            verbosity: Verbosity::Quiet,
            color: ColorChoice::Never,
        }));
        let progress = shell.progress(4, "generating");

        std::thread::scope(|s| {
            for i in 0..4 {
                let progress = &progress;
                s.spawn(move || progress.inc(&format!("dep{}", i)));
            }
        });
        progress.finish();

        assert_eq!(progress.position(), 4);
        assert_eq!(progress.total(), 4);
    }
}
