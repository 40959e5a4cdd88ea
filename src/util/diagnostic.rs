//! User-facing diagnostic messages.
//!
//! A diagnostic carries the root cause, the artifacts involved and what the
//! user can do about it.

use std::fmt;
use std::path::PathBuf;

/// Common suggestion messages for consistent error output.
pub mod suggestions {
    /// No artifacts under any root.
    pub const CHECK_ROOT: &str =
        "Check that --root points at an installation prefix (with include/ or lib/ below it)";

    /// Nothing installed, but sources may be around.
    pub const SOURCE_TREE: &str =
        "Pass the source directory as a root to describe a library that is built later";

    /// Conflicting libraries.
    pub const EXCLUDE_LIBRARY: &str =
        "List helper libraries under `exclude` in the dependency's depconf.toml";

    /// Same library at two places.
    pub const SPLIT_ROOTS: &str =
        "Probe one installation prefix at a time instead of overlapping roots";

    /// Broken hints or metadata.
    pub const FIX_HINTS: &str =
        "Fix the component names and dependencies in depconf.toml or the .pc file";

    /// Requested mode disagrees with the files.
    pub const INSPECT_PROBE: &str = "Run `depconf probe` to see what was found";

    /// Emission failure.
    pub const CHECK_PERMISSIONS: &str =
        "Check that the output directory is writable, or choose another with --out";
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let error_prefix = if color {
            "\x1b[1;31merror\x1b[0m"
        } else {
            "error"
        };
        output.push_str(&format!("{}: {}\n", error_prefix, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
