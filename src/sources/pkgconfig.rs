//! pkg-config descriptor parsing.
//!
//! Only what the config generator needs: variables with `${var}`
//! substitution, the identity fields, the dependency lists and the three
//! flag fields. Unknown keywords are ignored, as pkg-config does.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;

/// One compiler or linker flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flag {
    /// `-I<dir>`
    Include(PathBuf),
    /// `-D<NAME[=VALUE]>`
    Define(String),
    /// `-L<dir>`
    LibDir(PathBuf),
    /// `-l<name>`
    Lib(String),
    /// `-pthread`
    Pthread,
    /// Anything else, kept verbatim
    Other(String),
}

impl Flag {
    /// Parse a flags string. `-I dir` spelled as two tokens is accepted.
    pub fn parse_all(input: &str) -> Vec<Flag> {
        let mut flags = Vec::new();
        let mut tokens = split_flags(input).into_iter();

        while let Some(token) = tokens.next() {
            let flag = match token.as_str() {
                "-pthread" => Flag::Pthread,
                "-I" | "-L" | "-l" | "-D" => match tokens.next() {
                    Some(arg) => Flag::typed(&token[1..2], &arg),
                    None => Flag::Other(token),
                },
                t if t.len() > 2 && matches!(&t[..2], "-I" | "-L" | "-l" | "-D") => {
                    Flag::typed(&t[1..2], &t[2..])
                }
                _ => Flag::Other(token),
            };
            flags.push(flag);
        }

        flags
    }

    fn typed(kind: &str, data: &str) -> Flag {
        match kind {
            "I" => Flag::Include(PathBuf::from(data)),
            "L" => Flag::LibDir(PathBuf::from(data)),
            "l" => Flag::Lib(data.to_string()),
            _ => Flag::Define(data.to_string()),
        }
    }
}

/// Split on whitespace, honoring double quotes and backslash escapes.
fn split_flags(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// A parsed `.pc` file.
#[derive(Debug, Clone, PartialEq)]
pub struct PkgConfig {
    pub path: PathBuf,

    /// File stem (`libavcodec`)
    pub module: String,

    pub name: Option<String>,
    pub version: Option<String>,

    /// Module names only, version constraints dropped
    pub requires: Vec<String>,
    pub requires_private: Vec<String>,

    pub cflags: Vec<Flag>,
    pub libs: Vec<Flag>,
    pub libs_private: Vec<Flag>,
}

impl PkgConfig {
    /// Load and parse a descriptor from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&content, path)
    }

    /// Parse descriptor text. `path` gives the module name and `pcfiledir`.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let module = path
            .file_stem()
            .and_then(|s| s.to_str())
            .with_context(|| format!("invalid pkg-config file name: {}", path.display()))?
            .to_string();

        let mut variables: HashMap<String, String> = HashMap::new();
        if let Some(dir) = path.parent() {
            variables.insert("pcfiledir".to_string(), dir.to_string_lossy().into_owned());
        }
        let mut fields: HashMap<String, String> = HashMap::new();

        for (line_no, line) in logical_lines(content).iter().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let colon = line.find(':');
            let eq = line.find('=');
            match (colon, eq) {
                (Some(c), Some(e)) if e < c => {
                    insert_variable(&mut variables, line, e, path, line_no)?;
                }
                (None, Some(e)) => {
                    insert_variable(&mut variables, line, e, path, line_no)?;
                }
                (Some(c), _) => {
                    let key = line[..c].trim().to_string();
                    let value = expand(&line[c + 1..], &variables);
                    fields.insert(key, value.trim().to_string());
                }
                (None, None) => {
                    tracing::debug!("{}:{}: ignoring line", path.display(), line_no + 1);
                }
            }
        }

        let field = |key: &str| fields.get(key).map(String::as_str).unwrap_or("");

        Ok(PkgConfig {
            path: path.to_path_buf(),
            module,
            name: fields.get("Name").cloned(),
            version: fields.get("Version").cloned().filter(|v| !v.is_empty()),
            requires: parse_requires(field("Requires")),
            requires_private: parse_requires(field("Requires.private")),
            cflags: Flag::parse_all(field("Cflags")),
            libs: Flag::parse_all(field("Libs")),
            libs_private: Flag::parse_all(field("Libs.private")),
        })
    }

    /// Module name with a leading `lib` removed (`libavcodec` -> `avcodec`).
    pub fn library_name(&self) -> &str {
        strip_lib_prefix(&self.module)
    }

    /// Whether this descriptor describes the library called `name`.
    pub fn describes(&self, name: &str) -> bool {
        self.module == name || self.library_name() == name
    }

    /// Include directories from `Cflags`.
    pub fn include_dirs(&self) -> impl Iterator<Item = &PathBuf> {
        self.cflags.iter().filter_map(|f| match f {
            Flag::Include(dir) => Some(dir),
            _ => None,
        })
    }

    /// Whether the descriptor carries anything besides include paths.
    ///
    /// `is_present` tells whether a `-l` name refers to a library found next
    /// to the descriptor; such links are not propagated requirements.
    pub fn propagates_beyond_includes(&self, is_present: impl Fn(&str) -> bool) -> bool {
        let compile = self
            .cflags
            .iter()
            .any(|f| !matches!(f, Flag::Include(_)));
        let link = self.libs.iter().any(|f| match f {
            Flag::Lib(name) => !is_present(name),
            Flag::Pthread | Flag::Other(_) => true,
            _ => false,
        });
        compile || link
    }
}

/// Strip a leading `lib` unless nothing would remain.
pub fn strip_lib_prefix(name: &str) -> &str {
    match name.strip_prefix("lib") {
        Some(rest) if !rest.is_empty() => rest,
        _ => name,
    }
}

fn insert_variable(
    variables: &mut HashMap<String, String>,
    line: &str,
    eq: usize,
    path: &Path,
    line_no: usize,
) -> Result<()> {
    let key = line[..eq].trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        anyhow::bail!(
            "{}:{}: invalid variable name `{}`",
            path.display(),
            line_no + 1,
            key
        );
    }
    let value = expand(&line[eq + 1..], variables);
    variables.insert(key.to_string(), value.trim().to_string());
    Ok(())
}

fn variable_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([A-Za-z0-9_.]+)\}").unwrap())
}

/// Substitute `${var}` references. Variables are defined before use, so
/// their stored values are already expanded; unknown ones become empty.
fn expand(value: &str, variables: &HashMap<String, String>) -> String {
    variable_pattern()
        .replace_all(value, |caps: &regex::Captures<'_>| {
            variables.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}

/// Join `\`-continued lines.
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending = String::new();

    for line in content.lines() {
        match line.strip_suffix('\\') {
            Some(head) => pending.push_str(head),
            None => {
                pending.push_str(line);
                lines.push(std::mem::take(&mut pending));
            }
        }
    }
    if !pending.is_empty() {
        lines.push(pending);
    }

    lines
}

/// `libavcodec >= 59, libavutil` -> `[libavcodec, libavutil]`
fn parse_requires(value: &str) -> Vec<String> {
    let mut modules = Vec::new();
    let mut tokens = value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty());

    while let Some(token) = tokens.next() {
        if matches!(token, "<" | "<=" | "=" | "!=" | ">=" | ">") {
            tokens.next();
            continue;
        }
        if !modules.iter().any(|m| m == token) {
            modules.push(token.to_string());
        }
    }

    modules
}
