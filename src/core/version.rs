//! Document version selection.
//!
//! Versions are free-form dotted numbers with an optional suffix
//! (`3.4.0`, `0.164.3095`, `1.2.3-rc1`, `2.0+git`).

use std::sync::OnceLock;

use regex::Regex;

/// Used when no valid version is declared anywhere.
pub const FALLBACK_VERSION: &str = "0.0.1";

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+(\.\d+)*([-+][A-Za-z0-9._]+)?$").unwrap())
}

pub fn is_valid_version(version: &str) -> bool {
    version_pattern().is_match(version)
}

/// The leading numeric part of a valid version (`1.2.3-rc1` -> `1.2.3`).
pub fn numeric_part(version: &str) -> &str {
    version
        .find(['-', '+'])
        .map(|i| &version[..i])
        .unwrap_or(version)
}

/// Pick the first declared version. An invalid pick is reported and
/// replaced by `fallback`, or [`FALLBACK_VERSION`] if that is invalid too.
pub fn resolve_version<'a>(
    candidates: impl IntoIterator<Item = Option<&'a str>>,
    fallback: Option<&str>,
) -> String {
    let fallback = fallback
        .filter(|v| is_valid_version(v))
        .unwrap_or(FALLBACK_VERSION);

    match candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
    {
        Some(version) if is_valid_version(version) => version.to_string(),
        Some(version) => {
            tracing::warn!("invalid version `{}`, using {}", version, fallback);
            fallback.to_string()
        }
        None => fallback.to_string(),
    }
}
