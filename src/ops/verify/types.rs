//! Public types for the verification harness.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::core::mode::DistributionMode;
use crate::ops::generate::GenerateRequest;

/// Language of the consumer program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    Cxx,
}

impl Language {
    /// CMake `project(... LANGUAGES ...)` value.
    pub fn cmake_languages(&self) -> &'static str {
        match self {
            Language::C => "C",
            Language::Cxx => "C CXX",
        }
    }

    /// Guess from a source file extension; anything but `.c` is C++.
    pub fn from_source(path: &std::path::Path) -> Language {
        match path.extension().and_then(|e| e.to_str()) {
            Some("c") => Language::C,
            _ => Language::Cxx,
        }
    }
}

/// The consumer program and what it must print.
#[derive(Debug, Clone)]
pub struct HarnessSpec {
    /// A directory holding `main.cpp` / `main.c`, or a single source file
    pub consumer: PathBuf,
    /// Substrings every one of which must appear in stdout
    pub markers: Vec<String>,
    /// Detected from the source file when absent
    pub language: Option<Language>,
}

impl HarnessSpec {
    pub fn new(consumer: impl Into<PathBuf>) -> Self {
        HarnessSpec {
            consumer: consumer.into(),
            markers: Vec::new(),
            language: None,
        }
    }

    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.markers.push(marker.into());
        self
    }
}

/// Options for `depconf verify`.
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    pub request: GenerateRequest,
    pub harness: HarnessSpec,
    /// Scratch directory for the consumer build (default: a temp dir)
    pub work_dir: Option<PathBuf>,
    /// CMake executable (default: `DEPCONF_CMAKE`, then `PATH`)
    pub cmake: Option<PathBuf>,
}

impl VerifyOptions {
    pub fn new(request: GenerateRequest, harness: HarnessSpec) -> Self {
        VerifyOptions {
            request,
            harness,
            work_dir: None,
            cmake: None,
        }
    }
}

/// Result of a verification step.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyStep {
    pub name: String,

    pub passed: bool,

    pub message: String,

    /// Milliseconds in JSON
    #[serde(serialize_with = "serialize_duration_ms")]
    pub duration: Duration,

    /// Passed, but with something to note
    pub warnings: Vec<String>,
}

fn serialize_duration_ms<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}

impl VerifyStep {
    pub fn pass(name: impl Into<String>, message: impl Into<String>, duration: Duration) -> Self {
        VerifyStep {
            name: name.into(),
            passed: true,
            message: message.into(),
            duration,
            warnings: Vec::new(),
        }
    }

    pub fn fail(name: impl Into<String>, message: impl Into<String>, duration: Duration) -> Self {
        VerifyStep {
            name: name.into(),
            passed: false,
            message: message.into(),
            duration,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// Complete verification result.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyResult {
    pub dependency: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<DistributionMode>,

    /// Qualified handle the consumer linked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,

    pub steps: Vec<VerifyStep>,

    #[serde(serialize_with = "serialize_duration_ms")]
    pub total_duration: Duration,

    /// Passes only if every step passed
    pub passed: bool,
}

impl VerifyResult {
    pub fn new(dependency: impl Into<String>) -> Self {
        VerifyResult {
            dependency: dependency.into(),
            mode: None,
            handle: None,
            steps: Vec::new(),
            total_duration: Duration::ZERO,
            passed: true,
        }
    }

    pub fn add_step(&mut self, step: VerifyStep) {
        if !step.passed {
            self.passed = false;
        }
        self.steps.push(step);
    }

    pub fn passed_count(&self) -> usize {
        self.steps.iter().filter(|s| s.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.steps.iter().filter(|s| !s.passed).count()
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.steps
            .iter()
            .flat_map(|s| s.warnings.iter().map(|w| w.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_verify_result_failed() {
        let mut result = VerifyResult::new("x264");
        result.add_step(VerifyStep::pass("configure", "ok", Duration::ZERO));
        result.add_step(VerifyStep::fail("build", "error", Duration::ZERO));

        assert!(!result.passed);
        assert_eq!(result.passed_count(), 1);
        assert_eq!(result.failed_count(), 1);
    }

    #[test]
    fn test_step_warnings() {
        let mut result = VerifyResult::new("eigen");
        result.add_step(
            VerifyStep::pass("markers", "no markers", Duration::ZERO)
                .with_warning("nothing checked beyond the exit status"),
        );
        assert!(result.passed);
        assert_eq!(result.warnings().len(), 1);
    }

    #[test]
    fn test_language_from_source() {
        assert_eq!(Language::from_source(Path::new("main.c")), Language::C);
        assert_eq!(Language::from_source(Path::new("main.cpp")), Language::Cxx);
        assert_eq!(Language::from_source(Path::new("main.cc")), Language::Cxx);
    }

    #[test]
    fn test_json_duration_in_millis() {
        let step = VerifyStep::pass("run", "ok", Duration::from_millis(1500));
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["duration"], 1500);
    }
}
