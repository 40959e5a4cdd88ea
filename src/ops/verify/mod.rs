//! Implementation of `depconf verify`.
//!
//! Generates the configuration for a dependency, then builds and runs a
//! small consumer program against it:
//! 1. Generate the package configuration
//! 2. Configure the consumer with `find_package(<ns> CONFIG REQUIRED)`
//! 3. Build it
//! 4. Run it and check the expected output markers

mod format;
mod harness;
mod types;

use std::time::Instant;

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::ops::generate::{generate, GenerateSettings};

pub use format::{format_result, format_result_json};
pub use harness::{
    check_markers, consumer_cmakelists, CommandRunner, ConsumerTarget, SystemRunner,
    CONSUMER_TARGET,
};
pub use types::{HarnessSpec, Language, VerifyOptions, VerifyResult, VerifyStep};

/// Generate, then build and run the consumer. Steps after the first failure
/// are not attempted.
pub fn verify(
    options: &VerifyOptions,
    settings: &GenerateSettings,
    runner: &mut dyn CommandRunner,
) -> Result<VerifyResult> {
    let start = Instant::now();
    let mut result = VerifyResult::new(&options.request.name);

    let mut request = options.request.clone();
    request.dry_run = false;

    let step_start = Instant::now();
    let outcome = match generate(&request, settings) {
        Ok(outcome) => outcome,
        Err(e) => {
            result.add_step(VerifyStep::fail("generate", e.to_string(), step_start.elapsed()));
            result.total_duration = start.elapsed();
            return Ok(result);
        }
    };
    result.mode = Some(outcome.mode);
    result.handle = Some(outcome.metadata.handle.clone());
    result.add_step(VerifyStep::pass(
        "generate",
        format!(
            "{} as {} ({} targets)",
            outcome.metadata.handle,
            outcome.mode,
            outcome.metadata.targets.len()
        ),
        step_start.elapsed(),
    ));

    let cmake = match &options.cmake {
        Some(cmake) => cmake.clone(),
        None => match harness::locate_cmake() {
            Ok(cmake) => cmake,
            Err(e) => {
                result.add_step(VerifyStep::fail("configure", format!("{:#}", e), start.elapsed()));
                result.total_duration = start.elapsed();
                return Ok(result);
            }
        },
    };

    // keep the temp dir alive until the consumer has run
    let _scratch_guard;
    let scratch = match &options.work_dir {
        Some(dir) => dir.clone(),
        None => {
            let tmp = TempDir::with_prefix("depconf-verify-")
                .context("failed to create scratch directory")?;
            let path = tmp.path().to_path_buf();
            _scratch_guard = tmp;
            path
        }
    };
    tracing::debug!("consumer scratch directory: {}", scratch.display());

    let target = ConsumerTarget {
        package: outcome.metadata.namespace.clone(),
        config_dir: outcome.document.destination.clone(),
        handle: outcome.metadata.handle.clone(),
    };
    for step in harness::run_consumer(&options.harness, &target, &cmake, &scratch, runner) {
        result.add_step(step);
    }

    result.total_duration = start.elapsed();
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::generate::GenerateRequest;
    use crate::test_support::{self, InstallTree, MockExecutor};
    use crate::util::process::ProcessOutput;
    use std::path::PathBuf;

    fn options(name: &str, root: &std::path::Path, consumer: &TempDir) -> VerifyOptions {
        let mut options = VerifyOptions::new(
            GenerateRequest::new(name, vec![root.to_path_buf()]),
            HarnessSpec::new(consumer.path()).marker("x264 164"),
        );
        options.cmake = Some(PathBuf::from("cmake"));
        options
    }

    fn consumer() -> TempDir {
        InstallTree::new()
            .file("main.c", "#include <x264.h>\nint main(void) { return 0; }\n")
            .build()
    }

    #[test]
    fn test_verify_passes() {
        let tree = test_support::x264();
        let consumer = consumer();
        let work = TempDir::new().unwrap();
        let mut options = options("x264", tree.path(), &consumer);
        options.work_dir = Some(work.path().to_path_buf());

        let mut runner = MockExecutor::new()
            .expect_contains(" -S ", ProcessOutput::ok(""))
            .expect_contains("--build", ProcessOutput::ok(""))
            .expect_contains(CONSUMER_TARGET, ProcessOutput::ok("x264 164\n"));

        let result = verify(&options, &GenerateSettings::default(), &mut runner).unwrap();
        assert!(result.passed, "{}", format_result(&result, true));
        assert_eq!(result.steps.len(), 5);
        assert_eq!(result.handle.as_deref(), Some("x264::x264"));

        let lists = std::fs::read_to_string(work.path().join("CMakeLists.txt")).unwrap();
        assert!(lists.contains("project(depconf_consumer LANGUAGES C)"));
        assert!(lists.contains("find_package(x264 CONFIG REQUIRED"));
        assert!(tree.path().join("lib/cmake/x264/x264Config.cmake").is_file());
    }

    #[test]
    fn test_generate_failure_stops_early() {
        let empty = TempDir::new().unwrap();
        let consumer = consumer();
        let options = options("ghost", empty.path(), &consumer);
        let mut runner = MockExecutor::new();

        let result = verify(&options, &GenerateSettings::default(), &mut runner).unwrap();
        assert!(!result.passed);
        assert_eq!(result.steps.len(), 1);
        assert_eq!(result.steps[0].name, "generate");
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_missing_marker_fails() {
        let tree = test_support::x264();
        let consumer = consumer();
        let options = options("x264", tree.path(), &consumer);
        let mut runner = MockExecutor::new()
            .expect_contains(" -S ", ProcessOutput::ok(""))
            .expect_contains("--build", ProcessOutput::ok(""))
            .expect_contains(CONSUMER_TARGET, ProcessOutput::ok("hello\n"));

        let result = verify(&options, &GenerateSettings::default(), &mut runner).unwrap();
        assert!(!result.passed);
        assert_eq!(result.failed_count(), 1);
        assert_eq!(result.steps.last().unwrap().name, "markers");
    }
}
