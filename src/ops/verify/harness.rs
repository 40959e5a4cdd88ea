//! Consumer project generation and execution.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};

use super::types::{HarnessSpec, Language, VerifyStep};
use crate::util::fs::{ensure_dir, to_forward_slashes, write_string};
use crate::util::process::{find_cmake, ProcessBuilder, ProcessOutput};

/// Name of the consumer executable target.
pub const CONSUMER_TARGET: &str = "depconf_consumer";

/// Runs external commands. Tests substitute a scripted runner.
pub trait CommandRunner {
    fn run(&mut self, program: &Path, args: &[String]) -> Result<ProcessOutput>;
}

/// Runs commands for real.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, program: &Path, args: &[String]) -> Result<ProcessOutput> {
        let cmd = ProcessBuilder::new(program).args(args);
        tracing::debug!("running {}", cmd.display_command());
        cmd.exec()
    }
}

/// What the harness needs to know about the generated document.
#[derive(Debug, Clone)]
pub struct ConsumerTarget {
    /// Package name passed to `find_package`
    pub package: String,
    /// Directory holding `<package>Config.cmake`
    pub config_dir: PathBuf,
    /// Qualified target to link
    pub handle: String,
}

/// Resolve the consumer's source files and language.
pub fn consumer_sources(spec: &HarnessSpec) -> Result<(Vec<PathBuf>, Language)> {
    let consumer = &spec.consumer;
    let sources = if consumer.is_dir() {
        let found: Vec<PathBuf> = ["main.cpp", "main.cc", "main.cxx", "main.c"]
            .iter()
            .map(|name| consumer.join(name))
            .filter(|p| p.is_file())
            .take(1)
            .collect();
        if found.is_empty() {
            bail!(
                "no main.cpp or main.c in consumer directory {}",
                consumer.display()
            );
        }
        found
    } else if consumer.is_file() {
        vec![consumer.clone()]
    } else {
        bail!("consumer {} does not exist", consumer.display());
    };

    let sources = sources
        .into_iter()
        .map(|p| p.canonicalize().with_context(|| format!("failed to resolve {}", p.display())))
        .collect::<Result<Vec<_>>>()?;
    let language = spec
        .language
        .unwrap_or_else(|| Language::from_source(&sources[0]));
    Ok((sources, language))
}

/// The consumer's `CMakeLists.txt`.
pub fn consumer_cmakelists(target: &ConsumerTarget, sources: &[PathBuf], language: Language) -> String {
    let sources = sources
        .iter()
        .map(|s| format!("\"{}\"", to_forward_slashes(s)))
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "cmake_minimum_required(VERSION 3.16)\n\
         project(depconf_consumer LANGUAGES {languages})\n\
         \n\
         find_package({package} CONFIG REQUIRED PATHS \"{config_dir}\" NO_DEFAULT_PATH)\n\
         \n\
         add_executable({exe} {sources})\n\
         target_link_libraries({exe} PRIVATE {handle})\n",
        languages = language.cmake_languages(),
        package = target.package,
        config_dir = to_forward_slashes(&target.config_dir),
        exe = CONSUMER_TARGET,
        sources = sources,
        handle = target.handle,
    )
}

fn executable_path(build_dir: &Path) -> PathBuf {
    let name = format!("{}{}", CONSUMER_TARGET, std::env::consts::EXE_SUFFIX);
    // multi-config generators put it under the configuration directory
    let multi_config = build_dir.join("Debug").join(&name);
    if multi_config.is_file() {
        multi_config
    } else {
        build_dir.join(name)
    }
}

fn output_tail(output: &ProcessOutput) -> String {
    let text = if output.stderr.trim().is_empty() {
        &output.stdout
    } else {
        &output.stderr
    };
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(20);
    lines[start..].join("\n")
}

/// Locate CMake for the harness.
pub fn locate_cmake() -> Result<PathBuf> {
    find_cmake().context("cmake not found; install it or set DEPCONF_CMAKE")
}

/// Configure, build and run the consumer in `scratch`, then check markers.
/// Stops at the first failing step.
pub fn run_consumer(
    spec: &HarnessSpec,
    target: &ConsumerTarget,
    cmake: &Path,
    scratch: &Path,
    runner: &mut dyn CommandRunner,
) -> Vec<VerifyStep> {
    let mut steps = Vec::new();

    let start = Instant::now();
    let prepared = consumer_sources(spec).and_then(|(sources, language)| {
        ensure_dir(scratch)?;
        write_string(
            &scratch.join("CMakeLists.txt"),
            &consumer_cmakelists(target, &sources, language),
        )
    });
    if let Err(e) = prepared {
        steps.push(VerifyStep::fail("configure", format!("{:#}", e), start.elapsed()));
        return steps;
    }

    let build_dir = scratch.join("build");
    let commands: [(&str, Vec<String>); 2] = [
        (
            "configure",
            vec![
                "-S".to_string(),
                scratch.display().to_string(),
                "-B".to_string(),
                build_dir.display().to_string(),
            ],
        ),
        (
            "build",
            vec!["--build".to_string(), build_dir.display().to_string()],
        ),
    ];
    for (name, args) in commands {
        let start = Instant::now();
        match runner.run(cmake, &args) {
            Ok(output) if output.success() => {
                steps.push(VerifyStep::pass(name, format!("cmake {} succeeded", name), start.elapsed()));
            }
            Ok(output) => {
                steps.push(VerifyStep::fail(
                    name,
                    format!("cmake {} failed:\n{}", name, output_tail(&output)),
                    start.elapsed(),
                ));
                return steps;
            }
            Err(e) => {
                steps.push(VerifyStep::fail(name, format!("{:#}", e), start.elapsed()));
                return steps;
            }
        }
    }

    let start = Instant::now();
    let exe = executable_path(&build_dir);
    let stdout = match runner.run(&exe, &[]) {
        Ok(output) if output.success() => {
            steps.push(VerifyStep::pass("run", "consumer exited with 0", start.elapsed()));
            output.stdout
        }
        Ok(output) => {
            let code = output
                .code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "a signal".to_string());
            steps.push(VerifyStep::fail(
                "run",
                format!("consumer exited with {}:\n{}", code, output_tail(&output)),
                start.elapsed(),
            ));
            return steps;
        }
        Err(e) => {
            steps.push(VerifyStep::fail("run", format!("{:#}", e), start.elapsed()));
            return steps;
        }
    };

    steps.push(check_markers(&spec.markers, &stdout));
    steps
}

/// Every marker must appear in `stdout`.
pub fn check_markers(markers: &[String], stdout: &str) -> VerifyStep {
    let start = Instant::now();
    if markers.is_empty() {
        return VerifyStep::pass("markers", "no markers requested", start.elapsed())
            .with_warning("only the exit status was checked");
    }

    let missing: Vec<&str> = markers
        .iter()
        .filter(|m| !stdout.contains(m.as_str()))
        .map(|m| m.as_str())
        .collect();
    if missing.is_empty() {
        VerifyStep::pass(
            "markers",
            format!("found {} marker(s)", markers.len()),
            start.elapsed(),
        )
    } else {
        VerifyStep::fail(
            "markers",
            format!("missing from output: {}", missing.join(", ")),
            start.elapsed(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{InstallTree, MockExecutor};
    use tempfile::TempDir;

    fn target() -> ConsumerTarget {
        ConsumerTarget {
            package: "FFmpeg".to_string(),
            config_dir: PathBuf::from("/opt/ffmpeg/lib/cmake/FFmpeg"),
            handle: "FFmpeg::ffmpeg".to_string(),
        }
    }

    fn consumer() -> TempDir {
        InstallTree::new()
            .file("main.cpp", "int main() { return 0; }\n")
            .build()
    }

    #[test]
    fn test_consumer_cmakelists() {
        let text = consumer_cmakelists(&target(), &[PathBuf::from("/c/main.cpp")], Language::Cxx);
        assert!(text.contains("project(depconf_consumer LANGUAGES C CXX)"));
        assert!(text.contains(
            "find_package(FFmpeg CONFIG REQUIRED PATHS \"/opt/ffmpeg/lib/cmake/FFmpeg\" NO_DEFAULT_PATH)"
        ));
        assert!(text.contains("add_executable(depconf_consumer \"/c/main.cpp\")"));
        assert!(text.contains("target_link_libraries(depconf_consumer PRIVATE FFmpeg::ffmpeg)"));
    }

    #[test]
    fn test_consumer_sources() {
        let dir = consumer();
        let (sources, language) = consumer_sources(&HarnessSpec::new(dir.path())).unwrap();
        assert_eq!(sources.len(), 1);
        assert!(sources[0].ends_with("main.cpp"));
        assert_eq!(language, Language::Cxx);

        let empty = TempDir::new().unwrap();
        assert!(consumer_sources(&HarnessSpec::new(empty.path())).is_err());
        assert!(consumer_sources(&HarnessSpec::new(empty.path().join("nope.c"))).is_err());
    }

    #[test]
    fn test_markers() {
        let markers = vec!["Eigen 3".to_string(), "SUCCESS".to_string()];
        assert!(check_markers(&markers, "Eigen 3.4.0\nallocation SUCCESS\n").passed);

        let step = check_markers(&markers, "Eigen 3.4.0\n");
        assert!(!step.passed);
        assert!(step.message.contains("SUCCESS"));
    }

    #[test]
    fn test_run_consumer_all_steps_pass() {
        let dir = consumer();
        let scratch = TempDir::new().unwrap();
        let mut runner = MockExecutor::new()
            .expect_contains(" -S ", ProcessOutput::ok("-- Configuring done"))
            .expect_contains("--build", ProcessOutput::ok("[100%] Built target"))
            .expect_contains(CONSUMER_TARGET, ProcessOutput::ok("avcodec 59\nSUCCESS\n"));

        let spec = HarnessSpec::new(dir.path()).marker("SUCCESS");
        let steps = run_consumer(&spec, &target(), Path::new("cmake"), scratch.path(), &mut runner);

        let names: Vec<&str> = steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["configure", "build", "run", "markers"]);
        assert!(steps.iter().all(|s| s.passed));
        assert!(scratch.path().join("CMakeLists.txt").is_file());
        assert_eq!(runner.calls().len(), 3);
    }

    #[test]
    fn test_run_consumer_stops_at_failed_build() {
        let dir = consumer();
        let scratch = TempDir::new().unwrap();
        let mut runner = MockExecutor::new()
            .expect_contains(" -S ", ProcessOutput::ok(""))
            .expect_contains("--build", ProcessOutput::failed(2, "undefined reference to `x264_encoder_open'"));

        let steps = run_consumer(
            &HarnessSpec::new(dir.path()),
            &target(),
            Path::new("cmake"),
            scratch.path(),
            &mut runner,
        );

        assert_eq!(steps.len(), 2);
        assert!(!steps[1].passed);
        assert!(steps[1].message.contains("undefined reference"));
        assert_eq!(runner.calls().len(), 2);
    }
}
