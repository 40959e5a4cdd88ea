//! Output formatting for verification results.

use std::fmt::Write as _;

use super::types::VerifyResult;

/// Format a verification result for the terminal.
pub fn format_result(result: &VerifyResult, verbose: bool) -> String {
    let mut output = String::new();

    write!(output, "Verify: {}", result.dependency).unwrap();
    if let (Some(mode), Some(handle)) = (result.mode, &result.handle) {
        write!(output, " ({}, {})", handle, mode).unwrap();
    }
    writeln!(output).unwrap();
    writeln!(output, "{}", "=".repeat(50)).unwrap();
    writeln!(output).unwrap();

    for step in &result.steps {
        let status = if step.passed { "[OK]" } else { "[FAIL]" };
        writeln!(output, "  {} {} ({:.2?})", status, step.name, step.duration).unwrap();

        if verbose || !step.passed {
            for line in step.message.lines() {
                writeln!(output, "      {}", line).unwrap();
            }
        }
    }

    writeln!(output).unwrap();

    let status = if result.passed { "PASSED" } else { "FAILED" };
    writeln!(
        output,
        "Result: {} ({}/{} steps passed)",
        status,
        result.passed_count(),
        result.steps.len()
    )
    .unwrap();
    writeln!(output, "Total time: {:.2?}", result.total_duration).unwrap();

    let warnings = result.warnings();
    if !warnings.is_empty() {
        writeln!(output, "\nWarnings:").unwrap();
        for warning in warnings {
            writeln!(output, "  - {}", warning).unwrap();
        }
    }

    output
}

/// Format a verification result as JSON.
pub fn format_result_json(result: &VerifyResult) -> String {
    serde_json::to_string_pretty(result)
        .unwrap_or_else(|e| format!(r#"{{"error": "failed to serialize result: {}"}}"#, e))
}
