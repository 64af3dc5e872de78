//! Output Formatting
//!
//! Terminal output for a finished session: one block per failure, the
//! measured values of passing checks, then the tally.

use crate::report::{CheckOutcome, OutcomeStatus, SessionReport};
use perftest_core::{Evaluation, Threshold, pp};

/// Format a report for human-readable terminal display
pub fn format_human_output(report: &SessionReport) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("perftest Results\n");
    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    for outcome in &report.outcomes {
        let status_icon = if outcome.status.is_passed() { "✓" } else { "✗" };
        output.push_str(&format!("  {} {}\n", status_icon, outcome.check));
        for evaluation in &outcome.evaluations {
            push_evaluation(&mut output, evaluation);
        }
    }

    let failures: Vec<&CheckOutcome> = report.failures().collect();
    if !failures.is_empty() {
        output.push_str("\nFailures\n");
        output.push_str(&"-".repeat(60));
        output.push('\n');
        for outcome in failures {
            push_failure(&mut output, outcome);
        }
    }

    let summary = &report.summary;
    output.push('\n');
    output.push_str(&"=".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "Out of {} tests, {} passed and {} failed\n",
        summary.total, summary.passed, summary.failed
    ));
    if summary.errored > 0 {
        output.push_str(&format!(
            "({} of the failures were errors, not limit violations)\n",
            summary.errored
        ));
    }
    output.push_str(&format!("Duration: {:.0} ms\n", summary.total_duration_ms));

    output.push_str("\nPassed:\n");
    for name in &summary.passed_checks {
        output.push_str(&format!("  {}\n", name));
    }
    output.push_str("\nFailed:\n");
    for name in &summary.failed_checks {
        output.push_str(&format!("  {}\n", name));
    }

    output
}

fn push_evaluation(output: &mut String, evaluation: &Evaluation) {
    let values: Vec<String> = evaluation
        .measured
        .iter()
        .map(|m| {
            let (name, unit) = match m.threshold {
                Threshold::Raw => (m.statistic.name(), evaluation.kind.unit()),
                Threshold::Relative => (m.statistic.relative_name(), ""),
            };
            format!(
                "{} = {}{} (limit {})",
                name,
                pp(m.measured, evaluation.digits),
                unit,
                pp(m.limit, evaluation.digits)
            )
        })
        .collect();
    output.push_str(&format!(
        "      {} {}: {}\n",
        evaluation.kind,
        evaluation.function,
        values.join(", ")
    ));
}

fn push_failure(output: &mut String, outcome: &CheckOutcome) {
    match &outcome.status {
        OutcomeStatus::Passed => {}
        OutcomeStatus::LimitViolated(violation) => {
            let kind = outcome.status.kind_name().unwrap_or("Error");
            output.push_str(&format!("{} in {}\n", kind, violation.checker));
            output.push_str(&format!("    function: {}\n", violation.function));
            for failure in &violation.failures {
                let unit = match failure.threshold {
                    Threshold::Raw => violation.kind.unit(),
                    Threshold::Relative => "",
                };
                output.push_str(&format!(
                    "    {} = {}, {} = {}{}\n",
                    failure.threshold.name(),
                    pp(failure.limit, violation.digits),
                    failure.statistic_name(),
                    pp(failure.measured, violation.digits),
                    unit
                ));
            }
        }
        OutcomeStatus::Errored(info) => {
            output.push_str(&format!("{} in {}\n", info.kind, outcome.check));
            output.push_str(&format!("    error: {}\n", info.message));
        }
    }
    output.push_str(&format!("    at {}:{}\n", outcome.file, outcome.line));
}
