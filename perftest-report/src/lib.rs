#![warn(missing_docs)]
//! perftest Report
//!
//! Turns a finished session into output:
//! - Human-readable failure detail plus the end-of-run tally
//! - JSON (machine-readable)

mod human;
mod json;
mod report;

pub use human::format_human_output;
pub use json::generate_json_report;
pub use report::{
    CheckOutcome, ErrorInfo, OutcomeStatus, ReportMeta, ReportSummary, SessionReport,
};

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Human,
    /// Pretty-printed JSON
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Render `report` in the selected format
pub fn render(report: &SessionReport, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Human => Ok(format_human_output(report)),
        OutputFormat::Json => generate_json_report(report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("human".parse::<OutputFormat>(), Ok(OutputFormat::Human));
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("html".parse::<OutputFormat>().is_err());
    }
}
