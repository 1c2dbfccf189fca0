//! Output formatting and display system
//!
//! This module provides a flexible output formatting system for test results,
//! supporting colored, plain text and JSON output.

mod formatter;
mod colored;
mod json;

pub use formatter::{
    align_text,
    display_raw_value,
    display_value,
    format_measurement,
    progress_line,
    Alignment,
    Column,
    FormattingOptions,
    OutputFormatter,
    PlainFormatter,
    RowData,
    TableFormat,
    FAILED_PLACEHOLDER,
    PENDING_PLACEHOLDER,
};
pub use colored::{
    ColoredFormatter,
    ColorScheme,
    SpeedLevel,
};
pub use json::{JsonFormatter, PhaseReport, RunReport};

use crate::{
    error::Result,
    models::{Config, TestRun, TestSnapshot},
};

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Formatting options derived from the configuration
    pub fn options(config: &Config) -> FormattingOptions {
        FormattingOptions {
            enable_color: config.enable_color,
            show_raw: config.show_raw,
            verbose_mode: config.verbose,
            table_borders: true,
        }
    }

    /// Create the formatter the configuration asks for
    pub fn create_formatter(config: &Config) -> Box<dyn OutputFormatter + Send + Sync> {
        if config.json_output {
            Box::new(JsonFormatter::new(true))
        } else if config.enable_color {
            Box::new(ColoredFormatter::new(Self::options(config)))
        } else {
            Box::new(PlainFormatter::new(Self::options(config)))
        }
    }
}

/// Main output coordinator that handles all result display
pub struct OutputCoordinator {
    formatter: Box<dyn OutputFormatter + Send + Sync>,
    json: bool,
}

impl OutputCoordinator {
    /// Create a coordinator for the given configuration
    pub fn new(config: &Config) -> Self {
        Self {
            formatter: OutputFormatterFactory::create_formatter(config),
            json: config.json_output,
        }
    }

    /// Render the final results of a run
    pub fn display_results(&self, run: &TestRun) -> Result<String> {
        if self.json {
            return self.formatter.format_results(run);
        }

        let mut output = String::new();
        output.push_str(&self.formatter.format_header("Speed Test Results")?);
        output.push_str("\n\n");
        output.push_str(&self.formatter.format_results(run)?);

        let succeeded = run.successful_phases();
        output.push_str("\n\n");
        if succeeded == 3 {
            output.push_str(&self.formatter.format_success("All measurements completed")?);
        } else if succeeded == 0 {
            output.push_str(&self.formatter.format_error("No measurement succeeded")?);
        } else {
            output.push_str(
                &self
                    .formatter
                    .format_warning(&format!("{} of 3 measurements completed", succeeded))?,
            );
        }

        Ok(output)
    }

    /// Render a progress update
    pub fn display_progress(&self, snapshot: &TestSnapshot) -> Result<String> {
        self.formatter.format_progress(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::PhaseResult;
    use crate::types::TestPhase;
    use std::time::Duration;

    fn run_with(upload: PhaseResult) -> TestRun {
        let mut run = TestRun::new();
        run.phase = TestPhase::Complete;
        run.progress = 100;
        run.ping = PhaseResult::measured(122.0, Some(7.0), Duration::from_millis(122));
        run.download = PhaseResult::measured(27.53, Some(384.9), Duration::from_millis(1454));
        run.upload = upload;
        run
    }

    fn plain_config() -> Config {
        Config {
            enable_color: false,
            ..Config::default()
        }
    }

    #[test]
    fn test_plain_results_with_summary() {
        let coordinator = OutputCoordinator::new(&plain_config());
        let run = run_with(PhaseResult::measured(8.0, Some(17.2), Duration::from_millis(500)));
        let output = coordinator.display_results(&run).unwrap();

        assert!(output.starts_with("Speed Test Results"));
        assert!(output.contains("384.90 Mbps"));
        assert!(output.ends_with("SUCCESS: All measurements completed"));
    }

    #[test]
    fn test_partial_results_warn() {
        let coordinator = OutputCoordinator::new(&plain_config());
        let run = run_with(PhaseResult::failed(&AppError::http_status(503)));
        let output = coordinator.display_results(&run).unwrap();

        assert!(output.contains("WARNING: 2 of 3 measurements completed"));
    }

    #[test]
    fn test_progress_line_follows_snapshot() {
        let coordinator = OutputCoordinator::new(&plain_config());
        let mut run = run_with(PhaseResult::default());
        run.phase = TestPhase::Download;
        run.progress = 20;
        run.download = PhaseResult::default();

        let line = coordinator.display_progress(&run.snapshot()).unwrap();
        assert!(line.starts_with("[ 20%]"));
        assert!(line.contains("down --"));
        assert!(!line.contains('\x1b'));
    }

    #[test]
    fn test_json_results_are_bare_document() {
        let config = Config {
            json_output: true,
            ..plain_config()
        };
        let run = run_with(PhaseResult::failed(&AppError::http_status(503)));
        let output = OutputCoordinator::new(&config).display_results(&run).unwrap();

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["uploadPhase"]["status"], "failed");
    }
}
