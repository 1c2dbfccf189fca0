//! Colored formatter implementation with terminal color support
//!
//! Wraps the plain table layout and colors each value by how good it is.

use crate::{
    error::Result,
    models::{PhaseResult, TestRun, TestSnapshot},
    types::{MeasurementKind, PhaseStatus},
};
use super::formatter::{
    format_snapshot_value, FormattingOptions, OutputFormatter, PlainFormatter, DISPLAY_ORDER,
};
use colored::*;
use std::fmt::Write as _;

/// Quality classification of a calibrated value for color coding
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeedLevel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl SpeedLevel {
    /// Classify a latency in milliseconds
    pub fn from_ping(ms: f64) -> Self {
        if ms < 20.0 {
            Self::Excellent
        } else if ms < 50.0 {
            Self::Good
        } else if ms < 100.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    /// Classify a throughput in Mbps
    pub fn from_throughput(mbps: f64) -> Self {
        if mbps >= 500.0 {
            Self::Excellent
        } else if mbps >= 100.0 {
            Self::Good
        } else if mbps >= 25.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    /// Classify a value of the given kind
    pub fn classify(kind: MeasurementKind, value: f64) -> Self {
        match kind {
            MeasurementKind::Ping => Self::from_ping(value),
            MeasurementKind::Download | MeasurementKind::Upload => Self::from_throughput(value),
        }
    }

    /// Get color for this level
    pub fn color(&self) -> Color {
        match self {
            Self::Excellent => Color::Green,
            Self::Good => Color::Cyan,
            Self::Fair => Color::Yellow,
            Self::Poor => Color::Red,
        }
    }

    /// Get descriptive text
    pub fn description(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            muted: Color::BrightBlack,
        }
    }
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    plain_formatter: PlainFormatter,
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    /// Create a new colored formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self::with_color_scheme(options, ColorScheme::default())
    }

    /// Create a colored formatter with custom color scheme
    pub fn with_color_scheme(options: FormattingOptions, color_scheme: ColorScheme) -> Self {
        let plain_formatter = PlainFormatter::new(FormattingOptions {
            enable_color: false,
            ..options.clone()
        });
        Self {
            plain_formatter,
            options,
            color_scheme,
        }
    }

    /// Apply color to text if colors are enabled
    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    /// Apply bold formatting if colors are enabled
    fn bold(&self, text: &str) -> ColoredString {
        if self.options.enable_color {
            text.bold()
        } else {
            text.normal()
        }
    }

    /// Bold and colored if colors are enabled
    fn emphasize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color).bold()
        } else {
            text.normal()
        }
    }

    /// Color a displayed value cell by the quality of the result
    fn colored_value(&self, kind: MeasurementKind, result: &PhaseResult, text: &str) -> String {
        match (result.status, result.calibrated_value) {
            (PhaseStatus::Success, Some(value)) => {
                self.emphasize(text, SpeedLevel::classify(kind, value).color()).to_string()
            }
            (PhaseStatus::Pending, _) => self.colorize(text, self.color_scheme.muted).to_string(),
            _ => self.colorize(text, self.color_scheme.error).to_string(),
        }
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let underline = "=".repeat(title.len());
        Ok(format!(
            "{}\n{}",
            self.emphasize(title, self.color_scheme.header),
            self.colorize(&underline, self.color_scheme.muted)
        ))
    }

    fn format_progress(&self, snapshot: &TestSnapshot) -> Result<String> {
        let mut line = format!(
            "{} {}",
            self.colorize(&format!("[{:>3}%]", snapshot.progress), self.color_scheme.header),
            snapshot.phase.status_text()
        );

        for kind in DISPLAY_ORDER {
            if let Some(value) = snapshot.value(kind) {
                let text = format_snapshot_value(kind, snapshot);
                let _ = write!(
                    line,
                    "  {} {}",
                    self.colorize(kind.label(), self.color_scheme.muted),
                    self.colorize(&text, SpeedLevel::classify(kind, value).color())
                );
            }
        }

        Ok(line)
    }

    fn format_results(&self, run: &TestRun) -> Result<String> {
        if !self.options.enable_color {
            return self.plain_formatter.format_results(run);
        }

        let (format, rows) = self.plain_formatter.results_table(run);
        let raw_column = self.options.show_raw.then_some(2);
        let status_column = self
            .options
            .verbose_mode
            .then(|| if self.options.show_raw { 4 } else { 3 });

        let mut output = self.plain_formatter.create_styled_table(&format, &rows, |row_idx, col_idx, cell| {
            let kind = DISPLAY_ORDER[row_idx];
            let result = run.result(kind);
            if col_idx == 1 {
                self.colored_value(kind, result, &cell)
            } else if Some(col_idx) == raw_column {
                self.colorize(&cell, self.color_scheme.muted).to_string()
            } else if Some(col_idx) == status_column {
                let color = match result.status {
                    PhaseStatus::Success => self.color_scheme.success,
                    PhaseStatus::Pending => self.color_scheme.muted,
                    PhaseStatus::Timeout => self.color_scheme.warning,
                    PhaseStatus::Failed => self.color_scheme.error,
                };
                self.colorize(&cell, color).to_string()
            } else {
                cell
            }
        });

        if self.options.verbose_mode {
            for kind in DISPLAY_ORDER {
                if let Some(ref message) = run.result(kind).error_message {
                    let _ = write!(output, "\n{}: {}", self.bold(kind.label()), self.colorize(message, self.color_scheme.error));
                }
            }
            if let Some(duration) = run.duration() {
                let total = format!("Total time: {:.1}s", duration.num_milliseconds() as f64 / 1000.0);
                let _ = write!(output, "\n{}", self.colorize(&total, self.color_scheme.muted));
            }
        }

        Ok(output)
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("{} {}", self.emphasize("✗", self.color_scheme.error), self.colorize(error, self.color_scheme.error)))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("{} {}", self.emphasize("⚠", self.color_scheme.warning), self.colorize(warning, self.color_scheme.warning)))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("{} {}", self.emphasize("✓", self.color_scheme.success), self.colorize(message, self.color_scheme.success)))
    }
}
