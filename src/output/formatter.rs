//! Core formatting traits and implementations
//!
//! This module defines the output formatting interface and provides
//! a plain text implementation with table formatting capabilities.

use crate::{
    calibration::{round_ping, round_speed},
    error::Result,
    models::{PhaseResult, TestRun, TestSnapshot},
    types::{MeasurementKind, PhaseStatus, TestPhase},
};
use std::fmt::Write as _;

/// Shown for a phase that produced no value
pub const FAILED_PLACEHOLDER: &str = "Failed";

/// Shown for a phase that has not run yet
pub const PENDING_PLACEHOLDER: &str = "--";

/// The three measurements in display order
pub const DISPLAY_ORDER: [MeasurementKind; 3] = [
    MeasurementKind::Ping,
    MeasurementKind::Download,
    MeasurementKind::Upload,
];

/// Main trait for output formatting
pub trait OutputFormatter {
    /// Format a header section
    fn format_header(&self, title: &str) -> Result<String>;

    /// Format a live progress line
    fn format_progress(&self, snapshot: &TestSnapshot) -> Result<String>;

    /// Format the results of a completed run
    fn format_results(&self, run: &TestRun) -> Result<String>;

    /// Format error messages
    fn format_error(&self, error: &str) -> Result<String>;

    /// Format warning messages
    fn format_warning(&self, warning: &str) -> Result<String>;

    /// Format success messages
    fn format_success(&self, message: &str) -> Result<String>;
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    /// Enable colored output
    pub enable_color: bool,
    /// Show raw measurements next to calibrated values
    pub show_raw: bool,
    /// Show timings and error details
    pub verbose_mode: bool,
    /// Show table borders
    pub table_borders: bool,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            show_raw: false,
            verbose_mode: false,
            table_borders: true,
        }
    }
}

/// Table formatting configuration
#[derive(Debug, Clone)]
pub struct TableFormat {
    /// Column definitions
    pub columns: Vec<Column>,
    /// Show borders around table
    pub show_borders: bool,
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    /// Column header
    pub header: String,
    /// Column alignment
    pub alignment: Alignment,
    /// Minimum width
    pub min_width: usize,
}

impl Column {
    pub fn new(header: &str, alignment: Alignment, min_width: usize) -> Self {
        Self {
            header: header.to_string(),
            alignment,
            min_width,
        }
    }
}

/// Text alignment options
#[derive(Debug, Clone)]
pub enum Alignment {
    Left,
    Right,
    Center,
}

/// Row data for table formatting
pub type RowData = Vec<String>;

/// Calibrated value of a phase ready for display, placeholder otherwise
pub fn display_value(kind: MeasurementKind, result: &PhaseResult) -> String {
    match (result.status, result.calibrated_value) {
        (PhaseStatus::Success, Some(value)) => format_measurement(kind, value),
        (PhaseStatus::Pending, _) => PENDING_PLACEHOLDER.to_string(),
        _ => FAILED_PLACEHOLDER.to_string(),
    }
}

/// Raw value of a phase, placeholder when absent
pub fn display_raw_value(kind: MeasurementKind, result: &PhaseResult) -> String {
    match result.raw_value {
        Some(raw) => match kind {
            MeasurementKind::Ping => format!("{:.1} ms", raw),
            MeasurementKind::Download | MeasurementKind::Upload => format!("{:.2} Mbps", raw),
        },
        None => PENDING_PLACEHOLDER.to_string(),
    }
}

/// Calibrated value with its unit, rounded the way users see it
pub fn format_measurement(kind: MeasurementKind, value: f64) -> String {
    match kind {
        MeasurementKind::Ping => format!("{:.0} ms", round_ping(value)),
        MeasurementKind::Download | MeasurementKind::Upload => {
            format!("{:.2} Mbps", round_speed(value))
        }
    }
}

/// Snapshot value with its unit, placeholder when absent
pub fn format_snapshot_value(kind: MeasurementKind, snapshot: &TestSnapshot) -> String {
    snapshot
        .value(kind)
        .map(|value| format_measurement(kind, value))
        .unwrap_or_else(|| PENDING_PLACEHOLDER.to_string())
}

/// Short status label of a phase
pub fn status_label(status: PhaseStatus) -> &'static str {
    match status {
        PhaseStatus::Pending => "pending",
        PhaseStatus::Success => "ok",
        PhaseStatus::Failed => "failed",
        PhaseStatus::Timeout => "timeout",
    }
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    /// Create a new plain formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    /// Formatting options in use
    pub fn options(&self) -> &FormattingOptions {
        &self.options
    }

    /// Columns and rows of the results table
    pub fn results_table(&self, run: &TestRun) -> (TableFormat, Vec<RowData>) {
        let mut columns = vec![
            Column::new("Test", Alignment::Left, 8),
            Column::new("Result", Alignment::Right, 12),
        ];
        if self.options.show_raw {
            columns.push(Column::new("Raw", Alignment::Right, 12));
        }
        if self.options.verbose_mode {
            columns.push(Column::new("Time", Alignment::Right, 8));
            columns.push(Column::new("Status", Alignment::Left, 7));
        }

        let rows = DISPLAY_ORDER
            .iter()
            .map(|&kind| {
                let result = run.result(kind);
                let mut row = vec![kind.label().to_string(), display_value(kind, result)];
                if self.options.show_raw {
                    row.push(display_raw_value(kind, result));
                }
                if self.options.verbose_mode {
                    row.push(
                        result
                            .elapsed_ms()
                            .map(|ms| format!("{:.0} ms", ms))
                            .unwrap_or_else(|| PENDING_PLACEHOLDER.to_string()),
                    );
                    row.push(status_label(result.status).to_string());
                }
                row
            })
            .collect();

        (
            TableFormat {
                columns,
                show_borders: self.options.table_borders,
            },
            rows,
        )
    }

    /// Create a table with the given format and data
    pub fn create_table(&self, format: &TableFormat, rows: &[RowData]) -> String {
        self.create_styled_table(format, rows, |_, _, cell| cell)
    }

    /// Create a table, passing each padded body cell through `style`
    ///
    /// `style` receives the row index, the column index and the padded cell text.
    pub fn create_styled_table<F>(&self, format: &TableFormat, rows: &[RowData], style: F) -> String
    where
        F: Fn(usize, usize, String) -> String,
    {
        if rows.is_empty() {
            return String::new();
        }

        let column_widths = self.calculate_column_widths(format, rows);

        let mut output = String::new();

        if !format.columns.is_empty() {
            if format.show_borders {
                output.push_str(&self.create_horizontal_border(&column_widths));
                output.push('\n');
            }

            let headers: Vec<String> = format.columns.iter().map(|c| c.header.clone()).collect();
            output.push_str(&self.create_row(&headers, &column_widths, format, &|_: usize, cell: String| cell));
            output.push('\n');

            if format.show_borders {
                output.push_str(&self.create_horizontal_border(&column_widths));
                output.push('\n');
            }
        }

        for (row_idx, row) in rows.iter().enumerate() {
            let style_cell = |col_idx: usize, cell: String| style(row_idx, col_idx, cell);
            output.push_str(&self.create_row(row, &column_widths, format, &style_cell));
            output.push('\n');
        }

        if format.show_borders {
            output.push_str(&self.create_horizontal_border(&column_widths));
        }

        output
    }

    /// Calculate column widths from headers and content
    fn calculate_column_widths(&self, format: &TableFormat, rows: &[RowData]) -> Vec<usize> {
        let num_columns = format.columns.len().max(
            rows.iter().map(|r| r.len()).max().unwrap_or(0)
        );

        (0..num_columns)
            .map(|col_idx| {
                let base = format
                    .columns
                    .get(col_idx)
                    .map(|c| c.min_width.max(c.header.len()))
                    .unwrap_or(0);

                rows.iter()
                    .filter_map(|row| row.get(col_idx))
                    .map(|cell| cell.chars().count())
                    .fold(base, usize::max)
            })
            .collect()
    }

    /// Create a table row
    fn create_row(
        &self,
        data: &[String],
        widths: &[usize],
        format: &TableFormat,
        style: &dyn Fn(usize, String) -> String,
    ) -> String {
        let mut row = String::new();

        if format.show_borders {
            row.push('|');
        }

        for (idx, (cell, &width)) in data.iter().zip(widths.iter()).enumerate() {
            let alignment = format
                .columns
                .get(idx)
                .map(|c| &c.alignment)
                .unwrap_or(&Alignment::Left);

            if format.show_borders {
                row.push(' ');
            }
            row.push_str(&style(idx, align_text(cell, width, alignment)));
            if format.show_borders {
                row.push_str(" |");
            } else {
                row.push_str("  ");
            }
        }

        row.trim_end().to_string()
    }

    /// Create horizontal border for table
    fn create_horizontal_border(&self, widths: &[usize]) -> String {
        let mut border = String::new();

        if !widths.is_empty() {
            border.push('+');
            for &width in widths {
                border.push_str(&"-".repeat(width + 2));
                border.push('+');
            }
        }

        border
    }
}

/// Align text within specified width
pub fn align_text(text: &str, width: usize, alignment: &Alignment) -> String {
    match alignment {
        Alignment::Left => format!("{:<width$}", text, width = width),
        Alignment::Right => format!("{:>width$}", text, width = width),
        Alignment::Center => format!("{:^width$}", text, width = width),
    }
}

/// Progress line shared by the text formatters
pub fn progress_line(snapshot: &TestSnapshot) -> String {
    let mut line = format!("[{:>3}%] {}", snapshot.progress, snapshot.phase.status_text());

    if snapshot.phase != TestPhase::Ping {
        let _ = write!(
            line,
            "  ping {} | down {} | up {}",
            format_snapshot_value(MeasurementKind::Ping, snapshot),
            format_snapshot_value(MeasurementKind::Download, snapshot),
            format_snapshot_value(MeasurementKind::Upload, snapshot),
        );
    }

    line
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        Ok(format!("{}\n{}", title, "=".repeat(title.len())))
    }

    fn format_progress(&self, snapshot: &TestSnapshot) -> Result<String> {
        Ok(progress_line(snapshot))
    }

    fn format_results(&self, run: &TestRun) -> Result<String> {
        let (format, rows) = self.results_table(run);
        let mut output = self.create_table(&format, &rows);

        if self.options.verbose_mode {
            for kind in DISPLAY_ORDER {
                if let Some(ref message) = run.result(kind).error_message {
                    let _ = write!(output, "\n{}: {}", kind.label(), message);
                }
            }
            if let Some(duration) = run.duration() {
                let _ = write!(output, "\nTotal time: {:.1}s", duration.num_milliseconds() as f64 / 1000.0);
            }
        }

        Ok(output)
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("ERROR: {}", error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("WARNING: {}", warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("SUCCESS: {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::time::Duration;

    fn completed_run() -> TestRun {
        let mut run = TestRun::new();
        run.phase = TestPhase::Complete;
        run.progress = 100;
        run.ping = PhaseResult::measured(122.0, Some(7.32), Duration::from_millis(122));
        run.download = PhaseResult::measured(27.51, Some(385.1428), Duration::from_millis(1454));
        run.upload = PhaseResult::failed(&AppError::http_status(500));
        run
    }

    fn plain(show_raw: bool, verbose_mode: bool) -> PlainFormatter {
        PlainFormatter::new(FormattingOptions {
            enable_color: false,
            show_raw,
            verbose_mode,
            table_borders: true,
        })
    }

    #[test]
    fn test_display_values() {
        let run = completed_run();
        assert_eq!(display_value(MeasurementKind::Ping, &run.ping), "7 ms");
        assert_eq!(display_value(MeasurementKind::Download, &run.download), "385.14 Mbps");
        assert_eq!(display_value(MeasurementKind::Upload, &run.upload), FAILED_PLACEHOLDER);
        assert_eq!(display_value(MeasurementKind::Upload, &PhaseResult::pending()), PENDING_PLACEHOLDER);
        assert_eq!(display_raw_value(MeasurementKind::Download, &run.download), "27.51 Mbps");
    }

    #[test]
    fn test_results_table() {
        let output = plain(false, false).format_results(&completed_run()).unwrap();

        assert!(output.contains("| Ping"));
        assert!(output.contains("7 ms |"));
        assert!(output.contains("385.14 Mbps |"));
        assert!(output.contains("Failed |"));
        assert!(!output.contains("Raw"));
        assert!(output.starts_with('+'));
    }

    #[test]
    fn test_results_table_with_raw_and_verbose() {
        let output = plain(true, true).format_results(&completed_run()).unwrap();

        assert!(output.contains("Raw"));
        assert!(output.contains("122.0 ms"));
        assert!(output.contains("1454 ms"));
        assert!(output.contains("failed"));
        assert!(output.contains("Upload: Unexpected HTTP status: 500"));
    }

    #[test]
    fn test_progress_line() {
        let mut run = completed_run();
        run.phase = TestPhase::Upload;
        run.progress = 60;
        run.upload = PhaseResult::pending();

        let line = progress_line(&run.snapshot());
        assert!(line.starts_with("[ 60%] Testing upload speed..."));
        assert!(line.contains("ping 7 ms"));
        assert!(line.contains("down 385.14 Mbps"));
        assert!(line.contains("up --"));
    }

    #[test]
    fn test_align_text() {
        assert_eq!(align_text("ab", 4, &Alignment::Left), "ab  ");
        assert_eq!(align_text("ab", 4, &Alignment::Right), "  ab");
        assert_eq!(align_text("ab", 4, &Alignment::Center), " ab ");
    }

    #[test]
    fn test_message_formatting() {
        let formatter = plain(false, false);
        assert_eq!(formatter.format_error("boom").unwrap(), "ERROR: boom");
        assert_eq!(formatter.format_warning("careful").unwrap(), "WARNING: careful");
        assert_eq!(formatter.format_header("Results").unwrap(), "Results\n=======");
    }
}
