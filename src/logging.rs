//! Structured logging for the speed tester
//!
//! A run is logged as a sequence of entries that share the run ID as their
//! correlation ID: one when the run starts, one per phase start and finish,
//! and one when the run completes. Entries render either as console lines or
//! as JSON documents and are always written to stderr so that stdout only
//! carries results.

use crate::error::AppError;
use crate::models::{Config, PhaseResult, TestRun};
use crate::types::{MeasurementKind, PhaseStatus, TestPhase};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// ANSI color used for the level tag on a terminal
    fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Debug => "\x1b[36m",
            LogLevel::Info => "\x1b[32m",
            LogLevel::Warn => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// One structured log record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Component that produced the entry
    pub logger: String,
    /// Run ID shared by every entry of one run
    pub correlation_id: Option<String>,
    pub fields: HashMap<String, serde_json::Value>,
}

/// How entries are rendered
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Single human-readable line
    Console,
    /// One JSON document per line
    Json,
}

/// Leveled logger writing rendered entries to stderr
#[derive(Debug, Clone)]
pub struct Logger {
    name: String,
    min_level: LogLevel,
    format: LogFormat,
    use_color: bool,
}

impl Logger {
    pub fn new(name: &str, min_level: LogLevel, format: LogFormat, use_color: bool) -> Self {
        Self {
            name: name.to_string(),
            min_level,
            format,
            use_color,
        }
    }

    /// Level and format follow the verbosity flags: warnings by default,
    /// info with `--verbose`, debug entries as JSON with `--debug`.
    pub fn with_config(name: &str, config: &Config) -> Self {
        let (min_level, format) = if config.debug {
            (LogLevel::Debug, LogFormat::Json)
        } else if config.verbose {
            (LogLevel::Info, LogFormat::Console)
        } else {
            (LogLevel::Warn, LogFormat::Console)
        };

        Self::new(name, min_level, format, config.enable_color)
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    /// Start an entry at the given level
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder {
            logger: self,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message: message.to_string(),
                logger: self.name.clone(),
                correlation_id: None,
                fields: HashMap::new(),
            },
        }
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    fn write_entry(&self, entry: &LogEntry) {
        if !self.enabled(entry.level) {
            return;
        }
        let _ = writeln!(io::stderr(), "{}", self.render(entry));
    }

    /// Render an entry in the configured format
    pub fn render(&self, entry: &LogEntry) -> String {
        match self.format {
            LogFormat::Console => self.render_console(entry),
            LogFormat::Json => serde_json::to_string(entry).unwrap_or_else(|e| {
                format!("{{\"error\":\"unserializable log entry: {}\"}}", e)
            }),
        }
    }

    fn render_console(&self, entry: &LogEntry) -> String {
        let level = if self.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), entry.level.as_str(), RESET)
        } else {
            format!("{:>5}", entry.level.as_str())
        };

        let mut line = format!(
            "{} {} [{}] {}",
            entry.timestamp.format("%H:%M:%S%.3f"),
            level,
            entry.logger,
            entry.message
        );

        if let Some(id) = &entry.correlation_id {
            line.push_str(&format!(" [{}]", id.get(..8).unwrap_or(id)));
        }

        if !entry.fields.is_empty() {
            let mut fields: Vec<String> = entry.fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            fields.sort();
            line.push_str(&format!(" {{{}}}", fields.join(", ")));
        }

        line
    }
}

/// Accumulates fields for one entry until it is written
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl LogEntryBuilder<'_> {
    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Attach a field; values that fail to serialize are skipped
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Attach the measurement fields of a phase result
    pub fn phase_result(self, result: &PhaseResult) -> Self {
        self.field("raw_value", result.raw_value)
            .field("calibrated_value", result.calibrated_value)
            .field("status", result.status)
            .field("elapsed_ms", result.elapsed_ms())
    }

    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
    }

    pub fn log(self) {
        self.logger.write_entry(&self.entry);
    }
}

/// Logs the lifecycle of speed test runs
#[derive(Debug, Clone)]
pub struct SpeedTestLogger {
    logger: Logger,
}

impl SpeedTestLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("SPEED", config),
        }
    }

    /// Logger that only reports errors, used when no configuration is at hand
    pub fn quiet() -> Self {
        Self {
            logger: Logger::new("SPEED", LogLevel::Error, LogFormat::Console, false),
        }
    }

    pub fn log_run_started(&self, run: &TestRun) {
        self.logger.info("Speed test started")
            .correlation_id(&run.run_id.to_string())
            .field("phase", run.phase)
            .field("progress", run.progress)
            .log();
    }

    pub fn log_phase_started(&self, run: &TestRun, phase: TestPhase) {
        self.logger.debug(&format!("Phase started: {}", phase))
            .correlation_id(&run.run_id.to_string())
            .field("phase", phase)
            .field("progress", run.progress)
            .log();
    }

    /// Successful phases log at info with both values, failed ones warn
    pub fn log_phase_finished(&self, run: &TestRun, kind: MeasurementKind, result: &PhaseResult) {
        let (level, message) = if result.is_successful() {
            (
                LogLevel::Info,
                format!(
                    "{} measured: raw={:.2} {unit} calibrated={:.2} {unit}",
                    kind.label(),
                    result.raw_value.unwrap_or_default(),
                    result.calibrated_value.unwrap_or_default(),
                    unit = kind.unit()
                ),
            )
        } else {
            let outcome = if result.status == PhaseStatus::Timeout { "timed out" } else { "failed" };
            (
                LogLevel::Warn,
                format!(
                    "{} phase {}: {}",
                    kind.label(),
                    outcome,
                    result.error_message.as_deref().unwrap_or("unknown error")
                ),
            )
        };

        self.logger.log(level, &message)
            .correlation_id(&run.run_id.to_string())
            .field("measurement", kind)
            .field("progress", run.progress)
            .phase_result(result)
            .log();
    }

    pub fn log_run_completed(&self, run: &TestRun) {
        self.logger.info(&format!("Speed test complete: {}/3 phases succeeded", run.successful_phases()))
            .correlation_id(&run.run_id.to_string())
            .field("duration_ms", run.duration().map(|d| d.num_milliseconds()))
            .field("snapshot", run.snapshot())
            .log();
    }

    /// Log a start request rejected because a run is in flight
    pub fn log_busy(&self, error: &AppError) {
        self.logger.warn(&error.to_string())
            .error_info(error)
            .log();
    }
}
