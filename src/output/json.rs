//! JSON output for scripts and dashboards

use crate::{
    error::Result,
    models::{TestRun, TestSnapshot},
    types::{PhaseStatus, TestPhase},
};
use super::formatter::OutputFormatter;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Per-phase entry of a JSON report
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseReport {
    pub status: PhaseStatus,
    pub elapsed_ms: Option<f64>,
    pub error: Option<String>,
}

/// Machine-readable report of a run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: Uuid,
    pub phase: TestPhase,
    pub progress: u8,
    pub results: TestSnapshot,
    pub ping_phase: PhaseReport,
    pub download_phase: PhaseReport,
    pub upload_phase: PhaseReport,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
}

impl RunReport {
    pub fn from_run(run: &TestRun) -> Self {
        let phase = |result: &crate::models::PhaseResult| PhaseReport {
            status: result.status,
            elapsed_ms: result.elapsed_ms(),
            error: result.error_message.clone(),
        };

        Self {
            run_id: run.run_id,
            phase: run.phase,
            progress: run.progress,
            results: run.snapshot(),
            ping_phase: phase(&run.ping),
            download_phase: phase(&run.download),
            upload_phase: phase(&run.upload),
            started_at: run.started_at,
            completed_at: run.completed_at,
            duration_ms: run.duration().map(|d| d.num_milliseconds()),
        }
    }
}

#[derive(Serialize)]
struct Message<'a> {
    level: &'a str,
    message: &'a str,
}

/// Formatter emitting one JSON document per call
#[derive(Debug, Default)]
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(json)
    }

    fn message(&self, level: &str, message: &str) -> Result<String> {
        self.render(&Message { level, message })
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_header(&self, _title: &str) -> Result<String> {
        // Headers would break the single-document output
        Ok(String::new())
    }

    fn format_progress(&self, snapshot: &TestSnapshot) -> Result<String> {
        serde_json::to_string(snapshot).map_err(Into::into)
    }

    fn format_results(&self, run: &TestRun) -> Result<String> {
        self.render(&RunReport::from_run(run))
    }

    fn format_error(&self, error: &str) -> Result<String> {
        self.message("error", error)
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        self.message("warning", warning)
    }

    fn format_success(&self, message: &str) -> Result<String> {
        self.message("success", message)
    }
}
