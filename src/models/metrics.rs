//! Phase results, test runs and the observable snapshot

use crate::calibration::{round_ping, round_speed};
use crate::error::AppError;
use crate::types::{MeasurementKind, PhaseStatus, TestPhase};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Result of one measurement phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseResult {
    /// Directly measured value (ms or Mbps), unset on failure
    pub raw_value: Option<f64>,

    /// Value after calibration, `None` only when the measurement failed
    pub calibrated_value: Option<f64>,

    /// How the phase ended
    pub status: PhaseStatus,

    /// Wall-clock time the measured transfer took
    pub elapsed: Option<Duration>,

    /// Error message if the phase failed
    pub error_message: Option<String>,
}

impl PhaseResult {
    /// A phase that has not run yet
    pub fn pending() -> Self {
        Self {
            raw_value: None,
            calibrated_value: None,
            status: PhaseStatus::Pending,
            elapsed: None,
            error_message: None,
        }
    }

    /// Build a result from a raw measurement and its calibration.
    ///
    /// A calibration of `None` means the raw value was unusable (NaN,
    /// infinite, negative), which is recorded as a failure so that no
    /// invalid number ever reaches the caller.
    pub fn measured(raw_value: f64, calibrated_value: Option<f64>, elapsed: Duration) -> Self {
        match calibrated_value {
            Some(calibrated) => Self {
                raw_value: Some(raw_value),
                calibrated_value: Some(calibrated),
                status: PhaseStatus::Success,
                elapsed: Some(elapsed),
                error_message: None,
            },
            None => Self {
                raw_value: None,
                calibrated_value: None,
                status: PhaseStatus::Failed,
                elapsed: Some(elapsed),
                error_message: Some(format!("Unusable measurement: {}", raw_value)),
            },
        }
    }

    /// A phase that failed with the given error
    pub fn failed(error: &AppError) -> Self {
        let status = if error.is_timeout() {
            PhaseStatus::Timeout
        } else {
            PhaseStatus::Failed
        };

        Self {
            raw_value: None,
            calibrated_value: None,
            status,
            elapsed: None,
            error_message: Some(error.to_string()),
        }
    }

    /// Check if this phase produced a value
    pub fn is_successful(&self) -> bool {
        matches!(self.status, PhaseStatus::Success) && self.calibrated_value.is_some()
    }

    /// Elapsed time in milliseconds, if measured
    pub fn elapsed_ms(&self) -> Option<f64> {
        self.elapsed.map(|d| d.as_nanos() as f64 / 1_000_000.0)
    }
}

impl Default for PhaseResult {
    fn default() -> Self {
        Self::pending()
    }
}

/// One traversal of the phase sequence, owned by the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRun {
    /// Unique identifier of this run
    pub run_id: Uuid,

    /// Current phase
    pub phase: TestPhase,

    /// Progress percentage, 0-100, never decreasing within a run
    pub progress: u8,

    /// Latency result
    pub ping: PhaseResult,

    /// Download throughput result
    pub download: PhaseResult,

    /// Upload throughput result
    pub upload: PhaseResult,

    /// When the run was started
    pub started_at: Option<DateTime<Utc>>,

    /// When the run reached `complete`
    pub completed_at: Option<DateTime<Utc>>,
}

impl TestRun {
    /// Create a fresh idle run
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            phase: TestPhase::Idle,
            progress: 0,
            ping: PhaseResult::pending(),
            download: PhaseResult::pending(),
            upload: PhaseResult::pending(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Result recorded for a measurement kind
    pub fn result(&self, kind: MeasurementKind) -> &PhaseResult {
        match kind {
            MeasurementKind::Ping => &self.ping,
            MeasurementKind::Download => &self.download,
            MeasurementKind::Upload => &self.upload,
        }
    }

    pub(crate) fn result_mut(&mut self, kind: MeasurementKind) -> &mut PhaseResult {
        match kind {
            MeasurementKind::Ping => &mut self.ping,
            MeasurementKind::Download => &mut self.download,
            MeasurementKind::Upload => &mut self.upload,
        }
    }

    /// Check if the run has reached its terminal phase
    pub fn is_complete(&self) -> bool {
        self.phase == TestPhase::Complete
    }

    /// Number of phases that produced a value
    pub fn successful_phases(&self) -> usize {
        [&self.ping, &self.download, &self.upload]
            .iter()
            .filter(|r| r.is_successful())
            .count()
    }

    /// Total run duration, once complete
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Observable view of this run for UI collaborators
    pub fn snapshot(&self) -> TestSnapshot {
        TestSnapshot {
            run_id: self.run_id,
            phase: self.phase,
            progress: self.progress,
            ping: self.ping.calibrated_value.map(round_ping),
            download_speed: self.download.calibrated_value.map(round_speed),
            upload_speed: self.upload.calibrated_value.map(round_speed),
            raw_ping: self.ping.raw_value,
            raw_download_speed: self.download.raw_value,
            raw_upload_speed: self.upload.raw_value,
        }
    }
}

impl Default for TestRun {
    fn default() -> Self {
        Self::new()
    }
}

/// State exposed to observers, updated after every transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSnapshot {
    pub run_id: Uuid,
    pub phase: TestPhase,
    pub progress: u8,
    /// Calibrated latency, whole milliseconds
    pub ping: Option<f64>,
    /// Calibrated download throughput, two decimals
    pub download_speed: Option<f64>,
    /// Calibrated upload throughput, two decimals
    pub upload_speed: Option<f64>,
    pub raw_ping: Option<f64>,
    pub raw_download_speed: Option<f64>,
    pub raw_upload_speed: Option<f64>,
}

impl TestSnapshot {
    /// Calibrated value for a measurement kind
    pub fn value(&self, kind: MeasurementKind) -> Option<f64> {
        match kind {
            MeasurementKind::Ping => self.ping,
            MeasurementKind::Download => self.download_speed,
            MeasurementKind::Upload => self.upload_speed,
        }
    }

    /// Raw value for a measurement kind
    pub fn raw_value(&self, kind: MeasurementKind) -> Option<f64> {
        match kind {
            MeasurementKind::Ping => self.raw_ping,
            MeasurementKind::Download => self.raw_download_speed,
            MeasurementKind::Upload => self.raw_upload_speed,
        }
    }
}

impl Default for TestSnapshot {
    fn default() -> Self {
        TestRun::new().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_is_idle() {
        let run = TestRun::new();
        assert_eq!(run.phase, TestPhase::Idle);
        assert_eq!(run.progress, 0);
        assert_eq!(run.ping.status, PhaseStatus::Pending);
        assert_eq!(run.successful_phases(), 0);
        assert!(!run.is_complete());
    }

    #[test]
    fn test_runs_get_distinct_ids() {
        assert_ne!(TestRun::new().run_id, TestRun::new().run_id);
    }

    #[test]
    fn test_measured_result() {
        let result = PhaseResult::measured(27.51, Some(385.14), Duration::from_millis(1454));
        assert!(result.is_successful());
        assert_eq!(result.raw_value, Some(27.51));
        assert_eq!(result.elapsed_ms(), Some(1454.0));
    }

    #[test]
    fn test_unusable_measurement_is_failure() {
        let result = PhaseResult::measured(f64::NAN, None, Duration::ZERO);
        assert!(!result.is_successful());
        assert_eq!(result.status, PhaseStatus::Failed);
        assert_eq!(result.raw_value, None);
        assert_eq!(result.calibrated_value, None);
    }

    #[test]
    fn test_failed_result_statuses() {
        let failed = PhaseResult::failed(&AppError::http_status(500));
        assert_eq!(failed.status, PhaseStatus::Failed);
        assert!(failed.error_message.unwrap().contains("500"));

        let timed_out = PhaseResult::failed(&AppError::timeout("download"));
        assert_eq!(timed_out.status, PhaseStatus::Timeout);
        assert_eq!(timed_out.calibrated_value, None);
    }

    #[test]
    fn test_snapshot_rounds_calibrated_values() {
        let mut run = TestRun::new();
        run.ping = PhaseResult::measured(122.0, Some(7.32), Duration::from_millis(122));
        run.download = PhaseResult::measured(27.51, Some(385.1428), Duration::from_millis(1454));
        run.upload = PhaseResult::failed(&AppError::network("refused"));

        let snapshot = run.snapshot();
        assert_eq!(snapshot.ping, Some(7.0));
        assert_eq!(snapshot.raw_ping, Some(122.0));
        assert_eq!(snapshot.download_speed, Some(385.14));
        assert_eq!(snapshot.upload_speed, None);
        assert_eq!(snapshot.value(MeasurementKind::Download), Some(385.14));
        assert_eq!(snapshot.raw_value(MeasurementKind::Upload), None);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let json = serde_json::to_value(TestRun::new().snapshot()).unwrap();
        assert!(json.get("downloadSpeed").is_some());
        assert!(json.get("rawUploadSpeed").is_some());
        assert_eq!(json["phase"], "idle");
    }
}
