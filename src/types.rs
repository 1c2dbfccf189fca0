//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Position of a run in the speed test sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestPhase {
    /// No run has started yet
    Idle,
    /// Measuring round-trip latency
    Ping,
    /// Measuring download throughput
    Download,
    /// Measuring upload throughput
    Upload,
    /// Run finished, results are final
    Complete,
}

impl TestPhase {
    /// Progress percentage reported while the run is in this phase
    pub fn progress(&self) -> u8 {
        match self {
            TestPhase::Idle | TestPhase::Ping => 0,
            TestPhase::Download => 20,
            TestPhase::Upload => 60,
            TestPhase::Complete => 100,
        }
    }

    /// Phase following this one, `None` once complete
    pub fn next(&self) -> Option<TestPhase> {
        match self {
            TestPhase::Idle => Some(TestPhase::Ping),
            TestPhase::Ping => Some(TestPhase::Download),
            TestPhase::Download => Some(TestPhase::Upload),
            TestPhase::Upload => Some(TestPhase::Complete),
            TestPhase::Complete => None,
        }
    }

    /// Measurement performed during this phase, if any
    pub fn measurement(&self) -> Option<MeasurementKind> {
        match self {
            TestPhase::Ping => Some(MeasurementKind::Ping),
            TestPhase::Download => Some(MeasurementKind::Download),
            TestPhase::Upload => Some(MeasurementKind::Upload),
            TestPhase::Idle | TestPhase::Complete => None,
        }
    }

    /// Status line shown while the phase is running
    pub fn status_text(&self) -> &'static str {
        match self {
            TestPhase::Idle => "Ready",
            TestPhase::Ping => "Testing ping...",
            TestPhase::Download => "Testing download speed...",
            TestPhase::Upload => "Testing upload speed...",
            TestPhase::Complete => "Complete",
        }
    }
}

impl fmt::Display for TestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestPhase::Idle => "idle",
            TestPhase::Ping => "ping",
            TestPhase::Download => "download",
            TestPhase::Upload => "upload",
            TestPhase::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// The three measurements taken during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementKind {
    Ping,
    Download,
    Upload,
}

impl MeasurementKind {
    /// Unit of both raw and calibrated values
    pub fn unit(&self) -> &'static str {
        match self {
            MeasurementKind::Ping => "ms",
            MeasurementKind::Download | MeasurementKind::Upload => "Mbps",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            MeasurementKind::Ping => "Ping",
            MeasurementKind::Download => "Download",
            MeasurementKind::Upload => "Upload",
        }
    }
}

/// Outcome of a single phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseStatus {
    /// Phase has not run yet
    Pending,
    /// Measurement completed and produced a value
    Success,
    /// Transport error, non-success status or unusable measurement
    Failed,
    /// Phase exceeded its time budget
    Timeout,
}

impl PhaseStatus {
    /// Whether the phase has finished, successfully or not
    pub fn is_finished(&self) -> bool {
        !matches!(self, PhaseStatus::Pending)
    }
}
