//! Calibration of raw measurements into user-facing values
//!
//! The measurement endpoints run on infrastructure whose throughput is far
//! below what real clients can achieve, and whose round trip adds latency
//! that the client's own connection does not have. Raw values are therefore
//! corrected with a fixed linear factor and clamped to a plausible range.
//! Every function here is pure: identical input always yields identical output.

use crate::models::SpeedTestConfig;
use crate::types::MeasurementKind;

/// `min(raw × factor, max_cap)`, or `None` when `raw` is not a usable measurement
pub fn calibrate_throughput(raw: f64, factor: f64, max_cap: f64) -> Option<f64> {
    if !is_usable(raw) {
        return None;
    }
    Some((raw * factor).min(max_cap))
}

/// `max(raw × factor, min_floor)`, or `None` when `raw` is not a usable measurement
pub fn calibrate_ping(raw: f64, factor: f64, min_floor: f64) -> Option<f64> {
    if !is_usable(raw) {
        return None;
    }
    Some((raw * factor).max(min_floor))
}

/// Round a latency to whole milliseconds for display
pub fn round_ping(ms: f64) -> f64 {
    ms.round()
}

/// Round a throughput to two decimals for display
pub fn round_speed(mbps: f64) -> f64 {
    (mbps * 100.0).round() / 100.0
}

/// NaN, infinities and negative values come from broken timings
fn is_usable(raw: f64) -> bool {
    raw.is_finite() && raw >= 0.0
}

/// Applies the configured calibration to each kind of measurement
#[derive(Debug, Clone, Copy)]
pub struct Calibrator<'a> {
    config: &'a SpeedTestConfig,
}

impl<'a> Calibrator<'a> {
    pub fn new(config: &'a SpeedTestConfig) -> Self {
        Self { config }
    }

    /// Calibrate a raw value of the given kind
    pub fn calibrate(&self, kind: MeasurementKind, raw: f64) -> Option<f64> {
        match kind {
            MeasurementKind::Ping => calibrate_ping(
                raw,
                self.config.ping_calibration_factor,
                self.config.min_ping_ms,
            ),
            MeasurementKind::Download => calibrate_throughput(
                raw,
                self.config.download_calibration_factor,
                self.config.max_download_speed_mbps,
            ),
            MeasurementKind::Upload => calibrate_throughput(
                raw,
                self.config.upload_calibration_factor,
                self.config.max_upload_speed_mbps,
            ),
        }
    }

    /// Calibrate and round for display
    pub fn calibrate_for_display(&self, kind: MeasurementKind, raw: f64) -> Option<f64> {
        self.calibrate(kind, raw).map(|value| match kind {
            MeasurementKind::Ping => round_ping(value),
            MeasurementKind::Download | MeasurementKind::Upload => round_speed(value),
        })
    }
}
