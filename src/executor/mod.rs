//! Measurement phase execution
//!
//! This module contains the side-effecting half of a speed test:
//! - Latency probing against the ping endpoint
//! - Download and upload throughput phases
//! - A phase executor applying the per-phase timeout and calibration
//!
//! Everything reads time through the injected [`Clock`] and talks to the
//! network through the injected [`HttpTransport`].

pub mod latency;
pub mod throughput;

pub use latency::LatencyProber;
pub use throughput::{Direction, ThroughputPhase};

use crate::{
    calibration::Calibrator,
    client::HttpTransport,
    clock::Clock,
    error::{AppError, Result},
    models::{Config, PhaseResult, SpeedTestConfig},
    types::MeasurementKind,
};
use std::sync::Arc;
use std::time::Duration;

/// Smallest elapsed time used as a divisor, in seconds
pub const MIN_ELAPSED_SECS: f64 = 0.001;

/// A raw measurement and the time it took
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Milliseconds for latency, Mbps for throughput
    pub raw_value: f64,
    /// Timed portion of the phase
    pub elapsed: Duration,
}

/// Megabits per second for `size_mb` megabytes moved in `elapsed`
pub fn throughput_mbps(size_mb: f64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64().max(MIN_ELAPSED_SECS);
    (size_mb * 8.0) / secs
}

/// Endpoints of the payload source
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    pub ping: String,
    pub download: String,
    pub upload: String,
}

impl Endpoints {
    /// Resolve endpoints from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            ping: config.ping_url()?.to_string(),
            download: config.download_url()?.to_string(),
            upload: config.upload_url()?.to_string(),
        })
    }
}

/// Runs one measurement phase end to end and never fails as a whole:
/// errors and timeouts are folded into the returned [`PhaseResult`].
pub struct PhaseExecutor {
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    endpoints: Endpoints,
    settings: SpeedTestConfig,
    phase_timeout: Duration,
}

impl PhaseExecutor {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
        endpoints: Endpoints,
        settings: SpeedTestConfig,
        phase_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            clock,
            endpoints,
            settings,
            phase_timeout,
        }
    }

    /// Build an executor from configuration
    pub fn from_config(
        config: &Config,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        Ok(Self::new(
            transport,
            clock,
            Endpoints::from_config(config)?,
            config.speed_test.clone(),
            config.phase_timeout(),
        ))
    }

    /// Per-phase time budget
    pub fn phase_timeout(&self) -> Duration {
        self.phase_timeout
    }

    /// Speed test settings in use
    pub fn settings(&self) -> &SpeedTestConfig {
        &self.settings
    }

    /// Measure one kind and calibrate the outcome
    pub async fn execute(&self, kind: MeasurementKind) -> PhaseResult {
        match self.measure_with_timeout(kind).await {
            Ok(measurement) => {
                let calibrated = Calibrator::new(&self.settings).calibrate(kind, measurement.raw_value);
                PhaseResult::measured(measurement.raw_value, calibrated, measurement.elapsed)
            }
            Err(error) => PhaseResult::failed(&error),
        }
    }

    /// Raw measurement bounded by the phase timeout
    pub async fn measure_with_timeout(&self, kind: MeasurementKind) -> Result<Measurement> {
        match tokio::time::timeout(self.phase_timeout, self.measure(kind)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::timeout(format!(
                "{} phase exceeded {:?}",
                kind.label(),
                self.phase_timeout
            ))),
        }
    }

    /// Raw measurement without a time budget
    pub async fn measure(&self, kind: MeasurementKind) -> Result<Measurement> {
        match kind {
            MeasurementKind::Ping => {
                LatencyProber::new(self.transport.as_ref(), self.clock.as_ref(), &self.endpoints.ping)
                    .probe()
                    .await
            }
            MeasurementKind::Download => {
                ThroughputPhase::new(
                    self.transport.as_ref(),
                    self.clock.as_ref(),
                    &self.endpoints.download,
                    self.settings.download_file_size_mb,
                )
                .measure_download()
                .await
            }
            MeasurementKind::Upload => {
                ThroughputPhase::new(
                    self.transport.as_ref(),
                    self.clock.as_ref(),
                    &self.endpoints.upload,
                    self.settings.upload_file_size_mb,
                )
                .measure_upload()
                .await
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{Reply, ScriptedTransport};
    use super::*;
    use crate::clock::ManualClock;
    use crate::types::PhaseStatus;

    fn executor(transport: ScriptedTransport, clock: Arc<ManualClock>, timeout: Duration) -> PhaseExecutor {
        let settings = SpeedTestConfig {
            download_file_size_mb: 5.0,
            upload_file_size_mb: 1.0,
            download_calibration_factor: 14.0,
            ping_calibration_factor: 0.06,
            ..SpeedTestConfig::default()
        };
        let endpoints = Endpoints {
            ping: "http://test/api/ping-test".to_string(),
            download: "http://test/api/speed-test/download".to_string(),
            upload: "http://test/api/speed-test/upload".to_string(),
        };
        PhaseExecutor::new(Arc::new(transport), clock, endpoints, settings, timeout)
    }

    #[test]
    fn test_throughput_formula() {
        let mbps = throughput_mbps(5.0, Duration::from_millis(1454));
        assert!((mbps - 27.51).abs() < 0.01);
    }

    #[test]
    fn test_zero_elapsed_is_clamped() {
        assert_eq!(throughput_mbps(1.0, Duration::ZERO), 8.0 / MIN_ELAPSED_SECS);
        assert!(throughput_mbps(1.0, Duration::ZERO).is_finite());
    }

    #[test]
    fn test_endpoints_from_config() {
        let endpoints = Endpoints::from_config(&Config::default()).unwrap();
        assert!(endpoints.ping.ends_with("/api/ping-test"));
        assert!(endpoints.download.ends_with("/api/speed-test/download"));
        assert!(endpoints.upload.ends_with("/api/speed-test/upload"));
    }

    #[tokio::test]
    async fn test_execute_calibrates_download() {
        let clock = Arc::new(ManualClock::new());
        let transport = ScriptedTransport::new(clock.clone());

        let result = executor(transport, clock, Duration::from_secs(10))
            .execute(MeasurementKind::Download)
            .await;

        assert!(result.is_successful());
        let raw = result.raw_value.unwrap();
        assert!((raw - 27.51).abs() < 0.01);
        assert!((result.calibrated_value.unwrap() - raw * 14.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_execute_calibrates_ping() {
        let clock = Arc::new(ManualClock::new());
        let transport = ScriptedTransport::new(clock.clone());

        let result = executor(transport, clock, Duration::from_secs(10))
            .execute(MeasurementKind::Ping)
            .await;

        assert_eq!(result.raw_value, Some(122.0));
        assert!((result.calibrated_value.unwrap() - 7.32).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_transport_error_becomes_failed_result() {
        let clock = Arc::new(ManualClock::new());
        let mut transport = ScriptedTransport::new(clock.clone());
        transport.upload = Reply::Fail("connection reset".to_string());

        let result = executor(transport, clock, Duration::from_secs(10))
            .execute(MeasurementKind::Upload)
            .await;

        assert_eq!(result.status, PhaseStatus::Failed);
        assert_eq!(result.raw_value, None);
        assert_eq!(result.calibrated_value, None);
        assert!(result.error_message.unwrap().contains("connection reset"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_phase_times_out() {
        let clock = Arc::new(ManualClock::new());
        let mut transport = ScriptedTransport::new(clock.clone());
        transport.download = Reply::Hang;

        let result = executor(transport, clock, Duration::from_secs(10))
            .execute(MeasurementKind::Download)
            .await;

        assert_eq!(result.status, PhaseStatus::Timeout);
        assert_eq!(result.calibrated_value, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_ping_body_is_outside_the_budget() {
        let clock = Arc::new(ManualClock::new());
        let mut transport = ScriptedTransport::new(clock.clone());
        transport.ping = Reply::Stall { latency: Duration::from_millis(122) };

        let result = executor(transport, clock, Duration::from_secs(10))
            .execute(MeasurementKind::Ping)
            .await;

        assert_eq!(result.status, PhaseStatus::Success);
        assert_eq!(result.raw_value, Some(122.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_download_body_times_out() {
        let clock = Arc::new(ManualClock::new());
        let mut transport = ScriptedTransport::new(clock.clone());
        transport.download = Reply::Stall { latency: Duration::from_millis(50) };

        let result = executor(transport, clock, Duration::from_secs(10))
            .execute(MeasurementKind::Download)
            .await;

        assert_eq!(result.status, PhaseStatus::Timeout);
        assert_eq!(result.raw_value, None);
    }
}
