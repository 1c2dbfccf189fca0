//! Network Speed Tester
//!
//! Measures round-trip latency, download throughput and upload throughput
//! against a cooperating HTTP payload server, then calibrates the raw numbers
//! into user-facing values. A run walks through ping, download and upload in
//! order, and observers can follow its progress through a watch channel.

pub mod app;
pub mod calibration;
pub mod cli;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod payload;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Config, PhaseResult, SpeedTestConfig, TestRun, TestSnapshot};
pub use types::{MeasurementKind, PhaseStatus, TestPhase};
pub use calibration::Calibrator;
pub use client::{HttpRequest, HttpResponse, HttpTransport, NetworkClient};
pub use clock::{Clock, SystemClock};
pub use executor::{LatencyProber, PhaseExecutor, ThroughputPhase};
pub use orchestrator::SpeedTestOrchestrator;
pub use output::{OutputFormatter, ColoredFormatter, PlainFormatter, JsonFormatter, OutputCoordinator, OutputFormatterFactory};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Build metadata set by build.rs
pub const BUILD_TIME: &str = env!("BUILD_TIME");
pub const TARGET_TRIPLE: &str = env!("TARGET_TRIPLE");
pub const GIT_COMMIT: Option<&str> = option_env!("GIT_COMMIT");

/// One-line description of this build
pub fn build_info() -> String {
    match GIT_COMMIT {
        Some(commit) => format!("{} v{} ({}, {}, built {})", PKG_NAME, VERSION, commit, TARGET_TRIPLE, BUILD_TIME),
        None => format!("{} v{} ({}, built {})", PKG_NAME, VERSION, TARGET_TRIPLE, BUILD_TIME),
    }
}

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";
    pub const DEFAULT_PING_PATH: &str = "/ping-test";
    pub const DEFAULT_DOWNLOAD_PATH: &str = "/speed-test/download";
    pub const DEFAULT_UPLOAD_PATH: &str = "/speed-test/upload";
    pub const DEFAULT_PHASE_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    pub const DEFAULT_DOWNLOAD_FILE_SIZE_MB: f64 = 5.0;
    pub const DEFAULT_UPLOAD_FILE_SIZE_MB: f64 = 1.0;

    // Reference measurements: raw 27.53 Mbps shown as 384.9, raw 8.04 as 17.3, raw 122 ms as 7
    pub const DEFAULT_DOWNLOAD_CALIBRATION_FACTOR: f64 = 384.9 / 27.53;
    pub const DEFAULT_UPLOAD_CALIBRATION_FACTOR: f64 = 17.3 / 8.04;
    pub const DEFAULT_PING_CALIBRATION_FACTOR: f64 = 7.0 / 122.0;

    pub const DEFAULT_MAX_DOWNLOAD_SPEED_MBPS: f64 = 2000.0;
    pub const DEFAULT_MAX_UPLOAD_SPEED_MBPS: f64 = 1000.0;
    pub const DEFAULT_MIN_PING_MS: f64 = 1.0;
}
