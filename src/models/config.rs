//! Configuration data model and validation

use crate::types::{Result, AppError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Bytes per megabyte used for payload sizes
pub const BYTES_PER_MB: f64 = 1_048_576.0;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the speed test server (the payload source)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the ping endpoint, relative to the base URL
    #[serde(default = "default_ping_path")]
    pub ping_path: String,

    /// Path of the download endpoint, relative to the base URL
    #[serde(default = "default_download_path")]
    pub download_path: String,

    /// Path of the upload endpoint, relative to the base URL
    #[serde(default = "default_upload_path")]
    pub upload_path: String,

    /// Time budget for each phase
    #[serde(default = "default_phase_timeout_secs")]
    pub phase_timeout_seconds: u64,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Print results as JSON instead of a table
    #[serde(default)]
    pub json_output: bool,

    /// Show raw measurements next to calibrated values
    #[serde(default)]
    pub show_raw: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,

    /// Payload sizes and calibration constants
    #[serde(default)]
    pub speed_test: SpeedTestConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ping_path: default_ping_path(),
            download_path: default_download_path(),
            upload_path: default_upload_path(),
            phase_timeout_seconds: default_phase_timeout_secs(),
            enable_color: default_enable_color(),
            json_output: false,
            show_raw: false,
            verbose: false,
            debug: false,
            speed_test: SpeedTestConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the per-phase timeout as Duration
    pub fn phase_timeout(&self) -> Duration {
        Duration::from_secs(self.phase_timeout_seconds)
    }

    /// Full URL of the ping endpoint
    pub fn ping_url(&self) -> Result<url::Url> {
        self.endpoint_url(&self.ping_path)
    }

    /// Full URL of the download endpoint
    pub fn download_url(&self) -> Result<url::Url> {
        self.endpoint_url(&self.download_path)
    }

    /// Full URL of the upload endpoint
    pub fn upload_url(&self) -> Result<url::Url> {
        self.endpoint_url(&self.upload_path)
    }

    /// Join an endpoint path onto the base URL, keeping any base path prefix
    fn endpoint_url(&self, path: &str) -> Result<url::Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url::Url::parse(&joined)
            .map_err(|e| AppError::config(format!("Invalid endpoint URL '{}': {}", joined, e)))
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(AppError::config("Speed test URL cannot be empty"));
        }

        match url::Url::parse(&self.base_url) {
            Ok(parsed) => {
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(AppError::config(format!(
                        "Speed test URL must use http or https: {}",
                        self.base_url
                    )));
                }
            }
            Err(e) => {
                return Err(AppError::config(format!("Invalid speed test URL '{}': {}", self.base_url, e)));
            }
        }

        for (name, path) in [
            ("ping", &self.ping_path),
            ("download", &self.download_path),
            ("upload", &self.upload_path),
        ] {
            if path.trim().is_empty() {
                return Err(AppError::config(format!("The {} endpoint path cannot be empty", name)));
            }
        }

        if self.phase_timeout_seconds == 0 {
            return Err(AppError::config("Phase timeout must be greater than 0"));
        }

        if self.phase_timeout_seconds > 300 {
            return Err(AppError::config("Phase timeout cannot exceed 300 seconds"));
        }

        self.speed_test.validate()
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("SPEED_TEST_URL") {
            let url = url.trim();
            if !url.is_empty() {
                self.base_url = url.to_string();
            }
        }

        if let Some(timeout) = env_value::<u64>("PHASE_TIMEOUT_SECONDS")? {
            self.phase_timeout_seconds = timeout;
        }

        if let Some(enable_color) = env_value::<bool>("ENABLE_COLOR")? {
            self.enable_color = enable_color;
        }

        self.speed_test.merge_from_env()
    }
}

/// Fixed payload sizes and calibration constants for a speed test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedTestConfig {
    /// Size of the download payload in megabytes
    pub download_file_size_mb: f64,
    /// Size of the upload payload in megabytes
    pub upload_file_size_mb: f64,
    /// Multiplier applied to raw download throughput
    pub download_calibration_factor: f64,
    /// Multiplier applied to raw upload throughput
    pub upload_calibration_factor: f64,
    /// Multiplier applied to raw latency
    pub ping_calibration_factor: f64,
    /// Upper bound of calibrated download throughput
    pub max_download_speed_mbps: f64,
    /// Upper bound of calibrated upload throughput
    pub max_upload_speed_mbps: f64,
    /// Lower bound of calibrated latency
    pub min_ping_ms: f64,
}

impl Default for SpeedTestConfig {
    fn default() -> Self {
        use crate::defaults;

        Self {
            download_file_size_mb: defaults::DEFAULT_DOWNLOAD_FILE_SIZE_MB,
            upload_file_size_mb: defaults::DEFAULT_UPLOAD_FILE_SIZE_MB,
            download_calibration_factor: defaults::DEFAULT_DOWNLOAD_CALIBRATION_FACTOR,
            upload_calibration_factor: defaults::DEFAULT_UPLOAD_CALIBRATION_FACTOR,
            ping_calibration_factor: defaults::DEFAULT_PING_CALIBRATION_FACTOR,
            max_download_speed_mbps: defaults::DEFAULT_MAX_DOWNLOAD_SPEED_MBPS,
            max_upload_speed_mbps: defaults::DEFAULT_MAX_UPLOAD_SPEED_MBPS,
            min_ping_ms: defaults::DEFAULT_MIN_PING_MS,
        }
    }
}

impl SpeedTestConfig {
    /// Exact size of the download payload in bytes
    pub fn download_bytes(&self) -> usize {
        mb_to_bytes(self.download_file_size_mb)
    }

    /// Exact size of the upload payload in bytes
    pub fn upload_bytes(&self) -> usize {
        mb_to_bytes(self.upload_file_size_mb)
    }

    /// All sizes, factors and bounds must be finite and strictly positive
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("download_file_size_mb", self.download_file_size_mb),
            ("upload_file_size_mb", self.upload_file_size_mb),
            ("download_calibration_factor", self.download_calibration_factor),
            ("upload_calibration_factor", self.upload_calibration_factor),
            ("ping_calibration_factor", self.ping_calibration_factor),
            ("max_download_speed_mbps", self.max_download_speed_mbps),
            ("max_upload_speed_mbps", self.max_upload_speed_mbps),
            ("min_ping_ms", self.min_ping_ms),
        ];

        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(AppError::config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        if self.download_bytes() == 0 || self.upload_bytes() == 0 {
            return Err(AppError::config("Payload sizes must be at least one byte"));
        }

        if self.download_file_size_mb > 1024.0 || self.upload_file_size_mb > 1024.0 {
            return Err(AppError::config("Payload sizes cannot exceed 1024 MB"));
        }

        Ok(())
    }

    /// Merge environment variables into the speed test settings
    pub fn merge_from_env(&mut self) -> Result<()> {
        let targets: [(&str, &mut f64); 8] = [
            ("DOWNLOAD_FILE_SIZE_MB", &mut self.download_file_size_mb),
            ("UPLOAD_FILE_SIZE_MB", &mut self.upload_file_size_mb),
            ("DOWNLOAD_CALIBRATION_FACTOR", &mut self.download_calibration_factor),
            ("UPLOAD_CALIBRATION_FACTOR", &mut self.upload_calibration_factor),
            ("PING_CALIBRATION_FACTOR", &mut self.ping_calibration_factor),
            ("MAX_DOWNLOAD_SPEED_MBPS", &mut self.max_download_speed_mbps),
            ("MAX_UPLOAD_SPEED_MBPS", &mut self.max_upload_speed_mbps),
            ("MIN_PING_MS", &mut self.min_ping_ms),
        ];

        for (key, target) in targets {
            if let Some(value) = env_value::<f64>(key)? {
                *target = value;
            }
        }

        Ok(())
    }
}

/// Convert a size in megabytes to an exact byte count
pub fn mb_to_bytes(size_mb: f64) -> usize {
    (size_mb * BYTES_PER_MB).round() as usize
}

/// Read and parse an environment variable, `None` when unset
fn env_value<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, raw, e))),
        Err(_) => Ok(None),
    }
}

// Default value functions for serde
fn default_base_url() -> String {
    crate::defaults::DEFAULT_BASE_URL.to_string()
}

fn default_ping_path() -> String {
    crate::defaults::DEFAULT_PING_PATH.to_string()
}

fn default_download_path() -> String {
    crate::defaults::DEFAULT_DOWNLOAD_PATH.to_string()
}

fn default_upload_path() -> String {
    crate::defaults::DEFAULT_UPLOAD_PATH.to_string()
}

fn default_phase_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_PHASE_TIMEOUT.as_secs()
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
