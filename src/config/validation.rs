//! Configuration validation utilities and rules

use crate::{
    models::{Config, SpeedTestConfig},
    error::Result,
};

/// Payload size above which a warning is issued, in MB
const LARGE_PAYLOAD_MB: f64 = 100.0;

/// Configuration validator with advisory rules on top of `Config::validate`
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration with comprehensive checks
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        let mut warnings = Vec::new();

        // Hard errors first
        config.validate()?;

        warnings.extend(Self::validate_base_url(&config.base_url));
        warnings.extend(Self::validate_calibration(&config.speed_test));
        warnings.extend(Self::validate_payloads(&config.speed_test));
        warnings.extend(Self::validate_timeout(config));

        Ok(warnings)
    }

    /// Check the speed test server URL
    fn validate_base_url(base_url: &str) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        let Ok(parsed) = url::Url::parse(base_url) else {
            return warnings;
        };

        if parsed.scheme() == "http" {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!("Speed test URL '{}' uses HTTP instead of HTTPS", base_url)
            ));
        }

        match parsed.host() {
            Some(url::Host::Ipv4(ip)) if ip.is_loopback() || ip.is_private() => {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("Speed test URL '{}' targets a private/local network", base_url)
                ));
            }
            Some(url::Host::Domain("localhost")) => {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("Speed test URL '{}' targets localhost, results will not reflect the internet link", base_url)
                ));
            }
            _ => {}
        }

        if parsed.query().is_some() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("Speed test URL '{}' includes query parameters, which are dropped from endpoint URLs", base_url)
            ));
        }

        warnings
    }

    /// Flag calibration factors outside their usual ranges
    fn validate_calibration(settings: &SpeedTestConfig) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if settings.ping_calibration_factor >= 1.0 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Ping calibration factor {} does not reduce latency (expected < 1)",
                    settings.ping_calibration_factor
                )
            ));
        }

        for (name, factor) in [
            ("Download", settings.download_calibration_factor),
            ("Upload", settings.upload_calibration_factor),
        ] {
            if factor < 1.0 {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("{} calibration factor {} reduces throughput (expected >= 1)", name, factor)
                ));
            }
        }

        if settings.max_upload_speed_mbps > settings.max_download_speed_mbps {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "Upload cap {} Mbps is above download cap {} Mbps",
                    settings.max_upload_speed_mbps, settings.max_download_speed_mbps
                )
            ));
        }

        warnings
    }

    /// Flag payload sizes that make runs slow or noisy
    fn validate_payloads(settings: &SpeedTestConfig) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        for (name, size) in [
            ("Download", settings.download_file_size_mb),
            ("Upload", settings.upload_file_size_mb),
        ] {
            if size > LARGE_PAYLOAD_MB {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("{} payload of {} MB will take a long time on slow links", name, size)
                ));
            } else if size < 0.1 {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("{} payload of {} MB may be too small for a stable measurement", name, size)
                ));
            }
        }

        warnings
    }

    /// Check the phase timeout
    fn validate_timeout(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.phase_timeout_seconds < 3 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!("Phase timeout of {}s may be too short for reliable measurements", config.phase_timeout_seconds)
            ));
        } else if config.phase_timeout_seconds > 60 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("Long phase timeout of {}s will slow down failure detection", config.phase_timeout_seconds)
            ));
        }

        warnings
    }
}

/// Validation warning levels
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    Info,
    Warning,
    Error,
}

impl ValidationLevel {
    /// Get display string for level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    /// Create a new validation warning
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        use colored::Colorize;

        let label = format!("[{}]", self.level.as_str());
        let label = if use_color {
            match self.level {
                ValidationLevel::Info => label.blue().to_string(),
                ValidationLevel::Warning => label.yellow().to_string(),
                ValidationLevel::Error => label.red().to_string(),
            }
        } else {
            label
        };

        format!("{} {}", label, self.message)
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}
