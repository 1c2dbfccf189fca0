//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_file_from(Path::new(".env"), debug)
    }

    /// Load a specific .env file if it exists
    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path)
                .map_err(|e| AppError::config(format!("Failed to load .env file: {}", e)))?;

            if debug {
                eprintln!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            eprintln!("No .env file found, using defaults and CLI arguments");
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# Network Speed Tester Configuration
#
# Values specified here are used as defaults and can be overridden by
# environment variables and command-line arguments.

# Base URL of the speed test server
# SPEED_TEST_URL=http://localhost:3000/api

# Time budget for each phase in seconds
# PHASE_TIMEOUT_SECONDS=10

# Payload sizes in megabytes
# DOWNLOAD_FILE_SIZE_MB=5
# UPLOAD_FILE_SIZE_MB=1

# Calibration multipliers applied to raw measurements
# DOWNLOAD_CALIBRATION_FACTOR=13.98
# UPLOAD_CALIBRATION_FACTOR=2.15
# PING_CALIBRATION_FACTOR=0.057

# Bounds of calibrated values
# MAX_DOWNLOAD_SPEED_MBPS=2000
# MAX_UPLOAD_SPEED_MBPS=1000
# MIN_PING_MS=1

# Enable colored output (true/false)
# ENABLE_COLOR=true
"#.to_string()
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        let content = Self::create_example_env_content();
        std::fs::write(path, content)
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))?;

        Ok(())
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        match key {
            "SPEED_TEST_URL" => {
                let parsed = url::Url::parse(value)
                    .map_err(|e| AppError::config(format!("Invalid SPEED_TEST_URL '{}': {}", value, e)))?;
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(AppError::config(format!("SPEED_TEST_URL must use http or https: {}", value)));
                }
            }
            "PHASE_TIMEOUT_SECONDS" => {
                let timeout: u64 = value.parse()
                    .map_err(|e| AppError::config(format!("Invalid PHASE_TIMEOUT_SECONDS value '{}': {}", value, e)))?;
                if timeout == 0 || timeout > 300 {
                    return Err(AppError::config(format!("PHASE_TIMEOUT_SECONDS must be between 1 and 300, got: {}", timeout)));
                }
            }
            "DOWNLOAD_FILE_SIZE_MB"
            | "UPLOAD_FILE_SIZE_MB"
            | "DOWNLOAD_CALIBRATION_FACTOR"
            | "UPLOAD_CALIBRATION_FACTOR"
            | "PING_CALIBRATION_FACTOR"
            | "MAX_DOWNLOAD_SPEED_MBPS"
            | "MAX_UPLOAD_SPEED_MBPS"
            | "MIN_PING_MS" => {
                let number: f64 = value.parse()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
                if !number.is_finite() || number <= 0.0 {
                    return Err(AppError::config(format!("{} must be a positive number, got: {}", key, value)));
                }
            }
            "ENABLE_COLOR" => {
                value.parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
            }
            _ => {
                // Unknown environment variable, ignore
            }
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("SPEED_TEST_URL", "Base URL of the speed test server", "https://speed.example.com/api"),
            ("PHASE_TIMEOUT_SECONDS", "Time budget per phase in seconds (1-300)", "10"),
            ("DOWNLOAD_FILE_SIZE_MB", "Download payload size in MB", "5"),
            ("UPLOAD_FILE_SIZE_MB", "Upload payload size in MB", "1"),
            ("DOWNLOAD_CALIBRATION_FACTOR", "Multiplier for raw download Mbps", "13.98"),
            ("UPLOAD_CALIBRATION_FACTOR", "Multiplier for raw upload Mbps", "2.15"),
            ("PING_CALIBRATION_FACTOR", "Multiplier for raw latency", "0.057"),
            ("MAX_DOWNLOAD_SPEED_MBPS", "Upper bound of calibrated download", "2000"),
            ("MAX_UPLOAD_SPEED_MBPS", "Upper bound of calibrated upload", "1000"),
            ("MIN_PING_MS", "Lower bound of calibrated latency", "1"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<28} {}\n", var, description));
            help.push_str(&format!("  {:<28} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate the contents of a .env file, `None` if it does not exist
    pub fn check_env_file(path: &Path) -> Result<Option<Vec<String>>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Failed to read .env file: {}", e)))?;

        let mut warnings = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                if let Err(e) = Self::validate_env_var(key.trim(), value.trim()) {
                    warnings.push(format!("Line '{}': {}", line, e));
                }
            }
        }

        Ok(Some(warnings))
    }
}
