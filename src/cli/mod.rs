//! Command-line interface

use clap::Parser;
use std::path::PathBuf;

/// Network Speed Tester - measure calibrated ping, download and upload speed
#[derive(Parser, Debug, Clone)]
#[command(name = "nst")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the speed test server
    #[arg(long)]
    pub url: Option<String>,

    /// Time budget for each phase in seconds
    #[arg(short, long, value_parser = parse_duration)]
    pub timeout: Option<u64>,

    /// Download payload size in MB
    #[arg(long, value_name = "MB", value_parser = parse_size_mb)]
    pub download_size: Option<f64>,

    /// Upload payload size in MB
    #[arg(long, value_name = "MB", value_parser = parse_size_mb)]
    pub upload_size: Option<f64>,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Show raw measurements next to calibrated values
    #[arg(long)]
    pub raw: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// List supported environment variables, check ./.env and exit
    #[arg(long)]
    pub env_help: bool,

    /// Write an example .env file to PATH and exit
    #[arg(long, value_name = "PATH")]
    pub generate_env: Option<PathBuf>,
}

impl Cli {
    /// Validate CLI arguments for conflicts
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if let Some(ref url) = self.url {
            let parsed = url::Url::parse(url).map_err(|e| format!("Invalid URL '{}': {}", url, e))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(format!("URL must use http or https: {}", url));
            }
        }

        Ok(())
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color || self.json {
            false
        } else {
            supports_color()
        }
    }
}

/// Parse duration from seconds string
fn parse_duration(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if secs > 300 {
                Err("Duration cannot exceed 300 seconds".to_string())
            } else {
                Ok(secs)
            }
        })
}

/// Parse a payload size in megabytes
fn parse_size_mb(s: &str) -> Result<f64, String> {
    let size: f64 = s.parse().map_err(|_| format!("Invalid size: {}", s))?;

    if !size.is_finite() || size <= 0.0 {
        Err("Size must be a positive number of megabytes".to_string())
    } else if size > 1024.0 {
        Err("Size cannot exceed 1024 MB".to_string())
    } else {
        Ok(size)
    }
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}
