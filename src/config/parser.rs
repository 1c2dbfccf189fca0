//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    models::Config,
    error::Result,
    config::env::EnvManager,
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        EnvManager::load_env_file(self.cli.debug)?;

        config.merge_from_env()?;

        self.apply_cli_overrides(&mut config);

        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    pub fn apply_cli_overrides(&self, config: &mut Config) {
        if let Some(ref url) = self.cli.url {
            config.base_url = url.clone();
        }

        if let Some(timeout) = self.cli.timeout {
            config.phase_timeout_seconds = timeout;
        }

        if let Some(size) = self.cli.download_size {
            config.speed_test.download_file_size_mb = size;
        }

        if let Some(size) = self.cli.upload_size {
            config.speed_test.upload_file_size_mb = size;
        }

        if self.cli.no_color || self.cli.json {
            config.enable_color = false;
        } else if self.cli.color {
            config.enable_color = true;
        }

        // CLI-only flags
        config.json_output = self.cli.json;
        config.show_raw = self.cli.raw;
        config.verbose = self.cli.verbose;
        config.debug = self.cli.debug;

        if config.debug {
            eprintln!("Applied CLI overrides to configuration");
            eprintln!(
                "Final config: url={}, phase_timeout={}s, download={} MB, upload={} MB",
                config.base_url,
                config.phase_timeout_seconds,
                config.speed_test.download_file_size_mb,
                config.speed_test.upload_file_size_mb
            );
        }
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let settings = &config.speed_test;
    let mut summary = Vec::new();

    summary.push(format!("Server URL: {}", config.base_url));
    summary.push(format!(
        "Endpoints: {}, {}, {}",
        config.ping_path, config.download_path, config.upload_path
    ));
    summary.push(format!("Phase Timeout: {}s", config.phase_timeout_seconds));
    summary.push(format!(
        "Payloads: download {} MB, upload {} MB",
        settings.download_file_size_mb, settings.upload_file_size_mb
    ));
    summary.push(format!(
        "Calibration: download x{:.3} (max {} Mbps), upload x{:.3} (max {} Mbps), ping x{:.4} (min {} ms)",
        settings.download_calibration_factor,
        settings.max_download_speed_mbps,
        settings.upload_calibration_factor,
        settings.max_upload_speed_mbps,
        settings.ping_calibration_factor,
        settings.min_ping_ms
    ));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}
