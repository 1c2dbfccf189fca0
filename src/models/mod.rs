//! Data models for configuration and speed test results

pub mod config;
pub mod metrics;

pub use config::{Config, SpeedTestConfig};
pub use metrics::{PhaseResult, TestRun, TestSnapshot};
