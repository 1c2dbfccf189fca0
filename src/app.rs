//! Main application orchestration and execution

use crate::{
    cli::Cli,
    config::{display_config_summary, load_config, validate_config},
    error::{AppError, Result},
    models::{Config, TestRun},
    orchestrator::SpeedTestOrchestrator,
    output::OutputCoordinator,
};
use tokio::task::JoinHandle;

/// Main application struct that coordinates all components
pub struct App {
    config: Config,
}

impl App {
    /// Create a new application instance with CLI configuration
    pub fn new(cli: Cli) -> Result<Self> {
        Ok(Self::from_config(load_config(cli)?))
    }

    /// Create an application from an already loaded configuration
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one speed test against the configured server
    pub async fn run(&self) -> Result<TestRun> {
        let orchestrator = SpeedTestOrchestrator::with_network(&self.config)?;
        self.run_with(orchestrator).await
    }

    /// Run one speed test on the given orchestrator and print the results.
    ///
    /// Fails with a test execution error when no phase produced a value.
    pub async fn run_with(&self, orchestrator: SpeedTestOrchestrator) -> Result<TestRun> {
        let config = &self.config;
        let coordinator = OutputCoordinator::new(config);

        if config.debug {
            eprintln!("{}", crate::build_info());
            eprintln!("\nConfiguration Summary:");
            eprintln!("{}\n", display_config_summary(config));
        }

        // Warnings go to stderr so JSON output stays parseable
        let warnings = validate_config(config)?;
        for warning in &warnings {
            eprintln!("{}", warning.format(config.enable_color));
        }

        if !config.json_output {
            eprintln!("Testing against {}", config.base_url);
        }

        let progress = self.spawn_progress_printer(&orchestrator);
        let run = orchestrator.start().await;

        // Dropping the orchestrator closes the channel and ends the printer
        drop(orchestrator);
        if let Some(handle) = progress {
            let _ = handle.await;
        }
        let run = run?;

        println!("{}", coordinator.display_results(&run)?);

        if run.successful_phases() == 0 {
            return Err(AppError::test_execution(
                "No measurement succeeded - check that the speed test server is reachable",
            ));
        }

        Ok(run)
    }

    /// Print each published snapshot to stderr while the run is in flight
    fn spawn_progress_printer(&self, orchestrator: &SpeedTestOrchestrator) -> Option<JoinHandle<()>> {
        if self.config.json_output {
            return None;
        }

        let printer = OutputCoordinator::new(&self.config);
        let mut updates = orchestrator.subscribe();

        Some(tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                let snapshot = updates.borrow_and_update().clone();
                if let Ok(line) = printer.display_progress(&snapshot) {
                    eprintln!("{}", line);
                }
            }
        }))
    }
}
