//! Speed test orchestration
//!
//! Drives a run through ping, download and upload one phase at a time,
//! publishes a snapshot after every transition and rejects overlapping runs.

pub mod state;

pub use state::PhaseEvent;

use crate::{
    client::{HttpTransport, NetworkClient},
    clock::{Clock, SystemClock},
    error::{AppError, Result},
    executor::PhaseExecutor,
    logging::SpeedTestLogger,
    models::{Config, TestRun, TestSnapshot},
};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Clears the running flag when a run ends, even if its future is dropped
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the run lifecycle and exposes its observable state
pub struct SpeedTestOrchestrator {
    executor: PhaseExecutor,
    logger: SpeedTestLogger,
    running: AtomicBool,
    state: watch::Sender<TestSnapshot>,
}

impl SpeedTestOrchestrator {
    pub fn new(executor: PhaseExecutor, logger: SpeedTestLogger) -> Self {
        let (state, _) = watch::channel(TestSnapshot::default());
        Self {
            executor,
            logger,
            running: AtomicBool::new(false),
            state,
        }
    }

    /// Build an orchestrator with injected transport and clock
    pub fn from_config(
        config: &Config,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let executor = PhaseExecutor::from_config(config, transport, clock)?;
        Ok(Self::new(executor, SpeedTestLogger::new(config)))
    }

    /// Build an orchestrator talking to the real network
    pub fn with_network(config: &Config) -> Result<Self> {
        let client = NetworkClient::from_config(config)?;
        Self::from_config(config, Arc::new(client), Arc::new(SystemClock))
    }

    /// Whether a run is in flight
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Receiver notified after every transition
    pub fn subscribe(&self) -> watch::Receiver<TestSnapshot> {
        self.state.subscribe()
    }

    /// Current observable state
    pub fn snapshot(&self) -> TestSnapshot {
        self.state.borrow().clone()
    }

    /// Run ping, download and upload in order and return the completed run.
    ///
    /// Phase failures never abort the run; they are recorded in the
    /// corresponding result. Fails with [`AppError::Busy`] when another run
    /// is in flight, leaving that run untouched.
    pub async fn start(&self) -> Result<TestRun> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            let error = AppError::busy("A speed test is already running");
            self.logger.log_busy(&error);
            return Err(error);
        }
        let _guard = RunningGuard(&self.running);

        let mut run = TestRun::new().apply(PhaseEvent::Start { at: Utc::now() })?;
        self.publish(&run);
        self.logger.log_run_started(&run);

        while let Some(kind) = run.phase.measurement() {
            self.logger.log_phase_started(&run, run.phase);

            let result = self.executor.execute(kind).await;
            run = run.apply(PhaseEvent::PhaseFinished {
                result,
                at: Utc::now(),
            })?;

            self.publish(&run);
            self.logger.log_phase_finished(&run, kind, run.result(kind));
        }

        self.logger.log_run_completed(&run);
        Ok(run)
    }

    fn publish(&self, run: &TestRun) {
        self.state.send_replace(run.snapshot());
    }
}
