//! Pure state transitions of a speed test run

use crate::error::{AppError, Result};
use crate::models::{PhaseResult, TestRun};
use crate::types::TestPhase;
use chrono::{DateTime, Utc};

/// Something that happened to a run
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseEvent {
    /// The run was started
    Start { at: DateTime<Utc> },
    /// The measurement of the current phase finished, successfully or not
    PhaseFinished { result: PhaseResult, at: DateTime<Utc> },
}

impl TestRun {
    /// Apply an event and return the next state.
    ///
    /// Only `Start` on a fresh idle run and `PhaseFinished` during a
    /// measuring phase are accepted; a completed run accepts nothing.
    /// Progress never decreases.
    pub fn apply(mut self, event: PhaseEvent) -> Result<TestRun> {
        match event {
            PhaseEvent::Start { at } => {
                if self.phase != TestPhase::Idle || self.started_at.is_some() {
                    return Err(AppError::internal(format!(
                        "Cannot start a run in phase '{}'",
                        self.phase
                    )));
                }
                self.advance();
                self.started_at = Some(at);
                Ok(self)
            }
            PhaseEvent::PhaseFinished { result, at } => {
                let kind = self.phase.measurement().ok_or_else(|| {
                    AppError::internal(format!("No measurement runs in phase '{}'", self.phase))
                })?;

                *self.result_mut(kind) = result;
                self.advance();
                if self.is_complete() {
                    self.completed_at = Some(at);
                }
                Ok(self)
            }
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.phase.next() {
            self.phase = next;
            self.progress = self.progress.max(next.progress());
        }
    }
}
