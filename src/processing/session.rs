use tracing::{debug, warn};

use super::{ProcessingError, ProcessingFault, ProcessingPlan, ProcessingState, PROCESSING_TICK};
use crate::models::DemoSettings;

const NETWORK_ISSUE_AT_PERCENT: f64 = 50.0;
const TIMEOUT_AT_PERCENT: f64 = 85.0;

/// Result of a single processing tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingTick {
    /// Still working
    Running,
    /// Reached 100% without a fault
    Finished,
    /// A fault was injected; the run is halted
    Failed(ProcessingFault),
    /// Nothing to do: already failed or finished
    Halted,
}

/// Pure processing state machine for one run.
///
/// `run` changes on every restart so that a tick scheduled for an earlier
/// run can be told apart and dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingSession {
    plan: ProcessingPlan,
    state: ProcessingState,
    finished: bool,
    cancelled: bool,
    run: u64,
}

impl ProcessingSession {
    pub fn new(plan: ProcessingPlan) -> Self {
        Self {
            plan,
            state: ProcessingState::default(),
            finished: false,
            cancelled: false,
            run: 0,
        }
    }

    /// Identifier of the current run
    pub fn run(&self) -> u64 {
        self.run
    }

    pub fn plan(&self) -> &ProcessingPlan {
        &self.plan
    }

    pub fn state(&self) -> &ProcessingState {
        &self.state
    }

    /// Reached 100% without a fault
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_failed(&self) -> bool {
        self.state.error.is_some()
    }

    /// Torn down before completing or failing
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Advance by one tick, checking fault switches from `settings`
    pub fn tick(&mut self, settings: &DemoSettings) -> ProcessingTick {
        if self.finished || self.cancelled || self.is_failed() {
            return ProcessingTick::Halted;
        }

        let total_ms = self.plan.total_ms();
        let elapsed_ms = self.state.elapsed_ms + PROCESSING_TICK.as_millis() as u64;
        let progress = (elapsed_ms as f64 / total_ms as f64 * 100.0).min(100.0);

        self.state.elapsed_ms = elapsed_ms;
        self.state.progress_percent = progress;
        if let Some(index) = self.plan.step_index_at(elapsed_ms) {
            self.state.current_step_index = self.state.current_step_index.max(index);
        }

        if let Some(fault) = self.injected_fault(settings) {
            warn!(%fault, elapsed_ms, "processing fault injected");
            self.state.error = Some(fault);
            return ProcessingTick::Failed(fault);
        }

        if elapsed_ms >= total_ms {
            self.finished = true;
            debug!(elapsed_ms, "processing finished");
            return ProcessingTick::Finished;
        }

        ProcessingTick::Running
    }

    /// Start over from zero after a fault
    pub fn retry(&mut self, plan: ProcessingPlan) -> Result<(), ProcessingError> {
        if !self.is_failed() {
            return Err(ProcessingError::NotFailed);
        }
        self.restart(plan);
        Ok(())
    }

    /// Discard this run and begin a new one from zero
    pub fn restart(&mut self, plan: ProcessingPlan) {
        let run = self.run.wrapping_add(1);
        *self = Self::new(plan);
        self.run = run;
    }

    /// Stop the run short of completion; waiters see it as cancelled
    pub fn cancel(&mut self) {
        if !self.state.completed && !self.is_failed() {
            self.cancelled = true;
        }
    }

    /// Signal completion once the grace delay has passed
    pub fn mark_completed(&mut self) {
        if self.finished && !self.cancelled {
            self.state.completed = true;
        }
    }

    fn injected_fault(&self, settings: &DemoSettings) -> Option<ProcessingFault> {
        let upload_ms = self.plan.duration_ms(super::ProcessingStep::Upload);

        if settings.force_upload_failure && self.state.elapsed_ms >= upload_ms {
            Some(ProcessingFault::UploadFailed)
        } else if settings.force_network_issue && self.state.progress_percent >= NETWORK_ISSUE_AT_PERCENT {
            Some(ProcessingFault::NetworkIssue)
        } else if settings.force_processing_timeout && self.state.progress_percent >= TIMEOUT_AT_PERCENT {
            Some(ProcessingFault::ProcessingTimeout)
        } else {
            None
        }
    }
}
