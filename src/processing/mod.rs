//! Simulated processing pipeline: upload, analyze, extract.
//!
//! [`ProcessingSession`] accumulates elapsed time in 100 ms ticks, derives the
//! active step and overall progress from it, and injects the failures the
//! demo settings ask for. [`ProcessingController`] drives it from a timer.

pub mod controller;
pub mod session;

pub use controller::ProcessingController;
pub use session::{ProcessingSession, ProcessingTick};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Interval between processing ticks
pub const PROCESSING_TICK: Duration = Duration::from_millis(100);

/// Delay between reaching 100% and signalling completion
pub const COMPLETION_GRACE: Duration = Duration::from_millis(500);

/// Fast mode multiplies every step duration by 3/10
const FAST_MODE_NUMERATOR: u64 = 3;
const FAST_MODE_DENOMINATOR: u64 = 10;

/// Pipeline steps in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStep {
    Upload,
    Analyze,
    Extract,
}

impl ProcessingStep {
    pub const ALL: [ProcessingStep; 3] = [
        ProcessingStep::Upload,
        ProcessingStep::Analyze,
        ProcessingStep::Extract,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ProcessingStep::Upload => "Uploading Video",
            ProcessingStep::Analyze => "Analyzing Signal",
            ProcessingStep::Extract => "Extracting Vitals",
        }
    }

    /// Nominal duration in milliseconds
    pub fn nominal_duration_ms(&self) -> u64 {
        match self {
            ProcessingStep::Upload => 3_000,
            ProcessingStep::Analyze => 7_000,
            ProcessingStep::Extract => 5_000,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            ProcessingStep::Upload => 0,
            ProcessingStep::Analyze => 1,
            ProcessingStep::Extract => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Step durations for one processing run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingPlan {
    durations_ms: [u64; 3],
}

impl ProcessingPlan {
    pub fn new(fast_mode: bool) -> Self {
        let durations_ms = ProcessingStep::ALL.map(|step| {
            let nominal = step.nominal_duration_ms();
            if fast_mode {
                nominal * FAST_MODE_NUMERATOR / FAST_MODE_DENOMINATOR
            } else {
                nominal
            }
        });
        Self { durations_ms }
    }

    pub fn duration_ms(&self, step: ProcessingStep) -> u64 {
        self.durations_ms[step.index()]
    }

    pub fn total_ms(&self) -> u64 {
        self.durations_ms.iter().sum()
    }

    /// Lowest step index whose cumulative end is at or after `elapsed_ms`
    pub fn step_index_at(&self, elapsed_ms: u64) -> Option<usize> {
        let mut step_end = 0;
        for (index, duration) in self.durations_ms.iter().enumerate() {
            step_end += duration;
            if elapsed_ms <= step_end {
                return Some(index);
            }
        }
        None
    }
}

/// Injected processing failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ProcessingFault {
    #[error("Upload failed. Please try again.")]
    UploadFailed,

    #[error("Network issue detected. Check your connection and retry.")]
    NetworkIssue,

    #[error("Processing timed out. Please try again.")]
    ProcessingTimeout,
}

/// Processing controller errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessingError {
    #[error("Processing has not failed; nothing to retry")]
    NotFailed,

    #[error(transparent)]
    Failed(#[from] ProcessingFault),

    #[error("Processing was cancelled")]
    Cancelled,
}

/// Observable processing state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingState {
    /// Active step, never decreasing and at most 2
    pub current_step_index: usize,

    /// Progress in `[0, 100]`, never decreasing within a run
    pub progress_percent: f64,

    /// Set when a fault halted the run
    pub error: Option<ProcessingFault>,

    /// Simulated time accumulated by ticks
    pub elapsed_ms: u64,

    /// Set once the grace delay after 100% has passed
    pub completed: bool,
}

impl ProcessingState {
    pub fn current_step(&self) -> ProcessingStep {
        ProcessingStep::from_index(self.current_step_index).unwrap_or(ProcessingStep::Extract)
    }
}

impl Default for ProcessingState {
    fn default() -> Self {
        Self {
            current_step_index: 0,
            progress_percent: 0.0,
            error: None,
            elapsed_ms: 0,
            completed: false,
        }
    }
}

impl std::fmt::Display for ProcessingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
