use tracing::debug;

use super::{CaptureAction, CaptureError, CaptureStage, CaptureState, CAPTURE_DURATION_SECS};
use crate::scheduler::TickFlow;

/// Pure capture state machine.
///
/// Progress is derived from the tick count (`ticks * 100 / duration`) so that
/// exactly `duration` ticks reach 100. Every `start` begins a new run.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSession {
    state: CaptureState,
    ticks: u32,
    duration_secs: u32,
    run: u64,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::with_duration(CAPTURE_DURATION_SECS)
    }

    pub fn with_duration(duration_secs: u32) -> Self {
        let duration_secs = duration_secs.max(1);
        Self {
            state: CaptureState {
                stage: CaptureStage::Ready,
                progress_percent: 0.0,
                seconds_remaining: duration_secs,
                error: None,
            },
            ticks: 0,
            duration_secs,
            run: 0,
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn stage(&self) -> CaptureStage {
        self.state.stage
    }

    pub fn progress_percent(&self) -> f64 {
        self.state.progress_percent
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.state.seconds_remaining
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    /// Identifier of the latest recording
    pub fn run(&self) -> u64 {
        self.run
    }

    /// `ready -> recording`
    pub fn start(&mut self) -> Result<(), CaptureError> {
        self.ensure_can_start()?;

        self.run = self.run.wrapping_add(1);
        self.ticks = 0;
        self.state = CaptureState {
            stage: CaptureStage::Recording,
            progress_percent: 0.0,
            seconds_remaining: self.duration_secs,
            error: None,
        };
        Ok(())
    }

    /// One second of recording
    pub fn tick(&mut self) -> TickFlow {
        if self.state.stage != CaptureStage::Recording {
            return TickFlow::Stop;
        }

        self.ticks += 1;
        if self.ticks >= self.duration_secs {
            self.state.progress_percent = 100.0;
            self.state.seconds_remaining = 0;
            self.state.stage = CaptureStage::Complete;
            debug!("recording finished");
            return TickFlow::Stop;
        }

        self.state.progress_percent =
            (f64::from(self.ticks) * 100.0 / f64::from(self.duration_secs)).min(100.0);
        self.state.seconds_remaining = self.duration_secs - self.ticks;
        TickFlow::Continue
    }

    /// `recording -> complete`, keeping the progress reached so far
    pub fn stop(&mut self) -> Result<(), CaptureError> {
        self.expect_stage(CaptureStage::Recording, CaptureAction::Stop)?;
        self.state.stage = CaptureStage::Complete;
        Ok(())
    }

    /// `complete -> ready`, discarding the recording
    pub fn retake(&mut self) -> Result<(), CaptureError> {
        self.expect_stage(CaptureStage::Complete, CaptureAction::Retake)?;
        let run = self.run;
        *self = Self::with_duration(self.duration_secs);
        self.run = run;
        Ok(())
    }

    pub fn ensure_can_start(&self) -> Result<(), CaptureError> {
        self.expect_stage(CaptureStage::Ready, CaptureAction::Start)
    }

    /// Check that the recording may be handed to processing
    pub fn ensure_can_continue(&self) -> Result<(), CaptureError> {
        self.expect_stage(CaptureStage::Complete, CaptureAction::Continue)
    }

    /// Record a refused start without leaving `ready`
    pub fn refuse(&mut self, error: CaptureError) {
        self.state.error = Some(error);
    }

    fn expect_stage(&self, expected: CaptureStage, action: CaptureAction) -> Result<(), CaptureError> {
        if self.state.stage == expected {
            Ok(())
        } else {
            Err(CaptureError::InvalidTransition {
                from: self.state.stage,
                action,
            })
        }
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::PermissionStatus;

    fn recording() -> CaptureSession {
        let mut session = CaptureSession::new();
        session.start().unwrap();
        session
    }

    #[test]
    fn test_new_session_is_ready() {
        let session = CaptureSession::new();
        assert_eq!(session.stage(), CaptureStage::Ready);
        assert_eq!(session.progress_percent(), 0.0);
        assert_eq!(session.seconds_remaining(), 30);
    }

    #[test]
    fn test_thirty_ticks_complete_the_recording() {
        let mut session = recording();
        for _ in 0..29 {
            assert_eq!(session.tick(), TickFlow::Continue);
            assert_eq!(session.stage(), CaptureStage::Recording);
        }
        assert_eq!(session.tick(), TickFlow::Stop);
        assert_eq!(session.stage(), CaptureStage::Complete);
        assert_eq!(session.progress_percent(), 100.0);
        assert_eq!(session.seconds_remaining(), 0);
    }

    #[test]
    fn test_first_tick_values() {
        let mut session = recording();
        session.tick();
        assert!((session.progress_percent() - 100.0 / 30.0).abs() < 1e-9);
        assert_eq!(session.seconds_remaining(), 29);
    }

    #[test]
    fn test_progress_is_monotonic_and_bounded() {
        let mut session = recording();
        let mut last = 0.0;
        for _ in 0..40 {
            session.tick();
            let progress = session.progress_percent();
            assert!(progress >= last);
            assert!((0.0..=100.0).contains(&progress));
            last = progress;
        }
        assert_eq!(session.stage(), CaptureStage::Complete);
    }

    #[test]
    fn test_stop_preserves_progress() {
        let mut session = recording();
        for _ in 0..10 {
            session.tick();
        }
        let progress = session.progress_percent();

        session.stop().unwrap();
        assert_eq!(session.stage(), CaptureStage::Complete);
        assert_eq!(session.progress_percent(), progress);
        assert_eq!(session.seconds_remaining(), 20);
        assert_eq!(session.tick(), TickFlow::Stop);
        assert_eq!(session.progress_percent(), progress);
    }

    #[test]
    fn test_retake_resets() {
        let mut session = recording();
        session.tick();
        session.stop().unwrap();
        session.retake().unwrap();

        assert_eq!(session.state(), CaptureSession::new().state());
        assert_eq!(session.run(), 1);

        session.start().unwrap();
        assert_eq!(session.run(), 2);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut session = CaptureSession::new();
        assert!(session.stop().is_err());
        assert!(session.retake().is_err());
        assert!(session.ensure_can_continue().is_err());

        session.start().unwrap();
        assert_eq!(
            session.start(),
            Err(CaptureError::InvalidTransition {
                from: CaptureStage::Recording,
                action: CaptureAction::Start,
            })
        );
    }

    #[test]
    fn test_refusal_is_cleared_by_start() {
        let mut session = CaptureSession::new();
        session.refuse(CaptureError::PermissionDenied(PermissionStatus::Denied));
        assert!(session.state().error.is_some());
        assert_eq!(session.stage(), CaptureStage::Ready);

        session.start().unwrap();
        assert!(session.state().error.is_none());
    }
}
