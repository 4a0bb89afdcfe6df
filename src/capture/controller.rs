use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{CaptureError, CaptureSession, CaptureStage, CaptureState, CAPTURE_TICK};
use crate::configuration::DemoSettingsStore;
use crate::scheduler::{run_every, ScopedTask, TickFlow};
use crate::services::{PermissionProvider, PermissionStatus};

/// Drives a [`CaptureSession`] from a one-second timer.
///
/// At most one timer runs at a time. Dropping the controller cancels it.
pub struct CaptureController {
    settings: Arc<DemoSettingsStore>,
    permissions: Arc<dyn PermissionProvider>,
    session: Arc<watch::Sender<CaptureSession>>,
    ticker: Option<ScopedTask>,
}

impl CaptureController {
    pub fn new(settings: Arc<DemoSettingsStore>, permissions: Arc<dyn PermissionProvider>) -> Self {
        Self::with_session(settings, permissions, CaptureSession::new())
    }

    /// Use a pre-built session, e.g. one with a shorter duration
    pub fn with_session(
        settings: Arc<DemoSettingsStore>,
        permissions: Arc<dyn PermissionProvider>,
        session: CaptureSession,
    ) -> Self {
        let (sender, _receiver) = watch::channel(session);
        Self {
            settings,
            permissions,
            session: Arc::new(sender),
            ticker: None,
        }
    }

    /// Current state snapshot
    pub fn snapshot(&self) -> CaptureState {
        self.session.borrow().state().clone()
    }

    /// Receive every tick and transition
    pub fn subscribe(&self) -> watch::Receiver<CaptureSession> {
        self.session.subscribe()
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Begin recording after the camera permission check
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        self.session.borrow().ensure_can_start()?;

        if let Err(error) = self.check_permission().await {
            warn!(%error, "recording refused");
            self.session.send_modify(|session| session.refuse(error.clone()));
            return Err(error);
        }

        self.cancel_ticker();

        let mut result = Ok(());
        self.session.send_modify(|session| result = session.start());
        result?;

        let session = Arc::clone(&self.session);
        let run = self.session.borrow().run();
        self.ticker = Some(ScopedTask::spawn(run_every(CAPTURE_TICK, move || {
            advance_recording(&session, run)
        })));

        info!("recording started");
        Ok(())
    }

    /// End the recording early
    pub fn stop(&mut self) -> Result<(), CaptureError> {
        let mut result = Ok(());
        self.session.send_if_modified(|session| {
            result = session.stop();
            result.is_ok()
        });
        if result.is_ok() {
            self.cancel_ticker();
            info!("recording stopped early");
        }
        result
    }

    /// Discard the recording and return to `ready`
    pub fn retake(&mut self) -> Result<(), CaptureError> {
        let mut result = Ok(());
        self.session.send_if_modified(|session| {
            result = session.retake();
            result.is_ok()
        });
        if result.is_ok() {
            self.cancel_ticker();
            debug!("recording discarded");
        }
        result
    }

    /// Hand the finished recording on to processing
    pub fn continue_to_processing(&self) -> Result<(), CaptureError> {
        self.session.borrow().ensure_can_continue()
    }

    /// Stop any running timer; called when the capture screen goes away
    pub fn teardown(&mut self) {
        if self.ticker.is_some() {
            debug!("capture controller torn down");
        }
        self.cancel_ticker();
    }

    async fn check_permission(&self) -> Result<(), CaptureError> {
        if self.settings.get().force_camera_permission_denied {
            return Err(CaptureError::PermissionDenied(PermissionStatus::Denied));
        }

        let mut status = self.permissions.check_camera_permission().await;
        if status != PermissionStatus::Granted {
            status = self.permissions.request_camera_permission().await;
        }

        match status {
            PermissionStatus::Granted => Ok(()),
            other => Err(CaptureError::PermissionDenied(other)),
        }
    }

    fn cancel_ticker(&mut self) {
        if let Some(task) = self.ticker.take() {
            task.cancel();
        }
    }
}

/// Apply one tick if `session` is still on recording `run`
fn advance_recording(session: &watch::Sender<CaptureSession>, run: u64) -> TickFlow {
    let mut flow = TickFlow::Stop;
    session.send_if_modified(|current| {
        if current.run() != run || current.stage() != CaptureStage::Recording {
            return false;
        }
        flow = current.tick();
        true
    });
    flow
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}
