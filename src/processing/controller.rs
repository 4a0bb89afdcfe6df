use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use super::{
    ProcessingError, ProcessingPlan, ProcessingSession, ProcessingState, ProcessingTick,
    COMPLETION_GRACE, PROCESSING_TICK,
};
use crate::configuration::DemoSettingsStore;
use crate::models::DemoSettings;
use crate::scheduler::{run_every, ScopedTask, TickFlow};

/// Drives a [`ProcessingSession`] from a 100 ms timer.
///
/// Step durations are fixed when a run starts; fault switches are read from
/// the settings store on every tick. Dropping the controller cancels the
/// timer and any pending completion signal.
pub struct ProcessingController {
    settings: Arc<DemoSettingsStore>,
    session: Arc<watch::Sender<ProcessingSession>>,
    ticker: Option<ScopedTask>,
}

impl ProcessingController {
    pub fn new(settings: Arc<DemoSettingsStore>) -> Self {
        let plan = ProcessingPlan::new(settings.get().fast_mode);
        let (sender, _receiver) = watch::channel(ProcessingSession::new(plan));
        Self {
            settings,
            session: Arc::new(sender),
            ticker: None,
        }
    }

    pub fn snapshot(&self) -> ProcessingState {
        self.session.borrow().state().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProcessingSession> {
        self.session.subscribe()
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Begin a fresh run, replacing any run in progress
    pub fn start(&mut self) {
        self.cancel_ticker();

        let plan = ProcessingPlan::new(self.settings.get().fast_mode);
        self.session.send_modify(|session| session.restart(plan));
        self.spawn_ticker();

        info!(total_ms = plan.total_ms(), "processing started");
    }

    /// Clear the fault and restart from zero
    pub fn retry(&mut self) -> Result<(), ProcessingError> {
        let plan = ProcessingPlan::new(self.settings.get().fast_mode);

        let mut result = Ok(());
        self.session.send_if_modified(|session| {
            result = session.retry(plan);
            result.is_ok()
        });
        result?;

        self.cancel_ticker();
        self.spawn_ticker();

        info!(total_ms = plan.total_ms(), "processing retried");
        Ok(())
    }

    /// Wait until the run completes or fails
    pub async fn wait_for_completion(&self) -> Result<ProcessingState, ProcessingError> {
        let mut receiver = self.session.subscribe();
        let session = receiver
            .wait_for(|session| session.state().completed || session.is_failed() || session.is_cancelled())
            .await
            .map_err(|_| ProcessingError::Cancelled)?;

        if session.is_cancelled() {
            return Err(ProcessingError::Cancelled);
        }
        match session.state().error {
            Some(fault) => Err(ProcessingError::Failed(fault)),
            None => Ok(session.state().clone()),
        }
    }

    /// Stop any running timer; called when the processing screen goes away.
    ///
    /// An unfinished run is marked cancelled so waiters return instead of
    /// hanging.
    pub fn teardown(&mut self) {
        if self.ticker.is_some() {
            debug!("processing controller torn down");
        }
        self.cancel_ticker();
        self.session.send_if_modified(|session| {
            let was_cancelled = session.is_cancelled();
            session.cancel();
            session.is_cancelled() != was_cancelled
        });
    }

    fn spawn_ticker(&mut self) {
        let session = Arc::clone(&self.session);
        let settings = Arc::clone(&self.settings);
        let run = self.session.borrow().run();

        self.ticker = Some(ScopedTask::spawn(async move {
            let ticking = Arc::clone(&session);
            run_every(PROCESSING_TICK, move || advance_run(&ticking, run, &settings.get())).await;

            let finished = {
                let current = session.borrow();
                current.run() == run && current.is_finished()
            };
            if finished {
                tokio::time::sleep(COMPLETION_GRACE).await;
                let completed = session.send_if_modified(|current| {
                    if current.run() != run || current.state().completed {
                        return false;
                    }
                    current.mark_completed();
                    current.state().completed
                });
                if completed {
                    info!("processing complete");
                }
            }
        }));
    }

    fn cancel_ticker(&mut self) {
        if let Some(task) = self.ticker.take() {
            task.cancel();
        }
    }
}

/// Apply one tick to `session` if it still belongs to `run`.
///
/// An aborted ticker may still be mid-tick on another worker after its
/// replacement has started; the run check keeps that tick off the new run.
fn advance_run(session: &watch::Sender<ProcessingSession>, run: u64, settings: &DemoSettings) -> TickFlow {
    let mut outcome = ProcessingTick::Halted;
    session.send_if_modified(|current| {
        if current.run() != run {
            return false;
        }
        outcome = current.tick(settings);
        outcome != ProcessingTick::Halted
    });

    match outcome {
        ProcessingTick::Running => TickFlow::Continue,
        _ => TickFlow::Stop,
    }
}

impl Drop for ProcessingController {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}
