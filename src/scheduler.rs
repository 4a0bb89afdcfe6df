//! Cancellable timer tasks for the stage controllers.
//!
//! A [`ScopedTask`] owns a spawned tokio task and aborts it when cancelled or
//! dropped, so a controller that is torn down never leaves a timer running.
//! Aborting does not interrupt a tick that is already executing; the stage
//! controllers tag ticks with a run id for that case.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// What a tick callback wants to happen next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickFlow {
    Continue,
    Stop,
}

/// Handle to a spawned task that is aborted on drop
#[derive(Debug)]
pub struct ScopedTask {
    handle: JoinHandle<()>,
}

impl ScopedTask {
    /// Spawn `future` on the current tokio runtime
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }

    /// Abort the task.
    ///
    /// On a multi-thread runtime a tick that another worker is already
    /// running still finishes after this returns. Callers that restart work
    /// tag each run and drop ticks from a run that is no longer current.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ScopedTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Call `on_tick` every `period` until it returns [`TickFlow::Stop`].
///
/// The first call happens one full period after the future is first polled,
/// the way a UI interval fires.
pub async fn run_every<F>(period: Duration, mut on_tick: F)
where
    F: FnMut() -> TickFlow,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

    loop {
        ticker.tick().await;
        if on_tick() == TickFlow::Stop {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_run_every_stops_on_request() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);

        let task = ScopedTask::spawn(run_every(Duration::from_millis(100), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if n == 5 {
                TickFlow::Stop
            } else {
                TickFlow::Continue
            }
        }));

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(count.load(Ordering::SeqCst), 5);
        assert!(task.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_period() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);

        let _task = ScopedTask::spawn(run_every(Duration::from_secs(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            TickFlow::Continue
        }));

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_task() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);

        let task = ScopedTask::spawn(run_every(Duration::from_millis(100), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            TickFlow::Continue
        }));

        tokio::time::sleep(Duration::from_millis(350)).await;
        let seen = count.load(Ordering::SeqCst);
        assert_eq!(seen, 3);

        drop(task);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticking() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);

        let task = ScopedTask::spawn(run_every(Duration::from_millis(100), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            TickFlow::Continue
        }));

        task.cancel();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
