//! Runtime seams: sleeping and background polling.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Async sleeping abstraction so delayed work can be tested without waiting.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Owner of a background polling task.
///
/// Dropping the handle aborts the task, so a poller never outlives the
/// component that started it.
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Whether the task has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Run `tick` immediately and then once every `period` until the handle drops.
///
/// Ticks never overlap: a slow tick delays the next one rather than
/// triggering a burst of catch-up ticks.
///
/// # Panics
/// Panics if `period` is zero or when called outside a tokio runtime.
pub fn spawn_poller<F, Fut>(period: Duration, mut tick: F) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            tick().await;
        }
    });
    PollHandle { task }
}
