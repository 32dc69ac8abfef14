use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// A cancellable one-shot timer owned by a controller.
///
/// Holds at most one pending timer. Only the delay is cancellable: once the
/// delay has elapsed the work is handed off to its own task, so `cancel()`
/// can never interrupt work half way through.
#[derive(Debug, Default)]
pub struct ScheduledTask {
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `work` to run after `delay`.
    ///
    /// Returns `false` (and drops `work`) if a timer is already pending.
    pub fn schedule<F>(&mut self, delay: Duration, work: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_pending() {
            debug!("Timer already pending, not scheduling another");
            return false;
        }

        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(work);
        }));

        true
    }

    /// True while the delay has not elapsed yet
    pub fn is_pending(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the pending timer. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                let pending = !handle.is_finished();
                handle.abort();
                pending
            }
            None => false,
        }
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
