//! Cancellable fixed-period callback primitive.

use futures::future::BoxFuture;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};
use uuid::Uuid;

pub(crate) type TickResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Invokes an async callback once per period on its own tokio task until
/// cancelled.
///
/// The callback can never terminate the timer's own loop: an `Err` is caught
/// at this boundary, logged, and scheduling continues on the next period.
/// Cancellation is idempotent; after `cancel()` returns no further callback
/// starts, though one already in progress may still complete.
pub(crate) struct RepeatTimer {
    timer_id: Uuid,
    task: JoinHandle<()>,
}

impl RepeatTimer {
    pub(crate) fn spawn<F>(period_ms: u64, mut tick: F) -> Self
    where
        F: FnMut() -> BoxFuture<'static, TickResult> + Send + 'static,
    {
        let timer_id = Uuid::new_v4();
        let period = Duration::from_millis(period_ms);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval completes immediately;
            // consume it so the first callback lands one full period after
            // spawn, matching "begins scheduling from the moment of the
            // call".
            interval.tick().await;

            loop {
                interval.tick().await;
                if let Err(err) = tick().await {
                    warn!(timer_id = %timer_id, %err, "periodic callback failed, continuing");
                }
            }
        });

        Self { timer_id, task }
    }

    pub(crate) fn cancel(&self) {
        debug!(timer_id = %self.timer_id, "cancelling repeat timer");
        self.task.abort();
    }
}

impl Drop for RepeatTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::RepeatTimer;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test]
    async fn ticks_repeatedly_until_cancelled() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let ticks_in_timer = ticks.clone();

        let timer = RepeatTimer::spawn(20, move || {
            let ticks = ticks_in_timer.clone();
            Box::pin(async move {
                ticks.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        });

        sleep(Duration::from_millis(130)).await;
        timer.cancel();
        let ticks_at_cancel = ticks.load(Ordering::SeqCst);
        assert!(
            ticks_at_cancel >= 3,
            "expected at least 3 ticks, got {ticks_at_cancel}"
        );

        sleep(Duration::from_millis(100)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), ticks_at_cancel);
    }

    #[tokio::test]
    async fn callback_error_does_not_stop_scheduling() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let ticks_in_timer = ticks.clone();

        let timer = RepeatTimer::spawn(20, move || {
            let ticks = ticks_in_timer.clone();
            Box::pin(async move {
                ticks.fetch_add(1, Ordering::SeqCst);
                Err("flush went sideways".into())
            })
        });

        sleep(Duration::from_millis(130)).await;
        timer.cancel();
        assert!(ticks.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let timer = RepeatTimer::spawn(20, || Box::pin(async { Ok(()) }));
        timer.cancel();
        timer.cancel();
    }
}
