//! In-process job runner on the tokio runtime.
//!
//! One-shot jobs back the login prompt self-destruct; repeating jobs back the
//! periodic user store flush. All jobs stop when the scheduler is shut down.

use std::{future::Future, time::Duration};

use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::ports::{Task, TaskScheduler};

#[derive(Clone, Debug, Default)]
pub struct TokioScheduler {
    cancel: CancellationToken,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `job` every `period`, first run one period from now.
    pub fn run_repeating<F, Fut>(&self, name: &'static str, period: Duration, mut job: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!(job = name, "repeating job stopped");
                        return;
                    }
                    _ = ticker.tick() => job().await,
                }
            }
        });
    }

    /// Stop all pending and repeating jobs.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl TaskScheduler for TokioScheduler {
    fn run_once(&self, delay: Duration, task: Task) {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = sleep(delay) => task.await,
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn run_once_fires_after_delay() {
        let s = TokioScheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        s.run_once(
            Duration::from_secs(30),
            Box::pin(async move {
                h.fetch_add(1, Ordering::SeqCst);
            }),
        );

        sleep(Duration::from_secs(29)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        sleep(Duration::from_secs(2)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pending_jobs() {
        let s = TokioScheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        s.run_once(
            Duration::from_secs(30),
            Box::pin(async move {
                h.fetch_add(1, Ordering::SeqCst);
            }),
        );
        s.shutdown();

        sleep(Duration::from_secs(60)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_job_ticks_each_period() {
        let s = TokioScheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        s.run_repeating("count", Duration::from_secs(300), move || {
            let h = h.clone();
            async move {
                h.fetch_add(1, Ordering::SeqCst);
            }
        });

        sleep(Duration::from_secs(299)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        sleep(Duration::from_secs(302)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        s.shutdown();
        sleep(Duration::from_secs(900)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
