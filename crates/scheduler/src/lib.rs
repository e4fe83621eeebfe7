//! Background jobs that keep synthetic activity flowing through the engine.
//!
//! Each job runs on its own tokio task and shares the [`Engine`] (and its
//! connection pool) with the HTTP server. A tick is best effort: the first
//! failure is logged and ends that tick, earlier work in the same tick stays
//! committed.

use std::{future::Future, sync::Arc, time::Duration};

use engine::{Engine, ResultEngine};
use tokio::{
    task::JoinSet,
    time::{Instant, MissedTickBehavior},
};

pub use jobs::{AccountSweepJob, SignupJob, WithdrawSweepJob};

mod jobs;

/// A unit of periodic work.
pub trait Job: Send + 'static {
    fn name(&self) -> &'static str;

    /// Run one pass. An error ends the pass early.
    fn tick(&mut self) -> impl Future<Output = ResultEngine<()>> + Send;
}

#[derive(Clone, Copy, Debug)]
pub struct Intervals {
    pub signup: Duration,
    pub account_sweep: Duration,
    pub withdraw_sweep: Duration,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            signup: Duration::from_secs(60),
            account_sweep: Duration::from_secs(12 * 60 * 60),
            withdraw_sweep: Duration::from_secs(30),
        }
    }
}

pub struct Scheduler {
    engine: Arc<Engine>,
    intervals: Intervals,
}

impl Scheduler {
    pub fn new(engine: Arc<Engine>, intervals: Intervals) -> Self {
        Self { engine, intervals }
    }

    /// Start the three jobs on `tasks`.
    pub fn spawn(self, tasks: &mut JoinSet<()>) {
        tracing::info!(intervals = ?self.intervals, "starting scheduler");
        tasks.spawn(drive(
            SignupJob::new(Arc::clone(&self.engine)),
            self.intervals.signup,
        ));
        tasks.spawn(drive(
            AccountSweepJob::new(Arc::clone(&self.engine)),
            self.intervals.account_sweep,
        ));
        tasks.spawn(drive(
            WithdrawSweepJob::new(self.engine),
            self.intervals.withdraw_sweep,
        ));
    }
}

/// Tick `job` forever, first one `period` after the call.
///
/// A tick that overruns delays the next one instead of bursting to catch up.
pub async fn drive<J: Job>(mut job: J, period: Duration) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        if let Err(err) = job.tick().await {
            tracing::error!(job = job.name(), "tick failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    struct Counting(Arc<AtomicU32>);

    impl Job for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn tick(&mut self) -> ResultEngine<()> {
            let calls = self.0.fetch_add(1, Ordering::SeqCst) + 1;
            if calls % 2 == 0 {
                return Err(engine::EngineError::InvalidInput("even tick".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_one_period_and_failures_do_not_stop_the_loop() {
        let calls = Arc::new(AtomicU32::new(0));
        let handle = tokio::spawn(drive(
            Counting(Arc::clone(&calls)),
            Duration::from_secs(30),
        ));

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(62)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        handle.abort();
    }
}
