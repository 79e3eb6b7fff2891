//! Rate limited sequential execution.
//!
//! Upstream quote and archive services throttle bursts, so calls against them
//! are made one at a time with a minimum quiet gap between one call finishing
//! and the next one starting.

use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};

/// Keeps at least `interval` between the end of one paced call and the start
/// of the next. A pacer can be shared across batches so the gap also holds
/// between them.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last_finished: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_finished: None,
        }
    }

    /// Awaits `call` once the gap since the previous paced call has passed.
    /// The first call never waits.
    pub async fn run<Fut: Future>(&mut self, call: Fut) -> Fut::Output {
        if let Some(last) = self.last_finished {
            sleep_until(last + self.interval).await;
        }
        let output = call.await;
        self.last_finished = Some(Instant::now());
        output
    }

    /// Runs `task` over `items` strictly in order, never two at once.
    pub async fn run_sequential<T, R, F, Fut>(
        &mut self,
        items: impl IntoIterator<Item = T>,
        mut task: F,
    ) -> Vec<R>
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = R>,
    {
        let mut results = Vec::new();
        for item in items {
            results.push(self.run(task(item)).await);
        }
        results
    }
}

/// Pacing policy shared by everything that talks to an upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pacing {
    interval: Duration,
}

impl Pacing {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn pacer(&self) -> Pacer {
        Pacer::new(self.interval)
    }

    /// Runs one batch on a fresh [`Pacer`].
    pub async fn run_sequential<T, R, F, Fut>(
        &self,
        items: impl IntoIterator<Item = T>,
        task: F,
    ) -> Vec<R>
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = R>,
    {
        self.pacer().run_sequential(items, task).await
    }
}
