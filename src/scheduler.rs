//! Drives estimation across every tracked fund.
//!
//! Funds are refreshed one after another, never concurrently, and a fund
//! whose holdings cannot be resolved is dropped from the portfolio.

use crate::core::{Fund, FundStore};
use crate::engine::{Estimator, Resolution};
use crate::portfolio::Portfolio;
use anyhow::{Result, bail};
use chrono::{Local, NaiveDate};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Notified whenever the tracked set changes, typically to re-render it.
pub trait RefreshObserver: Send + Sync {
    fn fund_updated(&self, _fund: &Fund) {}

    fn fund_removed(&self, _code: &str) {}

    fn pass_completed(&self, _portfolio: &Portfolio) {}
}

pub struct NoopObserver;

impl RefreshObserver for NoopObserver {}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
    pub refreshed: usize,
    pub removed: Vec<String>,
}

pub struct RefreshScheduler {
    estimator: Estimator,
    store: Arc<dyn FundStore>,
    interval: Duration,
}

impl RefreshScheduler {
    pub fn new(estimator: Estimator, store: Arc<dyn FundStore>, interval: Duration) -> Self {
        Self {
            estimator,
            store,
            // tokio intervals cannot tick with a zero period
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    pub fn store(&self) -> &dyn FundStore {
        self.store.as_ref()
    }

    async fn refresh_one(
        &self,
        portfolio: &mut Portfolio,
        code: &str,
        today: NaiveDate,
        observer: &dyn RefreshObserver,
    ) -> Option<Resolution> {
        let fund = portfolio.get_mut(code)?;
        let resolution = self.estimator.estimate(fund, today).await;
        match resolution {
            Resolution::Resolved => observer.fund_updated(fund),
            Resolution::Unresolvable => {
                portfolio.remove(code);
                observer.fund_removed(code);
            }
        }
        Some(resolution)
    }

    /// Estimates a single fund outside the periodic cadence, e.g. right after it was added.
    pub async fn refresh_fund(
        &self,
        portfolio: &mut Portfolio,
        code: &str,
        observer: &dyn RefreshObserver,
    ) -> Result<Resolution> {
        let today = Local::now().date_naive();
        let Some(resolution) = self.refresh_one(portfolio, code, today, observer).await else {
            bail!("Fund {code} is not tracked");
        };
        portfolio.save(self.store()).await?;
        Ok(resolution)
    }

    /// Refreshes every tracked fund once, saving after each one.
    pub async fn run_pass(
        &self,
        portfolio: &mut Portfolio,
        observer: &dyn RefreshObserver,
    ) -> PassReport {
        let today = Local::now().date_naive();
        info!(funds = portfolio.len(), "Starting refresh pass");

        let mut report = PassReport::default();
        for code in portfolio.codes() {
            match self.refresh_one(portfolio, &code, today, observer).await {
                Some(Resolution::Resolved) => report.refreshed += 1,
                Some(Resolution::Unresolvable) => report.removed.push(code),
                None => continue,
            }
            if let Err(e) = portfolio.save(self.store()).await {
                error!(error = %e, "Failed to save tracked funds");
            }
        }

        observer.pass_completed(portfolio);
        info!(
            refreshed = report.refreshed,
            removed = report.removed.len(),
            "Refresh pass complete"
        );
        report
    }

    /// Runs a pass immediately and then once per interval until `shutdown` resolves.
    ///
    /// Returns the number of completed passes. Nothing runs when no fund is tracked.
    pub async fn run_until<F>(
        &self,
        portfolio: &mut Portfolio,
        observer: &dyn RefreshObserver,
        shutdown: F,
    ) -> usize
    where
        F: Future<Output = ()>,
    {
        if portfolio.is_empty() {
            info!("No funds tracked, nothing to refresh");
            return 0;
        }

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            interval_secs = self.interval.as_secs(),
            "Entering refresh loop. Press Ctrl+C to stop."
        );

        let mut passes = 0;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.run_pass(portfolio, observer).await;
                    passes += 1;
                }
                _ = &mut shutdown => {
                    info!("Shutdown signal received.");
                    break;
                }
            }
        }
        passes
    }
}
