//! Per-fund estimation: resolve disclosed holdings once, then weight live
//! quote changes by portfolio share.

use crate::core::fund::{Fund, weighted_estimate};
use crate::core::quote::live_change;
use crate::core::{DisclosurePeriod, FundHoldings, HoldingsProvider, QuoteProvider};
use crate::pacing::{Pacer, Pacing};
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Outcome of estimating a single fund.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Resolved,
    /// Neither the current nor the previous disclosure period had holdings.
    /// Whether to stop tracking the fund is up to the caller.
    Unresolvable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HoldingsResolution {
    Resolved {
        period: DisclosurePeriod,
        extracted: FundHoldings,
    },
    Unresolvable {
        last_attempt: FundHoldings,
    },
}

pub struct Estimator {
    holdings_provider: Arc<dyn HoldingsProvider>,
    quote_provider: Arc<dyn QuoteProvider>,
    // One pacer for every fund, so the gap also holds between funds
    pacer: Mutex<Pacer>,
}

impl Estimator {
    pub fn new(
        holdings_provider: Arc<dyn HoldingsProvider>,
        quote_provider: Arc<dyn QuoteProvider>,
        pacing: Pacing,
    ) -> Self {
        Self {
            holdings_provider,
            quote_provider,
            pacer: Mutex::new(pacing.pacer()),
        }
    }

    pub fn quote_provider(&self) -> &dyn QuoteProvider {
        self.quote_provider.as_ref()
    }

    async fn extract(&self, code: &str, period: DisclosurePeriod) -> FundHoldings {
        match self.holdings_provider.fetch_holdings(code, period).await {
            Ok(holdings) => holdings,
            Err(e) => {
                warn!(code, %period, error = %e, "Holdings unavailable");
                FundHoldings::empty(code, format!("holdings request failed: {e}"))
            }
        }
    }

    /// Finds disclosed holdings for `code` as of `today`, falling back exactly
    /// one quarter when the latest completed quarter has none.
    pub async fn resolve_holdings(&self, code: &str, today: NaiveDate) -> HoldingsResolution {
        let period = DisclosurePeriod::latest_completed(today);
        debug!(code, %period, "Resolving holdings");

        let current = self.extract(code, period).await;
        if !current.is_empty() {
            return HoldingsResolution::Resolved {
                period,
                extracted: current,
            };
        }

        let previous = period.previous();
        info!(
            code,
            %period,
            fallback = %previous,
            reason = current.error.as_deref().unwrap_or_default(),
            "No holdings for latest quarter, trying previous"
        );

        let fallback = self.extract(code, previous).await;
        if fallback.is_empty() {
            HoldingsResolution::Unresolvable {
                last_attempt: fallback,
            }
        } else {
            HoldingsResolution::Resolved {
                period: previous,
                extracted: fallback,
            }
        }
    }

    /// Refreshes `fund` in place.
    ///
    /// Holdings are only resolved while the fund has none; afterwards every
    /// call just re-prices the cached holdings.
    pub async fn estimate(&self, fund: &mut Fund, today: NaiveDate) -> Resolution {
        if fund.holdings.is_empty() {
            match self.resolve_holdings(&fund.code, today).await {
                HoldingsResolution::Resolved { period, extracted } => {
                    info!(
                        code = %fund.code,
                        %period,
                        holdings = extracted.holdings.len(),
                        "Resolved fund holdings"
                    );
                    fund.display_name = extracted.display_name;
                    fund.disclosure_date_label = extracted.disclosure_date_label;
                    fund.holdings = extracted.holdings;
                }
                HoldingsResolution::Unresolvable { last_attempt } => {
                    warn!(
                        code = %fund.code,
                        reason = last_attempt.error.as_deref().unwrap_or_default(),
                        "Fund holdings unresolvable"
                    );
                    return Resolution::Unresolvable;
                }
            }
        }

        self.refresh_changes(fund).await;
        Resolution::Resolved
    }

    /// Re-prices every holding one quote at a time and recomputes the estimate.
    pub async fn refresh_changes(&self, fund: &mut Fund) {
        let quotes = self.quote_provider.as_ref();
        let codes: Vec<String> = fund
            .holdings
            .iter()
            .map(|h| h.security_code.clone())
            .collect();

        let changes = self
            .pacer
            .lock()
            .await
            .run_sequential(codes, move |code| async move { live_change(quotes, &code).await })
            .await;

        for (holding, change) in fund.holdings.iter_mut().zip(changes) {
            holding.live_change_percent = change;
        }
        fund.estimate_rate_percent = weighted_estimate(&fund.holdings);
        debug!(
            code = %fund.code,
            estimate = fund.estimate_rate_percent,
            "Updated fund estimate"
        );
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::{Holding, Quote};
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    /// Serves canned holdings per period and records every request.
    #[derive(Default)]
    pub(crate) struct StaticHoldings {
        pub responses: HashMap<DisclosurePeriod, FundHoldings>,
        pub requests: Mutex<Vec<(String, DisclosurePeriod)>>,
        pub fail: bool,
    }

    impl StaticHoldings {
        pub fn with(period: DisclosurePeriod, holdings: Vec<Holding>) -> Self {
            let mut responses = HashMap::new();
            responses.insert(
                period,
                FundHoldings {
                    display_name: "华夏成长混合".to_string(),
                    disclosure_date_label: "2025-09-30".to_string(),
                    holdings,
                    error: None,
                },
            );
            Self {
                responses,
                ..Default::default()
            }
        }

        pub fn requested_periods(&self) -> Vec<DisclosurePeriod> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|(_, period)| *period)
                .collect()
        }
    }

    #[async_trait]
    impl HoldingsProvider for StaticHoldings {
        async fn fetch_holdings(
            &self,
            code: &str,
            period: DisclosurePeriod,
        ) -> Result<FundHoldings> {
            self.requests
                .lock()
                .unwrap()
                .push((code.to_string(), period));
            if self.fail {
                return Err(anyhow!("connection refused"));
            }
            Ok(self
                .responses
                .get(&period)
                .cloned()
                .unwrap_or_else(|| FundHoldings::empty(code, "no holdings rows parsed")))
        }
    }

    /// Quotes whose change against a previous close of 100 is the configured value.
    #[derive(Default)]
    pub(crate) struct StaticQuotes {
        pub changes: HashMap<String, f64>,
        pub calls: Mutex<usize>,
    }

    impl StaticQuotes {
        pub fn with(changes: &[(&str, f64)]) -> Self {
            Self {
                changes: changes
                    .iter()
                    .map(|(code, change)| (code.to_string(), *change))
                    .collect(),
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl QuoteProvider for StaticQuotes {
        async fn fetch_quote(&self, code: &str) -> Result<Quote> {
            *self.calls.lock().unwrap() += 1;
            let change = self
                .changes
                .get(code)
                .ok_or_else(|| anyhow!("Unknown security: {code}"))?;
            Ok(Quote {
                code: code.to_string(),
                name: code.to_string(),
                prev_close: 100.0,
                current_price: 100.0 + change,
            })
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 3).unwrap()
    }

    fn q3() -> DisclosurePeriod {
        DisclosurePeriod::new(2025, 9).unwrap()
    }

    fn estimator(holdings: Arc<StaticHoldings>, quotes: Arc<StaticQuotes>) -> Estimator {
        Estimator::new(holdings, quotes, Pacing::default())
    }

    fn sample_holdings() -> Vec<Holding> {
        vec![
            Holding::new("600519", "贵州茅台", 60.0),
            Holding::new("000858", "五粮液", 40.0),
        ]
    }

    #[tokio::test]
    async fn test_end_to_end_estimate() {
        let holdings = Arc::new(StaticHoldings::with(q3(), sample_holdings()));
        let quotes = Arc::new(StaticQuotes::with(&[("600519", 1.0), ("000858", -2.0)]));
        let estimator = estimator(holdings.clone(), quotes);
        let mut fund = Fund::new("000001", 1000.0);

        let resolution = estimator.estimate(&mut fund, today()).await;

        assert_eq!(resolution, Resolution::Resolved);
        assert_eq!(fund.display_name, "华夏成长混合");
        assert_eq!(fund.disclosure_date_label, "2025-09-30");
        assert_eq!(fund.holdings.len(), 2);
        assert!((fund.holdings[0].live_change_percent - 1.0).abs() < 1e-9);
        assert!((fund.holdings[1].live_change_percent - (-2.0)).abs() < 1e-9);
        assert!((fund.estimate_rate_percent - (-0.2)).abs() < 1e-9);
        assert!((fund.estimated_profit() - (-2.0)).abs() < 1e-9);
        assert_eq!(holdings.requested_periods(), vec![q3()]);
    }

    #[tokio::test]
    async fn test_falls_back_one_quarter() {
        let q2 = DisclosurePeriod::new(2025, 6).unwrap();
        let holdings = Arc::new(StaticHoldings::with(q2, sample_holdings()));
        let quotes = Arc::new(StaticQuotes::with(&[("600519", 0.5), ("000858", 0.5)]));
        let estimator = estimator(holdings.clone(), quotes);
        let mut fund = Fund::new("000001", 1000.0);

        let resolution = estimator.estimate(&mut fund, today()).await;

        assert_eq!(resolution, Resolution::Resolved);
        assert_eq!(holdings.requested_periods(), vec![q3(), q2]);
        assert!((fund.estimate_rate_percent - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unresolvable_after_exactly_two_attempts() {
        let holdings = Arc::new(StaticHoldings::default());
        let quotes = Arc::new(StaticQuotes::default());
        let estimator = estimator(holdings.clone(), quotes.clone());
        let mut fund = Fund::new("000001", 1000.0);

        let resolution = estimator.estimate(&mut fund, today()).await;

        assert_eq!(resolution, Resolution::Unresolvable);
        assert_eq!(
            holdings.requested_periods(),
            vec![q3(), DisclosurePeriod::new(2025, 6).unwrap()]
        );
        assert!(fund.holdings.is_empty());
        assert_eq!(*quotes.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_upstream_errors_count_as_no_data() {
        let holdings = Arc::new(StaticHoldings {
            fail: true,
            ..StaticHoldings::with(q3(), sample_holdings())
        });
        let estimator = estimator(holdings.clone(), Arc::new(StaticQuotes::default()));

        match estimator.resolve_holdings("000001", today()).await {
            HoldingsResolution::Unresolvable { last_attempt } => {
                assert_eq!(last_attempt.display_name, "Fund000001");
                assert!(
                    last_attempt
                        .error
                        .unwrap()
                        .starts_with("holdings request failed")
                );
            }
            other => panic!("Expected unresolvable, got {other:?}"),
        }
        assert_eq!(holdings.requested_periods().len(), 2);
    }

    #[tokio::test]
    async fn test_cached_holdings_are_reused() {
        let holdings = Arc::new(StaticHoldings::with(q3(), sample_holdings()));
        let quotes = Arc::new(StaticQuotes::with(&[("600519", 1.0), ("000858", -2.0)]));
        let estimator = estimator(holdings.clone(), quotes.clone());
        let mut fund = Fund::new("000001", 1000.0);

        estimator.estimate(&mut fund, today()).await;
        let first = fund.estimate_rate_percent;
        estimator.estimate(&mut fund, today()).await;

        assert_eq!(holdings.requested_periods().len(), 1);
        assert_eq!(*quotes.calls.lock().unwrap(), 4);
        assert_eq!(fund.estimate_rate_percent, first);
    }

    #[tokio::test]
    async fn test_failed_quotes_contribute_zero_change() {
        let holdings = Arc::new(StaticHoldings::with(q3(), sample_holdings()));
        // 000858 is unknown to the quote provider
        let quotes = Arc::new(StaticQuotes::with(&[("600519", 1.0)]));
        let estimator = estimator(holdings, quotes);
        let mut fund = Fund::new("000001", 1000.0);

        estimator.estimate(&mut fund, today()).await;

        assert_eq!(fund.holdings[1].live_change_percent, 0.0);
        assert!((fund.estimate_rate_percent - 0.6).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_all_zero_weights_estimate_zero() {
        let zero_weighted = vec![
            Holding::new("600519", "贵州茅台", 0.0),
            Holding::new("000858", "五粮液", 0.0),
        ];
        let holdings = Arc::new(StaticHoldings::with(q3(), zero_weighted));
        let quotes = Arc::new(StaticQuotes::with(&[("600519", 3.0), ("000858", 4.0)]));
        let estimator = estimator(holdings, quotes);
        let mut fund = Fund::new("000001", 1000.0);

        assert_eq!(
            estimator.estimate(&mut fund, today()).await,
            Resolution::Resolved
        );
        assert_eq!(fund.estimate_rate_percent, 0.0);
    }

    #[tokio::test]
    async fn test_quote_calls_are_paced() {
        let three = vec![
            Holding::new("600519", "贵州茅台", 50.0),
            Holding::new("000858", "五粮液", 30.0),
            Holding::new("300750", "宁德时代", 20.0),
        ];
        let holdings = Arc::new(StaticHoldings::with(q3(), three));
        let quotes = Arc::new(StaticQuotes::with(&[
            ("600519", 1.0),
            ("000858", 1.0),
            ("300750", 1.0),
        ]));
        let estimator = Estimator::new(holdings, quotes.clone(), Pacing::new(Duration::from_millis(50)));
        let mut fund = Fund::new("000001", 1000.0);

        let start = Instant::now();
        estimator.estimate(&mut fund, today()).await;

        // Two gaps between three quotes
        assert!(start.elapsed() >= Duration::from_millis(100));
        assert_eq!(*quotes.calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_pacing_holds_between_funds() {
        let holdings = Arc::new(StaticHoldings::with(
            q3(),
            vec![Holding::new("600519", "贵州茅台", 100.0)],
        ));
        let quotes = Arc::new(StaticQuotes::with(&[("600519", 1.0)]));
        let estimator = Estimator::new(holdings, quotes, Pacing::new(Duration::from_millis(50)));
        let mut first = Fund::new("000001", 1000.0);
        let mut second = Fund::new("000002", 1000.0);

        estimator.estimate(&mut first, today()).await;
        let start = Instant::now();
        estimator.estimate(&mut second, today()).await;

        assert!(start.elapsed() >= Duration::from_millis(45));
        assert!((second.estimate_rate_percent - 1.0).abs() < 1e-9);
    }
}
