use crate::core::cache::Cache;
use crate::core::{DisclosurePeriod, FundHoldings, HoldingsProvider};
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// Memoizes extraction results per fund and period once that period is published.
///
/// A published disclosure never changes, so hits are served forever. The
/// archive answers an unpublished period with its newest older section, so a
/// result is only kept when its date lies in the requested quarter. Empty
/// results and errors are passed through uncached.
#[derive(Clone)]
pub struct CachingHoldingsProvider<T: HoldingsProvider> {
    inner: T,
    cache: Cache<(String, DisclosurePeriod), FundHoldings>,
}

impl<T: HoldingsProvider> CachingHoldingsProvider<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            cache: Cache::new(),
        }
    }
}

#[async_trait]
impl<T: HoldingsProvider> HoldingsProvider for CachingHoldingsProvider<T> {
    async fn fetch_holdings(&self, code: &str, period: DisclosurePeriod) -> Result<FundHoldings> {
        let key = (code.to_string(), period);
        if let Some(cached) = self.cache.get(&key).await {
            debug!(code, %period, "Serving cached holdings");
            return Ok(cached);
        }

        let result = self.inner.fetch_holdings(code, period).await?;
        if is_final(&result, period) {
            self.cache.put(key, result.clone()).await;
        } else {
            debug!(
                code,
                %period,
                date = %result.disclosure_date_label,
                "Not caching holdings outside the requested period"
            );
        }
        Ok(result)
    }
}

/// Whether `holdings` is the disclosure for `period` itself, labelled e.g. `2025-09-30`.
fn is_final(holdings: &FundHoldings, period: DisclosurePeriod) -> bool {
    !holdings.is_empty()
        && holdings
            .disclosure_date_label
            .starts_with(&period.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Holding;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct MockInnerProvider {
        call_count: AtomicUsize,
    }

    impl MockInnerProvider {
        fn new() -> Self {
            Self {
                call_count: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl<'a> HoldingsProvider for &'a MockInnerProvider {
        async fn fetch_holdings(
            &self,
            code: &str,
            period: DisclosurePeriod,
        ) -> Result<FundHoldings> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            match (code, period.quarter_end_month()) {
                ("000001", 9) => Ok(FundHoldings {
                    display_name: "Fund A".to_string(),
                    disclosure_date_label: "2025-09-30".to_string(),
                    holdings: vec![Holding::new("600519", "贵州茅台", 9.0)],
                    error: None,
                }),
                ("000001", _) => Ok(FundHoldings::empty(code, "no holdings rows parsed")),
                _ => Err(anyhow!("Unknown fund")),
            }
        }
    }

    #[tokio::test]
    async fn test_caching_holdings_provider() {
        let inner_provider = MockInnerProvider::new();
        let caching_provider = CachingHoldingsProvider::new(&inner_provider);
        let q3 = DisclosurePeriod::new(2025, 9).unwrap();

        // First call - should hit inner provider
        let first = caching_provider.fetch_holdings("000001", q3).await.unwrap();
        assert_eq!(first.holdings.len(), 1);
        assert_eq!(inner_provider.call_count.load(Ordering::SeqCst), 1);

        // Second call - should be cached
        let second = caching_provider.fetch_holdings("000001", q3).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(inner_provider.call_count.load(Ordering::SeqCst), 1);
    }

    /// Serves the previous quarter's section until `published` is set.
    struct PublishingProvider {
        published: AtomicBool,
        call_count: AtomicUsize,
    }

    #[async_trait]
    impl<'a> HoldingsProvider for &'a PublishingProvider {
        async fn fetch_holdings(
            &self,
            _code: &str,
            _period: DisclosurePeriod,
        ) -> Result<FundHoldings> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            let date = if self.published.load(Ordering::SeqCst) {
                "2025-12-31"
            } else {
                "2025-09-30"
            };
            Ok(FundHoldings {
                display_name: "Fund A".to_string(),
                disclosure_date_label: date.to_string(),
                holdings: vec![Holding::new("600519", "贵州茅台", 9.0)],
                error: None,
            })
        }
    }

    #[tokio::test]
    async fn test_older_section_is_not_cached_for_unpublished_period() {
        let inner_provider = PublishingProvider {
            published: AtomicBool::new(false),
            call_count: AtomicUsize::new(0),
        };
        let caching_provider = CachingHoldingsProvider::new(&inner_provider);
        let q4 = DisclosurePeriod::new(2025, 12).unwrap();

        let before = caching_provider.fetch_holdings("000001", q4).await.unwrap();
        assert_eq!(before.disclosure_date_label, "2025-09-30");

        inner_provider.published.store(true, Ordering::SeqCst);
        let after = caching_provider.fetch_holdings("000001", q4).await.unwrap();
        assert_eq!(after.disclosure_date_label, "2025-12-31");

        // Now final, so served from the cache
        let cached = caching_provider.fetch_holdings("000001", q4).await.unwrap();
        assert_eq!(cached, after);
        assert_eq!(inner_provider.call_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_results_and_errors_are_not_cached() {
        let inner_provider = MockInnerProvider::new();
        let caching_provider = CachingHoldingsProvider::new(&inner_provider);
        let q2 = DisclosurePeriod::new(2025, 6).unwrap();

        for _ in 0..2 {
            let result = caching_provider.fetch_holdings("000001", q2).await.unwrap();
            assert!(result.is_empty());
        }
        assert_eq!(inner_provider.call_count.load(Ordering::SeqCst), 2);

        for _ in 0..2 {
            assert!(caching_provider.fetch_holdings("999999", q2).await.is_err());
        }
        assert_eq!(inner_provider.call_count.load(Ordering::SeqCst), 4);
    }
}
