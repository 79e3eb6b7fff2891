//! Holdings disclosure abstractions

use crate::core::fund::Holding;
use crate::core::period::DisclosurePeriod;
use anyhow::Result;
use async_trait::async_trait;

/// What could be recovered from one disclosure document.
///
/// An empty `holdings` list is a normal outcome meaning "nothing disclosed for
/// this period"; `error` then describes why.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FundHoldings {
    pub display_name: String,
    pub disclosure_date_label: String,
    pub holdings: Vec<Holding>,
    pub error: Option<String>,
}

impl FundHoldings {
    pub fn empty(code: &str, error: impl Into<String>) -> Self {
        Self {
            display_name: default_display_name(code),
            disclosure_date_label: String::new(),
            holdings: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }
}

/// Name used when the disclosure carries no fund title.
pub fn default_display_name(code: &str) -> String {
    format!("Fund{code}")
}

#[async_trait]
pub trait HoldingsProvider: Send + Sync {
    async fn fetch_holdings(&self, code: &str, period: DisclosurePeriod) -> Result<FundHoldings>;
}
