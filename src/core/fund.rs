//! Tracked funds, their disclosed holdings and the derived estimates.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Funds disclose at most this many top holdings per period.
pub const MAX_HOLDINGS: usize = 10;

/// One disclosed equity position of a fund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub security_code: String,
    pub security_name: String,
    /// Percent of fund net assets as of the disclosure date.
    pub portfolio_weight_percent: f64,
    /// Today's price change of the security, refreshed on every pass.
    #[serde(default)]
    pub live_change_percent: f64,
}

impl Holding {
    pub fn new(security_code: &str, security_name: &str, portfolio_weight_percent: f64) -> Self {
        Self {
            security_code: security_code.to_string(),
            security_name: security_name.to_string(),
            portfolio_weight_percent,
            live_change_percent: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fund {
    pub code: String,
    #[serde(default)]
    pub display_name: String,
    pub held_amount: f64,
    #[serde(default)]
    pub estimate_rate_percent: f64,
    #[serde(default)]
    pub holdings: Vec<Holding>,
    #[serde(default)]
    pub disclosure_date_label: String,
    #[serde(default = "Utc::now")]
    pub added_at: DateTime<Utc>,
}

impl Fund {
    /// A freshly tracked fund: no holdings resolved yet and a zero estimate.
    pub fn new(code: &str, held_amount: f64) -> Self {
        Self {
            code: code.to_string(),
            display_name: String::new(),
            held_amount,
            estimate_rate_percent: 0.0,
            holdings: Vec::new(),
            disclosure_date_label: String::new(),
            added_at: Utc::now(),
        }
    }

    pub fn estimated_profit(&self) -> f64 {
        self.held_amount * self.estimate_rate_percent / 100.0
    }
}

/// Weight-weighted mean of the holdings' live changes, `0.0` when no weight is present.
pub fn weighted_estimate(holdings: &[Holding]) -> f64 {
    let (weighted_sum, weight_total) =
        holdings
            .iter()
            .fold((0.0, 0.0), |(weighted_sum, weight_total), holding| {
                (
                    weighted_sum + holding.live_change_percent * holding.portfolio_weight_percent,
                    weight_total + holding.portfolio_weight_percent,
                )
            });

    if weight_total > 0.0 {
        weighted_sum / weight_total
    } else {
        0.0
    }
}

/// Portfolio level totals across all tracked funds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PortfolioSummary {
    pub total_held_amount: f64,
    pub total_estimated_profit: f64,
}

pub fn summarize(funds: &[Fund]) -> PortfolioSummary {
    PortfolioSummary {
        total_held_amount: funds.iter().map(|f| f.held_amount).sum(),
        total_estimated_profit: funds.iter().map(Fund::estimated_profit).sum(),
    }
}
