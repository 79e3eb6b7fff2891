//! Live quote abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Display;
use tracing::warn;

/// Exchange a mainland security code trades on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Market {
    Shanghai,
    Shenzhen,
}

impl Market {
    /// Shanghai listings (stocks and funds) start with 6 or 5, everything else is Shenzhen.
    pub fn for_code(code: &str) -> Self {
        if code.starts_with('6') || code.starts_with('5') {
            Market::Shanghai
        } else {
            Market::Shenzhen
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Market::Shanghai => "sh",
            Market::Shenzhen => "sz",
        }
    }
}

impl Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub code: String,
    pub name: String,
    pub prev_close: f64,
    pub current_price: f64,
}

impl Quote {
    /// Percent change against the previous close, `0.0` when it cannot be computed.
    pub fn change_percent(&self) -> f64 {
        let change = (self.current_price - self.prev_close) / self.prev_close * 100.0;
        if change.is_finite() { change } else { 0.0 }
    }
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(&self, code: &str) -> Result<Quote>;
}

/// Today's percent change for `code`; any failure degrades to `0.0`.
pub async fn live_change(provider: &dyn QuoteProvider, code: &str) -> f64 {
    match provider.fetch_quote(code).await {
        Ok(quote) => quote.change_percent(),
        Err(e) => {
            warn!(code, error = %e, "Quote unavailable, assuming no change");
            0.0
        }
    }
}
