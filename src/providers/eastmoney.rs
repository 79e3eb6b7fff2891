use crate::core::{DisclosurePeriod, FundHoldings, HoldingsProvider};
use crate::providers::archive_parser::extract_holdings;
use crate::providers::util::{http_client, validate_security_code};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::REFERER;
use std::time::Duration;
use tracing::debug;

/// Fetches quarterly top-10 holdings documents from the fund archive service.
pub struct EastmoneyArchiveProvider {
    base_url: String,
    client: reqwest::Client,
}

impl EastmoneyArchiveProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(timeout)?,
        })
    }

    fn archive_url(&self, code: &str, period: DisclosurePeriod) -> String {
        format!(
            "{}/FundArchivesDatas.aspx?type=jjcc&code={}&topline=10&year={}&month={}",
            self.base_url,
            code,
            period.year(),
            period.quarter_end_month()
        )
    }
}

#[async_trait]
impl HoldingsProvider for EastmoneyArchiveProvider {
    async fn fetch_holdings(&self, code: &str, period: DisclosurePeriod) -> Result<FundHoldings> {
        validate_security_code(code)?;
        let url = self.archive_url(code, period);
        debug!("Requesting holdings from {}", url);

        let response = self
            .client
            .get(&url)
            .header(REFERER, format!("{}/ccmx_{}.html", self.base_url, code))
            .send()
            .await
            .with_context(|| format!("Failed to send holdings request for fund: {code}"))?
            .error_for_status()
            .with_context(|| format!("Holdings request rejected for fund: {code}"))?;

        let document = response
            .text()
            .await
            .with_context(|| format!("Failed to get response text for fund: {code}"))?;

        let holdings = extract_holdings(&document, code);
        debug!(
            code,
            %period,
            holdings = holdings.holdings.len(),
            "Extracted holdings"
        );
        Ok(holdings)
    }
}
