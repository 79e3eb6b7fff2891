use crate::core::{Market, Quote, QuoteProvider};
use crate::providers::util::{http_client, validate_security_code};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use encoding_rs::GBK;
use regex::Regex;
use reqwest::header::REFERER;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

static QUOTE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"="([^"]*)""#).expect("quote pattern is valid"));

const NAME_FIELD: usize = 0;
const PREV_CLOSE_FIELD: usize = 2;
const CURRENT_PRICE_FIELD: usize = 3;

/// Live quotes from the `hq` quote service, one GBK encoded line per security.
pub struct SinaQuoteProvider {
    base_url: String,
    referer: String,
    client: reqwest::Client,
}

impl SinaQuoteProvider {
    pub fn new(base_url: &str, referer: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            referer: referer.to_string(),
            client: http_client(timeout)?,
        })
    }
}

/// Parses `var hq_str_sh600519="name,open,prev_close,price,...";`.
pub fn parse_quote_line(code: &str, line: &str) -> Result<Quote> {
    let payload = QUOTE_LINE
        .captures(line)
        .and_then(|c| c.get(1))
        .ok_or_else(|| anyhow!("No quote data for: {code}"))?
        .as_str();

    let fields: Vec<&str> = payload.split(',').collect();
    if fields.len() <= CURRENT_PRICE_FIELD {
        bail!(
            "Quote for {code} has {} fields, expected at least {}",
            fields.len(),
            CURRENT_PRICE_FIELD + 1
        );
    }

    let number = |index: usize, label: &str| -> Result<f64> {
        fields[index]
            .trim()
            .parse::<f64>()
            .with_context(|| format!("Invalid {label} for {code}: '{}'", fields[index]))
    };

    Ok(Quote {
        code: code.to_string(),
        name: fields[NAME_FIELD].trim().to_string(),
        prev_close: number(PREV_CLOSE_FIELD, "previous close")?,
        current_price: number(CURRENT_PRICE_FIELD, "current price")?,
    })
}

#[async_trait]
impl QuoteProvider for SinaQuoteProvider {
    async fn fetch_quote(&self, code: &str) -> Result<Quote> {
        validate_security_code(code)?;
        let url = format!("{}/list={}{}", self.base_url, Market::for_code(code), code);
        debug!("Requesting quote from {}", url);

        let bytes = self
            .client
            .get(&url)
            .header(REFERER, &self.referer)
            .send()
            .await
            .with_context(|| format!("Failed to send quote request for: {code}"))?
            .error_for_status()
            .with_context(|| format!("Quote request rejected for: {code}"))?
            .bytes()
            .await
            .with_context(|| format!("Failed to read quote response for: {code}"))?;

        let (line, _, had_errors) = GBK.decode(&bytes);
        if had_errors {
            warn!(code, "Quote line contained invalid GBK sequences");
        }

        let quote = parse_quote_line(code, &line)?;
        debug!(code, change = quote.change_percent(), "Fetched quote");
        Ok(quote)
    }
}
