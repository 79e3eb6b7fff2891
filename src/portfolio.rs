//! The set of tracked funds.
use crate::core::fund::{PortfolioSummary, summarize};
use crate::core::{Fund, FundStore};
use anyhow::{Result, bail};
use tracing::{debug, info};

/// Owns every tracked fund. Funds are unique by code and kept in the order added.
#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    funds: Vec<Fund>,
}

impl Portfolio {
    pub fn new(funds: Vec<Fund>) -> Self {
        Self { funds }
    }

    pub async fn load(store: &dyn FundStore) -> Result<Self> {
        let funds = store.load_all().await?;
        debug!(funds = funds.len(), "Loaded tracked funds");
        Ok(Self { funds })
    }

    pub async fn save(&self, store: &dyn FundStore) -> Result<()> {
        store.save_all(&self.funds).await
    }

    /// Starts tracking `code`, rejecting blank or duplicate codes and non-positive amounts.
    pub fn add(&mut self, code: &str, held_amount: f64) -> Result<&mut Fund> {
        let code = code.trim();
        if code.is_empty() {
            bail!("Fund code must not be empty");
        }
        if !held_amount.is_finite() || held_amount <= 0.0 {
            bail!("Held amount must be a positive number, got {held_amount}");
        }
        if self.get(code).is_some() {
            bail!("Fund {code} is already tracked");
        }

        info!(code, held_amount, "Tracking fund");
        let index = self.funds.len();
        self.funds.push(Fund::new(code, held_amount));
        Ok(&mut self.funds[index])
    }

    pub fn remove(&mut self, code: &str) -> Option<Fund> {
        let index = self.funds.iter().position(|f| f.code == code)?;
        info!(code, "No longer tracking fund");
        Some(self.funds.remove(index))
    }

    pub fn get(&self, code: &str) -> Option<&Fund> {
        self.funds.iter().find(|f| f.code == code)
    }

    pub fn get_mut(&mut self, code: &str) -> Option<&mut Fund> {
        self.funds.iter_mut().find(|f| f.code == code)
    }

    pub fn funds(&self) -> &[Fund] {
        &self.funds
    }

    pub fn codes(&self) -> Vec<String> {
        self.funds.iter().map(|f| f.code.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.funds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funds.is_empty()
    }

    pub fn summary(&self) -> PortfolioSummary {
        summarize(&self.funds)
    }
}
