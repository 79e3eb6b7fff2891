use crate::core::{Fund, FundStore};
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

/// Keeps tracked funds in process memory only.
#[derive(Default)]
pub struct MemoryFundStore {
    funds: Mutex<Vec<Fund>>,
}

impl MemoryFundStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_funds(funds: Vec<Fund>) -> Self {
        Self {
            funds: Mutex::new(funds),
        }
    }
}

#[async_trait]
impl FundStore for MemoryFundStore {
    async fn load_all(&self) -> Result<Vec<Fund>> {
        Ok(self.funds.lock().await.clone())
    }

    async fn save_all(&self, funds: &[Fund]) -> Result<()> {
        *self.funds.lock().await = funds.to_vec();
        debug!(funds = funds.len(), "Saved funds to memory");
        Ok(())
    }
}
