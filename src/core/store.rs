//! Persistence seam for the tracked fund list

use crate::core::fund::Fund;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait FundStore: Send + Sync {
    /// Every tracked fund, in the order they were added.
    async fn load_all(&self) -> Result<Vec<Fund>>;

    /// Replaces the stored set with `funds`.
    async fn save_all(&self, funds: &[Fund]) -> Result<()>;
}
