use crate::core::{Fund, FundStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

const FUNDS_PARTITION: &str = "funds";

/// Tracked funds persisted in a fjall keyspace, one JSON record per fund code.
pub struct DiskFundStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskFundStore {
    pub fn open(data_path: &Path) -> Result<Self> {
        let path = data_path.join("funds");
        std::fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;

        let keyspace = Config::new(&path)
            .open()
            .with_context(|| format!("Failed to open fund store at {}", path.display()))?;
        let partition = keyspace
            .open_partition(FUNDS_PARTITION, PartitionCreateOptions::default())
            .context("Failed to open funds partition")?;
        debug!("Opened fund store at {}", path.display());

        Ok(Self {
            keyspace,
            partition,
        })
    }
}

#[async_trait]
impl FundStore for DiskFundStore {
    async fn load_all(&self) -> Result<Vec<Fund>> {
        let mut funds = Vec::new();
        for entry in self.partition.iter() {
            let (key, value) = entry.context("Failed to read fund store")?;
            let fund: Fund = serde_json::from_slice(&value).with_context(|| {
                format!(
                    "Corrupt fund record for key: {}",
                    String::from_utf8_lossy(&key)
                )
            })?;
            funds.push(fund);
        }
        funds.sort_by_key(|f| f.added_at);
        Ok(funds)
    }

    /// Replaces the stored set with `funds` in one atomic batch.
    async fn save_all(&self, funds: &[Fund]) -> Result<()> {
        let tracked: HashSet<&[u8]> = funds.iter().map(|f| f.code.as_bytes()).collect();
        let mut batch = self.keyspace.batch();

        for entry in self.partition.iter() {
            let (key, _) = entry.context("Failed to read fund store")?;
            if !tracked.contains(&*key) {
                debug!(code = %String::from_utf8_lossy(&key), "Removing fund record");
                batch.remove(&self.partition, key);
            }
        }
        for fund in funds {
            batch.insert(
                &self.partition,
                fund.code.as_bytes(),
                serde_json::to_vec(fund)
                    .with_context(|| format!("Failed to encode fund: {}", fund.code))?,
            );
        }

        batch.commit().context("Failed to write fund store")?;
        self.keyspace
            .persist(PersistMode::SyncAll)
            .context("Failed to persist fund store")?;
        debug!(funds = funds.len(), "Saved funds to disk");
        Ok(())
    }
}
