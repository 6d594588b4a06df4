use studiq_result::Result;

use crate::UserStats;

#[cfg(feature = "mongodb")]
mod mongodb;
mod reference;

#[async_trait]
pub trait AbstractUserStats: Sync + Send {
    /// Fetch stats by wallet address
    async fn fetch_user_stats(&self, id: &str) -> Result<Option<UserStats>>;

    /// Insert stats or replace the existing ones
    async fn upsert_user_stats(&self, stats: &UserStats) -> Result<()>;

    /// Delete stats
    async fn delete_user_stats(&self, id: &str) -> Result<()>;
}
