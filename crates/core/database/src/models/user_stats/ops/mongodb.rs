use studiq_result::Result;

use crate::MongoDb;
use crate::UserStats;

use super::AbstractUserStats;

static COL: &str = "user_stats";

#[async_trait]
impl AbstractUserStats for MongoDb {
    /// Fetch stats by wallet address
    async fn fetch_user_stats(&self, id: &str) -> Result<Option<UserStats>> {
        query!(self, find_one_by_id, COL, id)
    }

    /// Insert stats or replace the existing ones
    async fn upsert_user_stats(&self, stats: &UserStats) -> Result<()> {
        self.upsert_one_by_id(COL, &stats.id, stats)
            .await
            .map(|_| ())
            .map_err(|_| create_database_error!("replace_one", COL))
    }

    /// Delete stats
    async fn delete_user_stats(&self, id: &str) -> Result<()> {
        let result = query!(self, delete_one_by_id, COL, id)?;
        if result.deleted_count == 0 {
            Err(create_error!(NotFound))
        } else {
            Ok(())
        }
    }
}
