use studiq_result::Result;

use crate::ReferenceDb;
use crate::UserStats;

use super::AbstractUserStats;

#[async_trait]
impl AbstractUserStats for ReferenceDb {
    /// Fetch stats by wallet address
    async fn fetch_user_stats(&self, id: &str) -> Result<Option<UserStats>> {
        let user_stats = self.user_stats.lock().await;
        Ok(user_stats.get(id).cloned())
    }

    /// Insert stats or replace the existing ones
    async fn upsert_user_stats(&self, stats: &UserStats) -> Result<()> {
        if stats.login_count < 0 || stats.streak_days < 0 {
            return Err(create_error!(FailedValidation {
                error: "counters must not be negative".to_string()
            }));
        }

        let mut user_stats = self.user_stats.lock().await;
        user_stats.insert(stats.id.to_string(), stats.clone());
        Ok(())
    }

    /// Delete stats
    async fn delete_user_stats(&self, id: &str) -> Result<()> {
        let mut user_stats = self.user_stats.lock().await;
        if user_stats.remove(id).is_some() {
            Ok(())
        } else {
            Err(create_error!(NotFound))
        }
    }
}
