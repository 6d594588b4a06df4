use studiq_result::Result;

use crate::UserPreferences;

#[cfg(feature = "mongodb")]
mod mongodb;
mod reference;

#[async_trait]
pub trait AbstractUserPreferences: Sync + Send {
    /// Fetch preferences by wallet address
    async fn fetch_user_preferences(&self, id: &str) -> Result<Option<UserPreferences>>;

    /// Insert preferences or replace the existing ones
    async fn upsert_user_preferences(&self, preferences: &UserPreferences) -> Result<()>;

    /// Delete preferences
    async fn delete_user_preferences(&self, id: &str) -> Result<()>;
}
