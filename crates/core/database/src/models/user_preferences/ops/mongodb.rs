use studiq_result::Result;

use crate::MongoDb;
use crate::UserPreferences;

use super::AbstractUserPreferences;

static COL: &str = "user_preferences";

#[async_trait]
impl AbstractUserPreferences for MongoDb {
    /// Fetch preferences by wallet address
    async fn fetch_user_preferences(&self, id: &str) -> Result<Option<UserPreferences>> {
        query!(self, find_one_by_id, COL, id)
    }

    /// Insert preferences or replace the existing ones
    async fn upsert_user_preferences(&self, preferences: &UserPreferences) -> Result<()> {
        self.upsert_one_by_id(COL, &preferences.id, preferences)
            .await
            .map(|_| ())
            .map_err(|_| create_database_error!("replace_one", COL))
    }

    /// Delete preferences
    async fn delete_user_preferences(&self, id: &str) -> Result<()> {
        let result = query!(self, delete_one_by_id, COL, id)?;
        if result.deleted_count == 0 {
            Err(create_error!(NotFound))
        } else {
            Ok(())
        }
    }
}
