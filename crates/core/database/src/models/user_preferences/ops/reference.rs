use studiq_result::Result;

use crate::ReferenceDb;
use crate::UserPreferences;

use super::AbstractUserPreferences;

#[async_trait]
impl AbstractUserPreferences for ReferenceDb {
    /// Fetch preferences by wallet address
    async fn fetch_user_preferences(&self, id: &str) -> Result<Option<UserPreferences>> {
        let user_preferences = self.user_preferences.lock().await;
        Ok(user_preferences.get(id).cloned())
    }

    /// Insert preferences or replace the existing ones
    async fn upsert_user_preferences(&self, preferences: &UserPreferences) -> Result<()> {
        if preferences.language.is_empty() {
            return Err(create_error!(FailedValidation {
                error: "language must be set".to_string()
            }));
        }

        let mut user_preferences = self.user_preferences.lock().await;
        user_preferences.insert(preferences.id.to_string(), preferences.clone());
        Ok(())
    }

    /// Delete preferences
    async fn delete_user_preferences(&self, id: &str) -> Result<()> {
        let mut user_preferences = self.user_preferences.lock().await;
        if user_preferences.remove(id).is_some() {
            Ok(())
        } else {
            Err(create_error!(NotFound))
        }
    }
}
