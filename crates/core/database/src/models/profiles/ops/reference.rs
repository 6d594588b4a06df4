use studiq_result::Result;

use crate::Profile;
use crate::ReferenceDb;

use super::AbstractProfiles;

#[async_trait]
impl AbstractProfiles for ReferenceDb {
    /// Fetch a profile by wallet address
    async fn fetch_profile(&self, id: &str) -> Result<Option<Profile>> {
        let profiles = self.profiles.lock().await;
        Ok(profiles.get(id).cloned())
    }

    /// Insert a profile or replace the existing one
    async fn upsert_profile(&self, profile: &Profile) -> Result<()> {
        let mut profiles = self.profiles.lock().await;
        profiles.insert(profile.id.to_string(), profile.clone());
        Ok(())
    }

    /// Delete a profile
    async fn delete_profile(&self, id: &str) -> Result<()> {
        let mut profiles = self.profiles.lock().await;
        if profiles.remove(id).is_some() {
            Ok(())
        } else {
            Err(create_error!(NotFound))
        }
    }
}
