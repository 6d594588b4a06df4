use studiq_result::Result;

use crate::MongoDb;
use crate::Profile;

use super::AbstractProfiles;

static COL: &str = "profiles";

#[async_trait]
impl AbstractProfiles for MongoDb {
    /// Fetch a profile by wallet address
    async fn fetch_profile(&self, id: &str) -> Result<Option<Profile>> {
        query!(self, find_one_by_id, COL, id)
    }

    /// Insert a profile or replace the existing one
    async fn upsert_profile(&self, profile: &Profile) -> Result<()> {
        self.upsert_one_by_id(COL, &profile.id, profile)
            .await
            .map(|_| ())
            .map_err(|_| create_database_error!("replace_one", COL))
    }

    /// Delete a profile
    async fn delete_profile(&self, id: &str) -> Result<()> {
        let result = query!(self, delete_one_by_id, COL, id)?;
        if result.deleted_count == 0 {
            Err(create_error!(NotFound))
        } else {
            Ok(())
        }
    }
}
