use studiq_result::Result;

use crate::Profile;

#[cfg(feature = "mongodb")]
mod mongodb;
mod reference;

#[async_trait]
pub trait AbstractProfiles: Sync + Send {
    /// Fetch a profile by wallet address
    async fn fetch_profile(&self, id: &str) -> Result<Option<Profile>>;

    /// Insert a profile or replace the existing one
    async fn upsert_profile(&self, profile: &Profile) -> Result<()>;

    /// Delete a profile
    async fn delete_profile(&self, id: &str) -> Result<()>;
}
