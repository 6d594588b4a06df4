use crate::ReferenceDb;

use super::AbstractMigrations;

#[async_trait]
impl AbstractMigrations for ReferenceDb {
    #[cfg(test)]
    /// Drop the database
    async fn drop_database(&self) {
        self.profiles.lock().await.clear();
        self.user_stats.lock().await.clear();
        self.user_preferences.lock().await.clear();
    }

    /// Migrate the database
    async fn migrate_database(&self) -> Result<(), ()> {
        // Here you would do your typical migrations if this was a real database.
        Ok(())
    }
}
