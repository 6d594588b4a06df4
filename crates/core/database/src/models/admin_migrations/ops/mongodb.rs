use mongodb::bson::Document;
use mongodb::IndexModel;

use crate::MongoDb;

use super::AbstractMigrations;

const COLLECTIONS: [&str; 3] = ["profiles", "user_stats", "user_preferences"];

#[async_trait]
impl AbstractMigrations for MongoDb {
    #[cfg(test)]
    /// Drop the database
    async fn drop_database(&self) {
        self.db().drop().await.ok();
    }

    /// Migrate the database
    async fn migrate_database(&self) -> Result<(), ()> {
        info!("Migrating the database.");

        let db = self.db();
        let existing = db.list_collection_names().await.map_err(|err| {
            error!("Failed to fetch collection names: {err}");
        })?;

        for collection in COLLECTIONS {
            if !existing.iter().any(|x| x == collection) {
                info!("Creating {collection} collection.");
                db.create_collection(collection).await.map_err(|err| {
                    error!("Failed to create {collection}: {err}");
                })?;
            }
        }

        // Profiles are also looked up by the id the auth provider gave them
        self.col::<Document>("profiles")
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "auth_id": 1_i32 })
                    .build(),
            )
            .await
            .map_err(|err| {
                error!("Failed to create auth_id index: {err}");
            })?;

        Ok(())
    }
}
