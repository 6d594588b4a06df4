mod admin_migrations;
mod profiles;
mod user_preferences;
mod user_stats;

pub use admin_migrations::*;
pub use profiles::*;
pub use user_preferences::*;
pub use user_stats::*;

use crate::{Database, ReferenceDb};

#[cfg(feature = "mongodb")]
use crate::MongoDb;

pub trait AbstractDatabase:
    Sync
    + Send
    + admin_migrations::AbstractMigrations
    + profiles::AbstractProfiles
    + user_preferences::AbstractUserPreferences
    + user_stats::AbstractUserStats
{
}

impl AbstractDatabase for ReferenceDb {}

#[cfg(feature = "mongodb")]
impl AbstractDatabase for MongoDb {}

impl std::ops::Deref for Database {
    type Target = dyn AbstractDatabase;

    fn deref(&self) -> &Self::Target {
        match &self {
            Database::Reference(dummy) => dummy,
            #[cfg(feature = "mongodb")]
            Database::MongoDb(mongo) => mongo,
        }
    }
}
