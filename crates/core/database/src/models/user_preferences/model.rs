use iso8601_timestamp::Timestamp;
use studiq_config::SyncDefaults;

auto_derived!(
    /// # User Preferences
    pub struct UserPreferences {
        /// Wallet address
        #[serde(rename = "_id")]
        pub id: String,
        /// Colour scheme
        pub theme: String,
        /// Interface and tutor language
        pub language: String,
        /// Whether to send push notifications
        pub notifications: bool,
        /// How the AI tutor should address the student
        pub tutor_tone: String,
        /// When these preferences were last changed
        pub updated_at: Timestamp,
    }
);

impl UserPreferences {
    /// Preferences for a user who has never changed anything
    pub fn from_defaults(id: String, defaults: &SyncDefaults, now: Timestamp) -> UserPreferences {
        UserPreferences {
            id,
            theme: defaults.theme.clone(),
            language: defaults.language.clone(),
            notifications: defaults.notifications,
            tutor_tone: defaults.tutor_tone.clone(),
            updated_at: now,
        }
    }
}
