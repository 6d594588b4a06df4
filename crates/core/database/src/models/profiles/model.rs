use iso8601_timestamp::Timestamp;

auto_derived!(
    /// # Profile
    pub struct Profile {
        /// Wallet address
        #[serde(rename = "_id")]
        pub id: String,
        /// Id assigned by the auth provider
        pub auth_id: String,
        /// Email address, if the user signed in with one
        #[serde(skip_serializing_if = "Option::is_none")]
        pub email: Option<String>,
        /// Name shown across the app
        pub display_name: String,
        /// Initials shown when there is no avatar
        pub avatar_initials: String,
        /// Avatar image
        #[serde(skip_serializing_if = "Option::is_none")]
        pub avatar_url: Option<String>,

        /// When this profile was first created
        pub created_at: Timestamp,
        /// When this profile was last written
        pub updated_at: Timestamp,
        /// When the user last signed in
        pub last_login_at: Timestamp,
    }
);

impl Profile {
    /// Shortened wallet address, e.g. `7xKX...gAsU`
    pub fn short_address(&self) -> String {
        crate::sync::shorten_address(&self.id)
    }
}
