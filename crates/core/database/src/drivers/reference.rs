use std::{collections::HashMap, sync::Arc};

use futures::lock::Mutex;

use crate::{Profile, UserPreferences, UserStats};

database_derived!(
    /// Reference implementation
    #[derive(Default)]
    pub struct ReferenceDb {
        pub profiles: Arc<Mutex<HashMap<String, Profile>>>,
        pub user_stats: Arc<Mutex<HashMap<String, UserStats>>>,
        pub user_preferences: Arc<Mutex<HashMap<String, UserPreferences>>>,
    }
);
