use std::sync::Arc;

use iso8601_timestamp::Timestamp;
use studiq_coalesced::{
    CoalescionService, CoalescionServiceConfig, CoalescionStatus, Error as CoalescionError,
};
use studiq_config::SyncDefaults;
use studiq_result::{Error, Result};

use super::{avatar_initials, derive_display_name, shorten_address, validate_wallet_address};
use crate::{AbstractDatabase, AuthUser, Profile, UserPreferences, UserStats};

auto_derived!(
    /// Outcome of synchronising a signed-in user
    pub struct SyncedUser {
        /// Profile as stored after the sync
        pub profile: Profile,
        /// Stats, missing if they could not be read or written
        pub stats: Option<UserStats>,
        /// Preferences, missing if they could not be read or written
        pub preferences: Option<UserPreferences>,
        /// Whether this sync created the profile
        pub is_new_user: bool,
    }
);

/// Keeps local profiles in step with the auth provider, one sync per wallet at a time
#[derive(Clone)]
pub struct ProfileSync {
    service: CoalescionService<String, SyncedUser, Error>,
    defaults: SyncDefaults,
}

impl ProfileSync {
    /// A configured timeout needs the caller to run inside a Tokio runtime
    pub fn new(config: CoalescionServiceConfig, defaults: SyncDefaults) -> ProfileSync {
        ProfileSync {
            service: CoalescionService::from_config(config),
            defaults,
        }
    }

    /// Create a sync service using the current configuration
    pub async fn from_config() -> ProfileSync {
        let config = studiq_config::config().await;

        ProfileSync::new(
            CoalescionServiceConfig {
                max_concurrent: config.sync.max_concurrent(),
                timeout: config.sync.timeout(),
            },
            config.sync.defaults,
        )
    }

    /// Synchronise a signed-in user with their local records
    ///
    /// Callers syncing the same wallet at the same time share one result.
    pub async fn sync(&self, db: &dyn AbstractDatabase, user: &AuthUser) -> Result<Arc<SyncedUser>> {
        validate_wallet_address(&user.wallet_address)?;

        self.service
            .execute(user.wallet_address.clone(), || {
                sync_user(db, user, &self.defaults)
            })
            .await
            .map_err(into_sync_error)
    }

    /// Wallets currently being synchronised
    pub fn status(&self) -> CoalescionStatus {
        self.service.status()
    }

    /// Forget every sync in flight
    pub fn clear_all(&self) -> usize {
        let count = self.service.clear_all();
        if count > 0 {
            warn!("Cleared {count} in-flight profile syncs.");
        }

        count
    }
}

fn into_sync_error(error: CoalescionError<Error>) -> Error {
    match error {
        CoalescionError::Producer(error) => error,
        CoalescionError::InvalidKey => create_error!(InvalidWalletAddress),
        CoalescionError::MaxConcurrent { max } => create_error!(TooManySyncs { max }),
        CoalescionError::Timeout => create_error!(SyncTimeout),
        CoalescionError::Abandoned => create_error!(InternalError),
    }
}

/// Merge what the auth provider knows into the stored profile
fn merge_profile(existing: Option<Profile>, user: &AuthUser, now: Timestamp) -> Profile {
    let provided_name = user
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let mut profile = existing.unwrap_or_else(|| Profile {
        id: user.wallet_address.clone(),
        auth_id: user.auth_id.clone(),
        email: None,
        display_name: String::new(),
        avatar_initials: String::new(),
        avatar_url: None,
        created_at: now,
        updated_at: now,
        last_login_at: now,
    });

    profile.auth_id = user.auth_id.clone();

    if user.email.is_some() {
        profile.email = user.email.clone();
    }

    if user.avatar_url.is_some() {
        profile.avatar_url = user.avatar_url.clone();
    }

    if let Some(name) = provided_name {
        profile.display_name = name.to_string();
    } else if profile.display_name.trim().is_empty() {
        profile.display_name = derive_display_name(user);
    }

    profile.avatar_initials = avatar_initials(&profile.display_name);
    profile.updated_at = now;
    profile.last_login_at = now;
    profile
}

async fn sync_user(
    db: &dyn AbstractDatabase,
    user: &AuthUser,
    defaults: &SyncDefaults,
) -> Result<SyncedUser> {
    let id = user.wallet_address.as_str();
    let now = Timestamp::now_utc();

    let (profile, stats, preferences) = futures::join!(
        db.fetch_profile(id),
        db.fetch_user_stats(id),
        db.fetch_user_preferences(id)
    );

    let existing = profile?;
    let is_new_user = existing.is_none();

    let profile = merge_profile(existing, user, now);
    db.upsert_profile(&profile).await?;

    let stats = match stats {
        Ok(Some(mut stats)) => {
            stats.record_login(now);
            Some(stats)
        }
        Ok(None) => Some(UserStats::new(id.to_string(), now)),
        Err(err) => {
            warn!("Failed to fetch stats for {}: {err}", shorten_address(id));
            None
        }
    };

    let stats = match stats {
        Some(stats) => match db.upsert_user_stats(&stats).await {
            Ok(()) => Some(stats),
            Err(err) => {
                warn!("Failed to save stats for {}: {err}", shorten_address(id));
                None
            }
        },
        None => None,
    };

    let preferences = match preferences {
        Ok(Some(preferences)) => Some(preferences),
        Ok(None) => {
            let preferences = UserPreferences::from_defaults(id.to_string(), defaults, now);
            match db.upsert_user_preferences(&preferences).await {
                Ok(()) => Some(preferences),
                Err(err) => {
                    warn!(
                        "Failed to create preferences for {}: {err}",
                        shorten_address(id)
                    );
                    None
                }
            }
        }
        Err(err) => {
            warn!(
                "Failed to fetch preferences for {}: {err}",
                shorten_address(id)
            );
            None
        }
    };

    if is_new_user {
        info!("Created profile for {}.", shorten_address(id));
    } else {
        debug!("Synced profile for {}.", shorten_address(id));
    }

    Ok(SyncedUser {
        profile,
        stats,
        preferences,
        is_new_user,
    })
}
