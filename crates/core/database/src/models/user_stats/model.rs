use iso8601_timestamp::Timestamp;

/// Experience awarded for the first sign-in of a UTC day
pub const DAILY_LOGIN_XP: i64 = 10;

/// Experience needed for each level
pub const XP_PER_LEVEL: i64 = 100;

auto_derived!(
    /// # User Stats
    pub struct UserStats {
        /// Wallet address
        #[serde(rename = "_id")]
        pub id: String,
        /// Experience earned from tutoring sessions and daily sign-ins
        pub xp: i64,
        /// Level derived from experience
        pub level: i32,
        /// Consecutive UTC days the user has signed in
        pub streak_days: i32,
        /// Total number of sign-ins
        pub login_count: i64,
        /// Campus rewards points available to spend
        pub rewards_balance: i64,
        /// Last time the user was seen
        pub last_active_at: Timestamp,
    }
);

/// Days since the unix epoch, in UTC
pub fn utc_day(timestamp: Timestamp) -> i64 {
    timestamp
        .duration_since(Timestamp::UNIX_EPOCH)
        .whole_days()
}

/// Streak after signing in on `today`, given the streak as of `last_day`
pub fn next_streak(streak: i32, last_day: i64, today: i64) -> i32 {
    match today - last_day {
        0 => streak.max(1),
        1 => streak.saturating_add(1),
        _ => 1,
    }
}

/// Level reached with this much experience
pub fn level_for_xp(xp: i64) -> i32 {
    (xp.max(0) / XP_PER_LEVEL + 1).try_into().unwrap_or(i32::MAX)
}

impl UserStats {
    /// Stats for a user signing in for the first time
    pub fn new(id: String, now: Timestamp) -> UserStats {
        UserStats {
            id,
            xp: DAILY_LOGIN_XP,
            level: level_for_xp(DAILY_LOGIN_XP),
            streak_days: 1,
            login_count: 1,
            rewards_balance: 0,
            last_active_at: now,
        }
    }

    /// Account for another sign-in
    pub fn record_login(&mut self, now: Timestamp) {
        let today = utc_day(now);
        let last_day = utc_day(self.last_active_at);

        if today > last_day {
            self.xp = self.xp.saturating_add(DAILY_LOGIN_XP);
            self.level = level_for_xp(self.xp);
        }

        self.streak_days = next_streak(self.streak_days, last_day, today);
        self.login_count = self.login_count.saturating_add(1);
        self.last_active_at = now;
    }
}

#[cfg(test)]
mod tests {
    use iso8601_timestamp::{Duration, Timestamp};

    use super::{level_for_xp, next_streak, utc_day, UserStats, DAILY_LOGIN_XP};

    fn day(n: i64) -> Timestamp {
        Timestamp::UNIX_EPOCH.saturating_add(Duration::days(n) + Duration::hours(9))
    }

    #[test]
    fn streak_rules() {
        assert_eq!(next_streak(4, 100, 100), 4);
        assert_eq!(next_streak(4, 100, 101), 5);
        assert_eq!(next_streak(4, 100, 103), 1);
        assert_eq!(next_streak(0, 100, 100), 1);
    }

    #[test]
    fn levels() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(-5), 1);
    }

    #[test]
    fn logins_update_streak_and_xp() {
        assert_eq!(utc_day(day(20_000)), 20_000);

        let mut stats = UserStats::new("wallet".to_string(), day(20_000));
        assert_eq!(stats.login_count, 1);
        assert_eq!(stats.streak_days, 1);

        stats.record_login(day(20_000));
        assert_eq!(stats.login_count, 2);
        assert_eq!(stats.streak_days, 1);
        assert_eq!(stats.xp, DAILY_LOGIN_XP);

        stats.record_login(day(20_001));
        assert_eq!(stats.streak_days, 2);
        assert_eq!(stats.xp, DAILY_LOGIN_XP * 2);

        stats.record_login(day(20_005));
        assert_eq!(stats.streak_days, 1);
        assert_eq!(stats.login_count, 4);
        assert_eq!(stats.last_active_at, day(20_005));
    }
}
