/// Points accrued per hour of an active earning session, before tier
/// multipliers.
pub const BASE_RATE_PER_HOUR: f64 = 10_800.0;

/// Per-session accrual cap for the free Standard tier.
pub const STANDARD_SESSION_CAP: i64 = 3_600;

/// Flat bonus credited to every newly registered account.
pub const JOIN_BONUS: i64 = 30_000;

/// Flat bonus credited to the direct referrer on each registration.
pub const DIRECT_REFERRAL_BONUS: i64 = 15_000;

/// Base amount the cascade shares are taken from.
pub const CASCADE_BASE: i64 = 30_000;

/// Share of [`CASCADE_BASE`] paid to each ancestor level, starting at the
/// direct referrer.  The chain stops early if an ancestor has no referrer.
pub const CASCADE_SHARES: [f64; 5] = [0.20, 0.10, 0.05, 0.025, 0.0125];

/// Daily claim amount per streak day.
pub const DAILY_CLAIM_STEP: i64 = 1_000;

/// Upper bound on a single daily claim.
pub const DAILY_CLAIM_CAP: i64 = 30_000;

/// Streak length at which the daily claim amount stops growing.
pub const MAX_STREAK_DAYS: i64 = 30;

/// Daily referrals must exceed this count for the claim bonus.
pub const DAILY_BONUS_REFERRAL_THRESHOLD: i64 = 2;

/// Multiplier applied to a daily claim when the referral bonus is earned.
pub const DAILY_BONUS_MULTIPLIER: i64 = 2;

/// Referral counts required to enter each classification tier.
pub const PROMOTER_THRESHOLD: i64 = 1_001;
pub const INFLUENCER_THRESHOLD: i64 = 5_001;
pub const AMBASSADOR_THRESHOLD: i64 = 10_001;

/// One-time awards paid on first entering each classification tier.
pub const PROMOTER_AWARD: i64 = 159_000;
pub const INFLUENCER_AWARD: i64 = 500_000;
pub const AMBASSADOR_AWARD: i64 = 1_200_000;

/// Per-account reuse cooldown for a single promo code, in hours.
pub const PROMO_COOLDOWN_HOURS: i64 = 24;
