//! Account records and the earning-session engine.
//!
//! An account carries two independent tiers: the [`EarningTier`] bought
//! or granted for accrual multipliers (expirable), and the
//! [`Classification`] derived from referral counts (monotone, never
//! revoked).  The two were a single field in earlier deployments; they
//! are kept separate here so a tier purchase can never erase a
//! classification and vice versa.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{BASE_RATE_PER_HOUR, STANDARD_SESSION_CAP};
use crate::error::LedgerError;

// ---------------------------------------------------------------------------
// Earning tier
// ---------------------------------------------------------------------------

/// Accrual-multiplier tier of an account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum EarningTier {
    /// Free tier.  Sessions accrue at the base rate but cap out quickly.
    #[default]
    Standard,
    /// Paid monthly tier, base rate without the session cap.
    MonthlyBooster,
    /// One-time purchase, base rate without the session cap, never expires.
    LifetimeBooster,
    /// Paid monthly tier at 3x the base rate.
    Monthly3xBooster,
    /// One-time purchase at 6x the base rate, never expires.
    Lifetime6xBooster,
}

impl EarningTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            EarningTier::Standard => "Standard",
            EarningTier::MonthlyBooster => "MonthlyBooster",
            EarningTier::LifetimeBooster => "LifetimeBooster",
            EarningTier::Monthly3xBooster => "Monthly3xBooster",
            EarningTier::Lifetime6xBooster => "Lifetime6xBooster",
        }
    }

    pub fn parse(s: &str) -> Result<Self, LedgerError> {
        match s {
            "Standard" => Ok(EarningTier::Standard),
            "MonthlyBooster" => Ok(EarningTier::MonthlyBooster),
            "LifetimeBooster" => Ok(EarningTier::LifetimeBooster),
            "Monthly3xBooster" => Ok(EarningTier::Monthly3xBooster),
            "Lifetime6xBooster" => Ok(EarningTier::Lifetime6xBooster),
            other => Err(LedgerError::UnknownTier(other.to_string())),
        }
    }

    /// Lifetime tiers never expire.
    pub fn is_lifetime(&self) -> bool {
        matches!(
            self,
            EarningTier::LifetimeBooster | EarningTier::Lifetime6xBooster
        )
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Referral-count-derived tier.  Ordered so that a later variant always
/// outranks an earlier one.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default,
)]
pub enum Classification {
    #[default]
    None,
    Promoter,
    Influencer,
    Ambassador,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::None => "None",
            Classification::Promoter => "Promoter",
            Classification::Influencer => "Influencer",
            Classification::Ambassador => "Ambassador",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "None" => Some(Classification::None),
            "Promoter" => Some(Classification::Promoter),
            "Influencer" => Some(Classification::Influencer),
            "Ambassador" => Some(Classification::Ambassador),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// A registered end-user record.
///
/// The `display_name` doubles as the account's referral code.  The
/// referral list itself is derived from the `referred_by` pointers of
/// other accounts; it is not stored here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    /// Unique account identifier.
    pub id: Uuid,
    /// Stable identity from the upstream messaging platform.
    pub external_id: String,
    /// Unique display name; doubles as the referral code.
    pub display_name: String,
    /// Optional withdrawal address, unique across accounts when set.
    pub wallet_address: Option<String>,
    /// Accrual-multiplier tier.
    pub earning_tier: EarningTier,
    /// Referral-count classification.
    pub classification: Classification,
    /// Spendable points.
    pub balance: i64,
    /// Lifetime points accrued.  Never decreases.
    pub total_earnings: i64,
    /// Whether an earning session is currently running.
    pub is_earning: bool,
    /// When the current earning session started.  Set iff `is_earning`.
    pub last_start_time: Option<DateTime<Utc>>,
    /// When session points were last claimed.
    pub last_claim_time: Option<DateTime<Utc>>,
    /// When the earning tier expires.  `None` means it never does.
    pub tier_expires_at: Option<DateTime<Utc>>,
    /// The account that referred this one, if any.
    pub referred_by: Option<Uuid>,
    /// Last time the user touched any endpoint that tracks activity.
    pub last_active: DateTime<Utc>,
    /// When the account was registered.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a fresh account with zero balance and the free tier.
    pub fn new(external_id: &str, display_name: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            external_id: external_id.to_string(),
            display_name: display_name.to_string(),
            wallet_address: None,
            earning_tier: EarningTier::Standard,
            classification: Classification::None,
            balance: 0,
            total_earnings: 0,
            is_earning: false,
            last_start_time: None,
            last_claim_time: None,
            tier_expires_at: None,
            referred_by: None,
            last_active: now,
            created_at: now,
        }
    }

    /// Credit points to both the spendable balance and the lifetime total.
    pub fn add_earnings(&mut self, amount: i64) {
        self.balance += amount;
        self.total_earnings += amount;
    }

    // ------------------------------------------------------------------
    // Earning sessions
    // ------------------------------------------------------------------

    /// Points accrued by the running session as of `now`.
    ///
    /// Returns 0 when no session is running.  Standard-tier sessions cap
    /// out at [`STANDARD_SESSION_CAP`]; booster tiers multiply the base
    /// rate and are uncapped.  Results are floored to whole points.
    pub fn accrued_points(&self, now: DateTime<Utc>) -> i64 {
        if !self.is_earning {
            return 0;
        }
        let Some(start) = self.last_start_time else {
            return 0;
        };

        let hours = ((now - start).num_milliseconds() as f64 / 3_600_000.0).max(0.0);
        let base = BASE_RATE_PER_HOUR * hours;

        match self.earning_tier {
            EarningTier::Standard => (base.floor() as i64).min(STANDARD_SESSION_CAP),
            EarningTier::MonthlyBooster | EarningTier::LifetimeBooster => base.floor() as i64,
            EarningTier::Monthly3xBooster => (base * 3.0).floor() as i64,
            EarningTier::Lifetime6xBooster => (base * 6.0).floor() as i64,
        }
    }

    /// A session may start whenever one is not already running.
    pub fn can_start_earning(&self) -> bool {
        !self.is_earning
    }

    /// Start an earning session.  Returns `false` if one is already
    /// running.
    pub fn start_earning(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_earning {
            return false;
        }
        self.is_earning = true;
        self.last_start_time = Some(now);
        true
    }

    /// Stop the running session without claiming.  Returns `false` if no
    /// session was running.
    pub fn stop_earning(&mut self) -> bool {
        if !self.is_earning {
            return false;
        }
        self.is_earning = false;
        true
    }

    /// Claim the running session's accrual.
    ///
    /// Credits the accrued amount, records the claim time, and ends the
    /// session.  Returns 0 when there is nothing to claim; callers must
    /// treat that as a rejected operation.
    pub fn claim_earnings(&mut self, now: DateTime<Utc>) -> i64 {
        let earnings = self.accrued_points(now);
        if earnings > 0 {
            self.add_earnings(earnings);
            self.last_claim_time = Some(now);
            self.stop_earning();
            self.last_start_time = None;
        }
        earnings
    }

    // ------------------------------------------------------------------
    // Tier management
    // ------------------------------------------------------------------

    /// Revert an expired tier to Standard.
    ///
    /// When the tier expiry has passed, the tier drops back to Standard,
    /// the expiry is cleared, and any running session is force-stopped.
    /// Returns `true` if a reversion happened.
    pub fn refresh_tier(&mut self, now: DateTime<Utc>) -> bool {
        match self.tier_expires_at {
            Some(expiry) if expiry <= now => {
                self.earning_tier = EarningTier::Standard;
                self.tier_expires_at = None;
                self.stop_earning();
                true
            }
            _ => false,
        }
    }

    /// Assign an earning tier.
    ///
    /// A duration sets the expiry `duration_days` from `now`.  Without a
    /// duration, lifetime tiers clear any previous expiry; monthly tiers
    /// keep whatever expiry was already set.
    pub fn set_tier(
        &mut self,
        tier: EarningTier,
        duration_days: Option<i64>,
        now: DateTime<Utc>,
    ) {
        self.earning_tier = tier;
        if let Some(days) = duration_days {
            self.tier_expires_at = Some(now + Duration::days(days));
        } else if tier.is_lifetime() {
            self.tier_expires_at = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn account() -> Account {
        Account::new("12345", "alice", at(0))
    }

    #[test]
    fn no_session_accrues_nothing() {
        let acct = account();
        assert_eq!(acct.accrued_points(at(3600)), 0);
    }

    #[test]
    fn standard_tier_caps_out() {
        let mut acct = account();
        assert!(acct.start_earning(at(0)));
        // 10 minutes at 10800/hr = 1800, under the cap.
        assert_eq!(acct.accrued_points(at(600)), 1800);
        // An hour would be 10800, but Standard caps at 3600.
        assert_eq!(acct.accrued_points(at(3600)), 3600);
    }

    #[test]
    fn booster_tiers_multiply() {
        let mut acct = account();
        acct.start_earning(at(0));

        acct.earning_tier = EarningTier::MonthlyBooster;
        assert_eq!(acct.accrued_points(at(3600)), 10_800);

        acct.earning_tier = EarningTier::Monthly3xBooster;
        assert_eq!(acct.accrued_points(at(3600)), 32_400);

        acct.earning_tier = EarningTier::Lifetime6xBooster;
        assert_eq!(acct.accrued_points(at(3600)), 64_800);
    }

    #[test]
    fn fractional_hours_floor() {
        let mut acct = account();
        acct.earning_tier = EarningTier::LifetimeBooster;
        acct.start_earning(at(0));
        // 90 seconds = 0.025h -> 270 points exactly.
        assert_eq!(acct.accrued_points(at(90)), 270);
        // 100 seconds -> 300.0 repeating, floored.
        assert_eq!(acct.accrued_points(at(100)), 300);
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut acct = account();
        assert!(acct.start_earning(at(0)));
        assert!(!acct.start_earning(at(10)));
    }

    #[test]
    fn claim_credits_and_ends_session() {
        let mut acct = account();
        acct.earning_tier = EarningTier::MonthlyBooster;
        acct.start_earning(at(0));

        let claimed = acct.claim_earnings(at(3600));
        assert_eq!(claimed, 10_800);
        assert_eq!(acct.balance, 10_800);
        assert_eq!(acct.total_earnings, 10_800);
        assert!(!acct.is_earning);
        assert!(acct.last_start_time.is_none());
        assert_eq!(acct.last_claim_time, Some(at(3600)));
    }

    #[test]
    fn claim_with_nothing_accrued_is_a_noop() {
        let mut acct = account();
        assert_eq!(acct.claim_earnings(at(3600)), 0);
        assert_eq!(acct.balance, 0);
        assert!(acct.last_claim_time.is_none());
    }

    #[test]
    fn expired_tier_reverts_and_stops_session() {
        let mut acct = account();
        acct.set_tier(EarningTier::Monthly3xBooster, Some(30), at(0));
        acct.start_earning(at(0));

        // Not yet expired.
        assert!(!acct.refresh_tier(at(86_400)));
        assert_eq!(acct.earning_tier, EarningTier::Monthly3xBooster);

        // 31 days later the tier is gone and the session stopped.
        assert!(acct.refresh_tier(at(31 * 86_400)));
        assert_eq!(acct.earning_tier, EarningTier::Standard);
        assert!(acct.tier_expires_at.is_none());
        assert!(!acct.is_earning);
    }

    #[test]
    fn lifetime_tier_clears_expiry() {
        let mut acct = account();
        acct.set_tier(EarningTier::MonthlyBooster, Some(30), at(0));
        acct.set_tier(EarningTier::Lifetime6xBooster, None, at(10));
        assert!(acct.tier_expires_at.is_none());
        assert!(!acct.refresh_tier(at(90 * 86_400)));
        assert_eq!(acct.earning_tier, EarningTier::Lifetime6xBooster);
    }

    #[test]
    fn tier_round_trips_through_strings() {
        for tier in [
            EarningTier::Standard,
            EarningTier::MonthlyBooster,
            EarningTier::LifetimeBooster,
            EarningTier::Monthly3xBooster,
            EarningTier::Lifetime6xBooster,
        ] {
            assert_eq!(EarningTier::parse(tier.as_str()).unwrap(), tier);
        }
        assert!(EarningTier::parse("SuperBooster").is_err());
    }

    #[test]
    fn classification_ordering() {
        assert!(Classification::Ambassador > Classification::Influencer);
        assert!(Classification::Influencer > Classification::Promoter);
        assert!(Classification::Promoter > Classification::None);
    }
}
