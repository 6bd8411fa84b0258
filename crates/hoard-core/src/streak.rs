//! Daily claim streaks.
//!
//! One [`DailyStreak`] record exists per account, created lazily on the
//! first daily interaction.  The claim amount grows by
//! [`DAILY_CLAIM_STEP`](crate::constants::DAILY_CLAIM_STEP) per
//! consecutive day and is computed from the just-incremented streak; the
//! stored `next_claim_amount` is only a preview of tomorrow's claim and
//! is always recomputed, never trusted on read.
//!
//! A single missed day is forgiven; two or more missed days reset the
//! streak before the new claim counts as day one.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{
    DAILY_BONUS_MULTIPLIER, DAILY_BONUS_REFERRAL_THRESHOLD, DAILY_CLAIM_CAP, DAILY_CLAIM_STEP,
    MAX_STREAK_DAYS,
};
use crate::error::{LedgerError, Result};

/// Per-account daily claim state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyStreak {
    /// Owning account (1:1).
    pub account_id: Uuid,
    /// Consecutive claim days, including today's claim if made.
    pub current_streak: i64,
    /// Day of the most recent claim.
    pub last_claim_date: Option<NaiveDate>,
    /// Preview of tomorrow's claim amount.
    pub next_claim_amount: i64,
    /// Referrals landed since the last daily reset.
    pub daily_referrals: i64,
    /// Day the referral counter was last reset.
    pub last_referral_reset: NaiveDate,
}

/// Result of a successful daily claim.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DailyClaim {
    /// Amount actually credited, bonus included.
    pub amount: i64,
    /// Amount before the referral bonus.
    pub base_amount: i64,
    /// Whether the referral bonus doubled the claim.
    pub bonus_applied: bool,
    /// Streak after this claim.
    pub streak: i64,
}

/// Snapshot returned by the status query.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StreakStatus {
    pub current_streak: i64,
    pub next_claim_amount: i64,
    pub last_claim_date: Option<NaiveDate>,
    pub can_claim_today: bool,
    pub daily_referrals: i64,
    pub bonus_eligible: bool,
    pub days_until_max_streak: i64,
}

/// Claim amount for a given streak day.
fn claim_amount(streak: i64) -> i64 {
    (streak * DAILY_CLAIM_STEP).min(DAILY_CLAIM_CAP)
}

impl DailyStreak {
    /// Fresh record for an account that has never claimed.
    pub fn new(account_id: Uuid, today: NaiveDate) -> Self {
        Self {
            account_id,
            current_streak: 0,
            last_claim_date: None,
            next_claim_amount: DAILY_CLAIM_STEP,
            daily_referrals: 0,
            last_referral_reset: today,
        }
    }

    /// Attempt today's claim.
    ///
    /// Rejects a second claim on the same day.  A gap of more than one
    /// day resets the streak to zero before incrementing.  The referral
    /// bonus doubles the claim when more than
    /// [`DAILY_BONUS_REFERRAL_THRESHOLD`] referrals landed today, and the
    /// referral counter resets afterwards either way.
    pub fn claim(&mut self, today: NaiveDate) -> Result<DailyClaim> {
        if self.last_claim_date == Some(today) {
            return Err(LedgerError::AlreadyClaimedToday);
        }

        let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
        let streak_intact = matches!(self.last_claim_date, Some(d) if d >= yesterday);
        if !streak_intact {
            self.current_streak = 0;
        }

        self.current_streak += 1;
        let base_amount = claim_amount(self.current_streak);
        let bonus_applied = self.daily_referrals > DAILY_BONUS_REFERRAL_THRESHOLD;
        let amount = if bonus_applied {
            base_amount * DAILY_BONUS_MULTIPLIER
        } else {
            base_amount
        };

        self.last_claim_date = Some(today);
        self.next_claim_amount = claim_amount(self.current_streak + 1);
        self.daily_referrals = 0;
        self.last_referral_reset = today;

        Ok(DailyClaim {
            amount,
            base_amount,
            bonus_applied,
            streak: self.current_streak,
        })
    }

    /// Count a referral landed under this account today.
    pub fn record_referral(&mut self, today: NaiveDate) {
        if self.last_referral_reset < today {
            self.daily_referrals = 1;
            self.last_referral_reset = today;
        } else {
            self.daily_referrals += 1;
        }
    }

    /// Read-only view for the status endpoint.
    pub fn status(&self, today: NaiveDate) -> StreakStatus {
        StreakStatus {
            current_streak: self.current_streak,
            next_claim_amount: claim_amount(self.current_streak + 1),
            last_claim_date: self.last_claim_date,
            can_claim_today: self.last_claim_date.map_or(true, |d| d < today),
            daily_referrals: self.daily_referrals,
            bonus_eligible: self.daily_referrals > DAILY_BONUS_REFERRAL_THRESHOLD,
            days_until_max_streak: (MAX_STREAK_DAYS - self.current_streak).max(0),
        }
    }
}
