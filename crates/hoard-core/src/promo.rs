//! Promo codes.
//!
//! A promo code carries a flat point boost and immutable reward
//! parameters.  Per-account usage history lives with the account; the
//! engine here only decides whether a redemption is allowed right now.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::PROMO_COOLDOWN_HOURS;
use crate::error::{LedgerError, Result};

/// A redeemable promo code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromoCode {
    pub id: Uuid,
    /// Unique, user-facing code string.
    pub code: String,
    /// Flat points credited on redemption.
    pub points_boost: i64,
    pub is_active: bool,
    /// Optional hard expiry; `None` never expires.
    pub expiration_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// One past redemption by an account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromoUse {
    pub promo_code_id: Uuid,
    pub used_at: DateTime<Utc>,
}

impl PromoCode {
    pub fn new(
        code: &str,
        points_boost: i64,
        is_active: bool,
        expiration_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.to_string(),
            points_boost,
            is_active,
            expiration_date,
            created_at: now,
        }
    }

    /// Check whether an account with the given usage history may redeem
    /// this code at `now`.
    ///
    /// Rejections, in order: inactive code, expired code, and a prior use
    /// of this exact code within the last [`PROMO_COOLDOWN_HOURS`] hours.
    /// The cooldown error reports the whole hours left (rounded up) until
    /// the code becomes usable again.
    pub fn check_redeemable(&self, uses: &[PromoUse], now: DateTime<Utc>) -> Result<()> {
        if !self.is_active {
            return Err(LedgerError::PromoInactive);
        }

        if let Some(expiry) = self.expiration_date {
            if expiry < now {
                return Err(LedgerError::PromoExpired);
            }
        }

        let window_start = now - Duration::hours(PROMO_COOLDOWN_HOURS);
        let recent = uses
            .iter()
            .filter(|u| u.promo_code_id == self.id && u.used_at > window_start)
            .max_by_key(|u| u.used_at);

        if let Some(recent) = recent {
            let eligible_at = recent.used_at + Duration::hours(PROMO_COOLDOWN_HOURS);
            let secs_left = (eligible_at - now).num_seconds().max(0);
            let hours_left = (secs_left + 3599) / 3600;
            return Err(LedgerError::PromoCooldown { hours_left });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hours: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + hours * 3600, 0).unwrap()
    }

    fn code() -> PromoCode {
        PromoCode::new("WELCOME", 5_000, true, None, at(0))
    }

    #[test]
    fn fresh_code_is_redeemable() {
        assert!(code().check_redeemable(&[], at(1)).is_ok());
    }

    #[test]
    fn inactive_code_is_rejected() {
        let mut c = code();
        c.is_active = false;
        assert_eq!(
            c.check_redeemable(&[], at(1)),
            Err(LedgerError::PromoInactive)
        );
    }

    #[test]
    fn expired_code_is_rejected() {
        let mut c = code();
        c.expiration_date = Some(at(10));
        assert!(c.check_redeemable(&[], at(10)).is_ok());
        assert_eq!(
            c.check_redeemable(&[], at(11)),
            Err(LedgerError::PromoExpired)
        );
    }

    #[test]
    fn cooldown_counts_down_and_releases() {
        let c = code();
        let uses = vec![PromoUse {
            promo_code_id: c.id,
            used_at: at(0),
        }];

        assert_eq!(
            c.check_redeemable(&uses, at(1)),
            Err(LedgerError::PromoCooldown { hours_left: 23 })
        );
        assert_eq!(
            c.check_redeemable(&uses, at(12)),
            Err(LedgerError::PromoCooldown { hours_left: 12 })
        );
        assert_eq!(
            c.check_redeemable(&uses, at(23)),
            Err(LedgerError::PromoCooldown { hours_left: 1 })
        );
        // Exactly at the 24h boundary the code is usable again.
        assert!(c.check_redeemable(&uses, at(24)).is_ok());
        assert!(c.check_redeemable(&uses, at(25)).is_ok());
    }

    #[test]
    fn cooldown_only_applies_to_the_same_code() {
        let c = code();
        let uses = vec![PromoUse {
            promo_code_id: Uuid::new_v4(),
            used_at: at(0),
        }];
        assert!(c.check_redeemable(&uses, at(1)).is_ok());
    }

    #[test]
    fn most_recent_use_wins() {
        let c = code();
        let uses = vec![
            PromoUse {
                promo_code_id: c.id,
                used_at: at(-30),
            },
            PromoUse {
                promo_code_id: c.id,
                used_at: at(-2),
            },
        ];
        assert_eq!(
            c.check_redeemable(&uses, at(0)),
            Err(LedgerError::PromoCooldown { hours_left: 22 })
        );
    }
}
