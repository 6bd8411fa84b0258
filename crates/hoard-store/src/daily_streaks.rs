//! CRUD operations for [`DailyStreak`] records.

use hoard_core::DailyStreak;
use rusqlite::params;
use uuid::Uuid;

use crate::convert::{fmt_date, parse_date, parse_opt_date, parse_uuid};
use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    /// Fetch the streak record for an account.
    pub fn get_streak(&self, account_id: Uuid) -> Result<DailyStreak> {
        self.conn()
            .query_row(
                "SELECT account_id, current_streak, last_claim_date, next_claim_amount,
                        daily_referrals, last_referral_reset
                 FROM daily_streaks
                 WHERE account_id = ?1",
                params![account_id.to_string()],
                row_to_streak,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Insert or overwrite the streak record for an account.
    ///
    /// Streak records are created lazily on the first daily interaction,
    /// so writes always go through this upsert.
    pub fn upsert_streak(&self, streak: &DailyStreak) -> Result<()> {
        self.conn().execute(
            "INSERT INTO daily_streaks (account_id, current_streak, last_claim_date,
                                        next_claim_amount, daily_referrals, last_referral_reset)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(account_id) DO UPDATE SET
                 current_streak = excluded.current_streak,
                 last_claim_date = excluded.last_claim_date,
                 next_claim_amount = excluded.next_claim_amount,
                 daily_referrals = excluded.daily_referrals,
                 last_referral_reset = excluded.last_referral_reset",
            params![
                streak.account_id.to_string(),
                streak.current_streak,
                streak.last_claim_date.map(fmt_date),
                streak.next_claim_amount,
                streak.daily_referrals,
                fmt_date(streak.last_referral_reset),
            ],
        )?;
        Ok(())
    }
}

/// Map a `rusqlite::Row` to a [`DailyStreak`].
fn row_to_streak(row: &rusqlite::Row<'_>) -> rusqlite::Result<DailyStreak> {
    let account_id: String = row.get(0)?;
    let last_claim: Option<String> = row.get(2)?;
    let last_reset: String = row.get(5)?;

    Ok(DailyStreak {
        account_id: parse_uuid(0, &account_id)?,
        current_streak: row.get(1)?,
        last_claim_date: parse_opt_date(2, last_claim)?,
        next_claim_amount: row.get(3)?,
        daily_referrals: row.get(4)?,
        last_referral_reset: parse_date(5, &last_reset)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use hoard_core::Account;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn upsert_round_trip() {
        let (_dir, db) = test_db();
        let acct = Account::new("1", "alice", Utc.timestamp_opt(1_700_000_000, 0).unwrap());
        db.insert_account(&acct).unwrap();

        let mut streak = DailyStreak::new(acct.id, day());
        db.upsert_streak(&streak).unwrap();
        assert_eq!(db.get_streak(acct.id).unwrap(), streak);

        streak.claim(day()).unwrap();
        db.upsert_streak(&streak).unwrap();

        let loaded = db.get_streak(acct.id).unwrap();
        assert_eq!(loaded.current_streak, 1);
        assert_eq!(loaded.last_claim_date, Some(day()));
    }

    #[test]
    fn missing_streak_is_not_found() {
        let (_dir, db) = test_db();
        assert!(matches!(
            db.get_streak(Uuid::new_v4()),
            Err(StoreError::NotFound)
        ));
    }
}
