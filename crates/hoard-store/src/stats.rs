//! Aggregate statistics queries.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::database::Database;
use crate::error::Result;

/// Service-wide counters for the stats endpoint.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LedgerStats {
    /// Total registered accounts.
    pub total_users: i64,
    /// Sum of lifetime earnings across all accounts.
    pub total_mined: i64,
    /// Accounts that claimed session points in the last 24 hours.
    pub daily_users: i64,
    /// Accounts active in the last hour.
    pub online_users: i64,
}

impl Database {
    /// Compute the aggregate stats as of `now`.
    pub fn ledger_stats(&self, now: DateTime<Utc>) -> Result<LedgerStats> {
        let (total_users, total_mined): (i64, i64) = self.conn().query_row(
            "SELECT COUNT(*), COALESCE(SUM(total_earnings), 0) FROM accounts",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let one_day_ago = (now - Duration::hours(24)).to_rfc3339();
        let daily_users: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM accounts WHERE last_claim_time >= ?1",
            [&one_day_ago],
            |row| row.get(0),
        )?;

        let one_hour_ago = (now - Duration::hours(1)).to_rfc3339();
        let online_users: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM accounts WHERE last_active >= ?1",
            [&one_hour_ago],
            |row| row.get(0),
        )?;

        Ok(LedgerStats {
            total_users,
            total_mined,
            daily_users,
            online_users,
        })
    }
}
