//! CRUD operations for [`Stake`] records.

use chrono::{DateTime, Utc};
use hoard_core::{Stake, StakePeriod, StakeStatus};
use rusqlite::params;
use uuid::Uuid;

use crate::convert::{bad_value, parse_datetime, parse_uuid};
use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    /// Insert a new stake.
    pub fn insert_stake(&self, stake: &Stake) -> Result<()> {
        self.conn().execute(
            "INSERT INTO stakes (id, account_id, amount, period_days, start_date, end_date, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                stake.id.to_string(),
                stake.account_id.to_string(),
                stake.amount,
                stake.period.days(),
                stake.start_date.to_rfc3339(),
                stake.end_date.to_rfc3339(),
                stake.status.as_str(),
            ],
        )?;
        Ok(())
    }

    /// Fetch a single stake by UUID.
    pub fn get_stake(&self, id: Uuid) -> Result<Stake> {
        self.conn()
            .query_row(
                "SELECT id, account_id, amount, period_days, start_date, end_date, status
                 FROM stakes
                 WHERE id = ?1",
                params![id.to_string()],
                row_to_stake,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Persist a stake's status.  Everything else is immutable.
    pub fn update_stake_status(&self, stake: &Stake) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE stakes SET status = ?2 WHERE id = ?1",
            params![stake.id.to_string(), stake.status.as_str()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// An account's active stakes, oldest first.
    pub fn list_active_stakes(&self, account_id: Uuid) -> Result<Vec<Stake>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, account_id, amount, period_days, start_date, end_date, status
             FROM stakes
             WHERE account_id = ?1 AND status = 'active'
             ORDER BY start_date ASC",
        )?;

        let rows = stmt.query_map(params![account_id.to_string()], row_to_stake)?;

        let mut stakes = Vec::new();
        for row in rows {
            stakes.push(row?);
        }
        Ok(stakes)
    }

    /// An account's active stakes that have matured by `now`.
    pub fn list_claimable_stakes(
        &self,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<Stake>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, account_id, amount, period_days, start_date, end_date, status
             FROM stakes
             WHERE account_id = ?1 AND status = 'active' AND end_date <= ?2
             ORDER BY start_date ASC",
        )?;

        let rows = stmt.query_map(
            params![account_id.to_string(), now.to_rfc3339()],
            row_to_stake,
        )?;

        let mut stakes = Vec::new();
        for row in rows {
            stakes.push(row?);
        }
        Ok(stakes)
    }
}

/// Map a `rusqlite::Row` to a [`Stake`].
fn row_to_stake(row: &rusqlite::Row<'_>) -> rusqlite::Result<Stake> {
    let id: String = row.get(0)?;
    let account_id: String = row.get(1)?;
    let period_days: i64 = row.get(3)?;
    let start: String = row.get(4)?;
    let end: String = row.get(5)?;
    let status: String = row.get(6)?;

    Ok(Stake {
        id: parse_uuid(0, &id)?,
        account_id: parse_uuid(1, &account_id)?,
        amount: row.get(2)?,
        period: StakePeriod::from_days(period_days)
            .map_err(|e| bad_value(3, e.to_string()))?,
        start_date: parse_datetime(4, &start)?,
        end_date: parse_datetime(5, &end)?,
        status: StakeStatus::parse(&status)
            .ok_or_else(|| bad_value(6, format!("unknown stake status: {status}")))?,
    })
}
