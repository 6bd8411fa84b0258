//! Referral cascade watermarks.
//!
//! Each registration that triggers a multi-level referral cascade gets
//! one row here.  The row is written before any level is paid and its
//! `levels_applied` counter is bumped after each ancestor's save, so a
//! cascade cut short mid-chain leaves an exact record of how far the
//! awards got.

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::Serialize;
use uuid::Uuid;

use crate::convert::{parse_datetime, parse_uuid};
use crate::database::Database;
use crate::error::{Result, StoreError};

/// Progress record for one registration's cascade.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CascadeRecord {
    pub id: Uuid,
    /// The newly registered account that triggered the cascade.
    pub account_id: Uuid,
    /// Ancestor levels whose award has been persisted.
    pub levels_applied: i64,
    /// Points paid out across the applied levels.
    pub total_awarded: i64,
    pub created_at: DateTime<Utc>,
}

impl CascadeRecord {
    pub fn new(account_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            levels_applied: 0,
            total_awarded: 0,
            created_at: now,
        }
    }
}

impl Database {
    /// Insert a fresh watermark row before paying any level.
    pub fn insert_cascade(&self, record: &CascadeRecord) -> Result<()> {
        self.conn().execute(
            "INSERT INTO referral_cascades (id, account_id, levels_applied, total_awarded, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id.to_string(),
                record.account_id.to_string(),
                record.levels_applied,
                record.total_awarded,
                record.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Advance the watermark after one level's award is persisted.
    pub fn update_cascade_progress(&self, record: &CascadeRecord) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE referral_cascades SET levels_applied = ?2, total_awarded = ?3 WHERE id = ?1",
            params![
                record.id.to_string(),
                record.levels_applied,
                record.total_awarded,
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// The cascade record for a registration, if one was created.
    pub fn get_cascade_for_account(&self, account_id: Uuid) -> Result<CascadeRecord> {
        self.conn()
            .query_row(
                "SELECT id, account_id, levels_applied, total_awarded, created_at
                 FROM referral_cascades
                 WHERE account_id = ?1",
                params![account_id.to_string()],
                |row| {
                    let id: String = row.get(0)?;
                    let account_id: String = row.get(1)?;
                    let created_at: String = row.get(4)?;
                    Ok(CascadeRecord {
                        id: parse_uuid(0, &id)?,
                        account_id: parse_uuid(1, &account_id)?,
                        levels_applied: row.get(2)?,
                        total_awarded: row.get(3)?,
                        created_at: parse_datetime(4, &created_at)?,
                    })
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }
}
