//! CRUD operations for [`PromoCode`] records and per-account usage
//! history.

use chrono::{DateTime, Utc};
use hoard_core::{PromoCode, PromoUse};
use rusqlite::params;
use uuid::Uuid;

use crate::convert::{parse_datetime, parse_opt_datetime, parse_uuid};
use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    /// Insert a new promo code.
    pub fn insert_promo_code(&self, promo: &PromoCode) -> Result<()> {
        self.conn().execute(
            "INSERT INTO promo_codes (id, code, points_boost, is_active, expiration_date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                promo.id.to_string(),
                promo.code,
                promo.points_boost,
                promo.is_active,
                promo.expiration_date.map(|t| t.to_rfc3339()),
                promo.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch a promo code by its user-facing code string.
    pub fn get_promo_code(&self, code: &str) -> Result<PromoCode> {
        self.conn()
            .query_row(
                "SELECT id, code, points_boost, is_active, expiration_date, created_at
                 FROM promo_codes
                 WHERE code = ?1",
                params![code],
                row_to_promo_code,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// An account's full redemption history.
    pub fn list_promo_uses(&self, account_id: Uuid) -> Result<Vec<PromoUse>> {
        let mut stmt = self.conn().prepare(
            "SELECT promo_code_id, used_at
             FROM promo_uses
             WHERE account_id = ?1
             ORDER BY used_at ASC",
        )?;

        let rows = stmt.query_map(params![account_id.to_string()], |row| {
            let code_id: String = row.get(0)?;
            let used_at: String = row.get(1)?;
            Ok(PromoUse {
                promo_code_id: parse_uuid(0, &code_id)?,
                used_at: parse_datetime(1, &used_at)?,
            })
        })?;

        let mut uses = Vec::new();
        for row in rows {
            uses.push(row?);
        }
        Ok(uses)
    }

    /// Record a redemption.
    pub fn insert_promo_use(
        &self,
        account_id: Uuid,
        promo_code_id: Uuid,
        used_at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn().execute(
            "INSERT INTO promo_uses (account_id, promo_code_id, used_at)
             VALUES (?1, ?2, ?3)",
            params![
                account_id.to_string(),
                promo_code_id.to_string(),
                used_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

/// Map a `rusqlite::Row` to a [`PromoCode`].
fn row_to_promo_code(row: &rusqlite::Row<'_>) -> rusqlite::Result<PromoCode> {
    let id: String = row.get(0)?;
    let expiry: Option<String> = row.get(4)?;
    let created_at: String = row.get(5)?;

    Ok(PromoCode {
        id: parse_uuid(0, &id)?,
        code: row.get(1)?,
        points_boost: row.get(2)?,
        is_active: row.get(3)?,
        expiration_date: parse_opt_datetime(4, expiry)?,
        created_at: parse_datetime(5, &created_at)?,
    })
}
