//! CRUD operations for [`Account`] records.
//!
//! The referral graph is stored as `referred_by` pointers; referral
//! lists and counts are derived by querying the children of an account,
//! ordered by registration time.

use hoard_core::{Account, Classification, EarningTier};
use rusqlite::params;
use uuid::Uuid;

use crate::convert::{
    bad_value, parse_datetime, parse_opt_datetime, parse_opt_uuid, parse_uuid,
};
use crate::database::Database;
use crate::error::{Result, StoreError};

const ACCOUNT_COLUMNS: &str = "id, external_id, display_name, wallet_address, earning_tier, \
     classification, balance, total_earnings, is_earning, last_start_time, \
     last_claim_time, tier_expires_at, referred_by, last_active, created_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new account.
    pub fn insert_account(&self, account: &Account) -> Result<()> {
        self.conn().execute(
            "INSERT INTO accounts (id, external_id, display_name, wallet_address, earning_tier, \
             classification, balance, total_earnings, is_earning, last_start_time, \
             last_claim_time, tier_expires_at, referred_by, last_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                account.id.to_string(),
                account.external_id,
                account.display_name,
                account.wallet_address,
                account.earning_tier.as_str(),
                account.classification.as_str(),
                account.balance,
                account.total_earnings,
                account.is_earning,
                account.last_start_time.map(|t| t.to_rfc3339()),
                account.last_claim_time.map(|t| t.to_rfc3339()),
                account.tier_expires_at.map(|t| t.to_rfc3339()),
                account.referred_by.map(|id| id.to_string()),
                account.last_active.to_rfc3339(),
                account.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single account by UUID.
    pub fn get_account(&self, id: Uuid) -> Result<Account> {
        self.query_one_account("WHERE id = ?1", params![id.to_string()])
    }

    /// Fetch a single account by its upstream platform identity.
    pub fn get_account_by_external_id(&self, external_id: &str) -> Result<Account> {
        self.query_one_account("WHERE external_id = ?1", params![external_id])
    }

    /// Fetch a single account by display name (the referral code).
    pub fn get_account_by_display_name(&self, display_name: &str) -> Result<Account> {
        self.query_one_account("WHERE display_name = ?1", params![display_name])
    }

    /// Fetch the account holding a wallet address, if any.
    pub fn get_account_by_wallet(&self, wallet_address: &str) -> Result<Account> {
        self.query_one_account("WHERE wallet_address = ?1", params![wallet_address])
    }

    fn query_one_account(
        &self,
        filter: &str,
        params: impl rusqlite::Params,
    ) -> Result<Account> {
        self.conn()
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts {filter}"),
                params,
                row_to_account,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Number of accounts directly referred by `id`.
    pub fn referral_count(&self, id: Uuid) -> Result<i64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM accounts WHERE referred_by = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Accounts directly referred by `id`, oldest first.
    pub fn referrals_of(&self, id: Uuid) -> Result<Vec<Account>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts
             WHERE referred_by = ?1
             ORDER BY created_at ASC"
        ))?;

        let rows = stmt.query_map(params![id.to_string()], row_to_account)?;

        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(row?);
        }
        Ok(accounts)
    }

    /// All accounts with their referral counts, most-referred first.
    ///
    /// Ties keep registration order, so ranks are stable across calls.
    pub fn list_accounts_ranked(&self) -> Result<Vec<(Account, i64)>> {
        let mut stmt = self.conn().prepare(
            "SELECT a.id, a.external_id, a.display_name, a.wallet_address, a.earning_tier, \
             a.classification, a.balance, a.total_earnings, a.is_earning, a.last_start_time, \
             a.last_claim_time, a.tier_expires_at, a.referred_by, a.last_active, a.created_at, \
             COUNT(r.id) AS referral_count
             FROM accounts a
             LEFT JOIN accounts r ON r.referred_by = a.id
             GROUP BY a.id
             ORDER BY referral_count DESC, a.created_at ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            let account = row_to_account(row)?;
            let count: i64 = row.get(15)?;
            Ok((account, count))
        })?;

        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(row?);
        }
        Ok(accounts)
    }

    /// All accounts, oldest first.
    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at ASC"
        ))?;

        let rows = stmt.query_map([], row_to_account)?;

        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(row?);
        }
        Ok(accounts)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Persist every mutable field of an account.
    pub fn update_account(&self, account: &Account) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE accounts SET
                 wallet_address = ?2,
                 earning_tier = ?3,
                 classification = ?4,
                 balance = ?5,
                 total_earnings = ?6,
                 is_earning = ?7,
                 last_start_time = ?8,
                 last_claim_time = ?9,
                 tier_expires_at = ?10,
                 last_active = ?11
             WHERE id = ?1",
            params![
                account.id.to_string(),
                account.wallet_address,
                account.earning_tier.as_str(),
                account.classification.as_str(),
                account.balance,
                account.total_earnings,
                account.is_earning,
                account.last_start_time.map(|t| t.to_rfc3339()),
                account.last_claim_time.map(|t| t.to_rfc3339()),
                account.tier_expires_at.map(|t| t.to_rfc3339()),
                account.last_active.to_rfc3339(),
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to an [`Account`].
fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    let id_str: String = row.get(0)?;
    let tier_str: String = row.get(4)?;
    let class_str: String = row.get(5)?;
    let last_start: Option<String> = row.get(9)?;
    let last_claim: Option<String> = row.get(10)?;
    let tier_expiry: Option<String> = row.get(11)?;
    let referred_by: Option<String> = row.get(12)?;
    let last_active: String = row.get(13)?;
    let created_at: String = row.get(14)?;

    Ok(Account {
        id: parse_uuid(0, &id_str)?,
        external_id: row.get(1)?,
        display_name: row.get(2)?,
        wallet_address: row.get(3)?,
        earning_tier: EarningTier::parse(&tier_str).map_err(|e| bad_value(4, e.to_string()))?,
        classification: Classification::parse(&class_str)
            .ok_or_else(|| bad_value(5, format!("unknown classification: {class_str}")))?,
        balance: row.get(6)?,
        total_earnings: row.get(7)?,
        is_earning: row.get(8)?,
        last_start_time: parse_opt_datetime(9, last_start)?,
        last_claim_time: parse_opt_datetime(10, last_claim)?,
        tier_expires_at: parse_opt_datetime(11, tier_expiry)?,
        referred_by: parse_opt_uuid(12, referred_by)?,
        last_active: parse_datetime(13, &last_active)?,
        created_at: parse_datetime(14, &created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    fn now() -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn insert_and_fetch_round_trip() {
        let (_dir, db) = test_db();
        let mut acct = Account::new("12345", "alice", now());
        acct.add_earnings(30_000);
        acct.start_earning(now());

        db.insert_account(&acct).unwrap();

        let by_id = db.get_account(acct.id).unwrap();
        assert_eq!(by_id, acct);

        let by_ext = db.get_account_by_external_id("12345").unwrap();
        assert_eq!(by_ext.display_name, "alice");

        let by_name = db.get_account_by_display_name("alice").unwrap();
        assert_eq!(by_name.id, acct.id);
    }

    #[test]
    fn missing_account_is_not_found() {
        let (_dir, db) = test_db();
        assert!(matches!(
            db.get_account_by_external_id("nobody"),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn update_persists_mutable_fields() {
        let (_dir, db) = test_db();
        let mut acct = Account::new("12345", "alice", now());
        db.insert_account(&acct).unwrap();

        acct.add_earnings(5_000);
        acct.wallet_address = Some("0xabc".to_string());
        acct.earning_tier = EarningTier::Monthly3xBooster;
        db.update_account(&acct).unwrap();

        let loaded = db.get_account(acct.id).unwrap();
        assert_eq!(loaded.balance, 5_000);
        assert_eq!(loaded.wallet_address.as_deref(), Some("0xabc"));
        assert_eq!(loaded.earning_tier, EarningTier::Monthly3xBooster);
    }

    #[test]
    fn referral_counts_and_listing() {
        let (_dir, db) = test_db();
        let referrer = Account::new("1", "alice", now());
        db.insert_account(&referrer).unwrap();

        for (i, name) in ["bob", "carol"].iter().enumerate() {
            let mut child = Account::new(&format!("{}", i + 2), name, now());
            child.referred_by = Some(referrer.id);
            db.insert_account(&child).unwrap();
        }

        assert_eq!(db.referral_count(referrer.id).unwrap(), 2);
        let names: Vec<String> = db
            .referrals_of(referrer.id)
            .unwrap()
            .into_iter()
            .map(|a| a.display_name)
            .collect();
        assert_eq!(names, vec!["bob", "carol"]);
    }

    #[test]
    fn ranked_listing_orders_by_referral_count() {
        let (_dir, db) = test_db();
        let alice = Account::new("1", "alice", now());
        let bob = Account::new("2", "bob", now());
        db.insert_account(&alice).unwrap();
        db.insert_account(&bob).unwrap();

        let mut child = Account::new("3", "carol", now());
        child.referred_by = Some(bob.id);
        db.insert_account(&child).unwrap();

        let ranked = db.list_accounts_ranked().unwrap();
        assert_eq!(ranked[0].0.display_name, "bob");
        assert_eq!(ranked[0].1, 1);
        assert_eq!(ranked[1].0.display_name, "alice");
        assert_eq!(ranked[1].1, 0);
    }

    #[test]
    fn duplicate_display_name_is_rejected() {
        let (_dir, db) = test_db();
        db.insert_account(&Account::new("1", "alice", now())).unwrap();
        assert!(db.insert_account(&Account::new("2", "alice", now())).is_err());
    }

    #[test]
    fn wallet_lookup() {
        let (_dir, db) = test_db();
        let mut acct = Account::new("1", "alice", now());
        acct.wallet_address = Some("0xabc".to_string());
        db.insert_account(&acct).unwrap();

        assert_eq!(db.get_account_by_wallet("0xabc").unwrap().id, acct.id);
        assert!(matches!(
            db.get_account_by_wallet("0xdef"),
            Err(StoreError::NotFound)
        ));
    }
}
