//! v001 -- Initial schema creation.
//!
//! Creates the ledger tables: `accounts`, `daily_streaks`, `stakes`,
//! `promo_codes`, `promo_uses`, `tasks`, `task_completions`, and
//! `referral_cascades`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Accounts
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS accounts (
    id             TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    external_id    TEXT NOT NULL UNIQUE,        -- upstream platform identity
    display_name   TEXT NOT NULL UNIQUE,        -- doubles as referral code
    wallet_address TEXT UNIQUE,                 -- nullable, unique when set
    earning_tier   TEXT NOT NULL DEFAULT 'Standard',
    classification TEXT NOT NULL DEFAULT 'None',
    balance        INTEGER NOT NULL DEFAULT 0,
    total_earnings INTEGER NOT NULL DEFAULT 0,
    is_earning     INTEGER NOT NULL DEFAULT 0,  -- boolean 0/1
    last_start_time TEXT,                       -- ISO-8601 / RFC-3339
    last_claim_time TEXT,
    tier_expires_at TEXT,
    referred_by    TEXT,                        -- nullable FK -> accounts(id)
    last_active    TEXT NOT NULL,
    created_at     TEXT NOT NULL,

    FOREIGN KEY (referred_by) REFERENCES accounts(id)
);

CREATE INDEX IF NOT EXISTS idx_accounts_referred_by ON accounts(referred_by);
CREATE INDEX IF NOT EXISTS idx_accounts_last_claim_time ON accounts(last_claim_time);
CREATE INDEX IF NOT EXISTS idx_accounts_last_active ON accounts(last_active);

-- ----------------------------------------------------------------
-- Daily streaks (1:1 with accounts, created lazily)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS daily_streaks (
    account_id          TEXT PRIMARY KEY NOT NULL,
    current_streak      INTEGER NOT NULL DEFAULT 0,
    last_claim_date     TEXT,                   -- YYYY-MM-DD
    next_claim_amount   INTEGER NOT NULL DEFAULT 1000,
    daily_referrals     INTEGER NOT NULL DEFAULT 0,
    last_referral_reset TEXT NOT NULL,          -- YYYY-MM-DD

    FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Stakes
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS stakes (
    id          TEXT PRIMARY KEY NOT NULL,      -- UUID v4
    account_id  TEXT NOT NULL,                  -- FK -> accounts(id)
    amount      INTEGER NOT NULL,
    period_days INTEGER NOT NULL,               -- 3, 15 or 45
    start_date  TEXT NOT NULL,
    end_date    TEXT NOT NULL,
    status      TEXT NOT NULL DEFAULT 'active', -- active | claimed | unstaked

    FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_stakes_account_status ON stakes(account_id, status);

-- ----------------------------------------------------------------
-- Promo codes and per-account usage history
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS promo_codes (
    id              TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    code            TEXT NOT NULL UNIQUE,
    points_boost    INTEGER NOT NULL,
    is_active       INTEGER NOT NULL DEFAULT 1, -- boolean 0/1
    expiration_date TEXT,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS promo_uses (
    account_id    TEXT NOT NULL,                -- FK -> accounts(id)
    promo_code_id TEXT NOT NULL,                -- FK -> promo_codes(id)
    used_at       TEXT NOT NULL,

    FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE,
    FOREIGN KEY (promo_code_id) REFERENCES promo_codes(id)
);

CREATE INDEX IF NOT EXISTS idx_promo_uses_account ON promo_uses(account_id, promo_code_id);

-- ----------------------------------------------------------------
-- Tasks and completions
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS tasks (
    id         TEXT PRIMARY KEY NOT NULL,       -- UUID v4
    title      TEXT NOT NULL,
    points     INTEGER NOT NULL,
    is_active  INTEGER NOT NULL DEFAULT 1,      -- boolean 0/1
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS task_completions (
    account_id   TEXT NOT NULL,                 -- FK -> accounts(id)
    task_id      TEXT NOT NULL,                 -- FK -> tasks(id)
    completed_at TEXT NOT NULL,

    PRIMARY KEY (account_id, task_id),
    FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE,
    FOREIGN KEY (task_id) REFERENCES tasks(id)
);

-- ----------------------------------------------------------------
-- Referral cascade watermarks
--
-- One row per registration that triggered a cascade.  levels_applied
-- records how far up the chain awards were persisted, so a run cut
-- short mid-chain is visible and recoverable.
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS referral_cascades (
    id             TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    account_id     TEXT NOT NULL,               -- the newly registered account
    levels_applied INTEGER NOT NULL DEFAULT 0,
    total_awarded  INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL,

    FOREIGN KEY (account_id) REFERENCES accounts(id)
);

CREATE INDEX IF NOT EXISTS idx_cascades_account ON referral_cascades(account_id);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
