//! # hoard-store
//!
//! SQLite persistence for the Hoard rewards ledger.  The crate exposes a
//! synchronous [`Database`] handle that wraps a `rusqlite::Connection`
//! and provides typed CRUD helpers for every domain model in
//! `hoard-core`.  Schema migrations run on open, guarded by the SQLite
//! `user_version` pragma.

pub mod accounts;
pub mod cascades;
pub mod daily_streaks;
pub mod database;
pub mod migrations;
pub mod promo_codes;
pub mod stakes;
pub mod stats;
pub mod tasks;

mod convert;
mod error;

pub use database::Database;
pub use error::StoreError;
