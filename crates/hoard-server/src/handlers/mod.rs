//! Request handlers, grouped by domain.
//!
//! Every handler follows the same shape: validate input, load the
//! affected records, run the rules engines against the current wall
//! clock, persist, respond.  The database lock is held across the whole
//! load-compute-save cycle.

pub mod accounts;
pub mod daily;
pub mod earning;
pub mod leaderboard;
pub mod promo;
pub mod stakes;
pub mod stats;
pub mod tasks;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use tokio::sync::Mutex;

    use hoard_store::Database;

    use crate::api::AppState;
    use crate::config::ServerConfig;
    use crate::rate_limit::RateLimiter;

    /// Fresh state against a throwaway database.  Keep the TempDir alive
    /// for the duration of the test.
    pub fn test_state() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        let state = AppState {
            db: Arc::new(Mutex::new(db)),
            rate_limiter: RateLimiter::default(),
            config: Arc::new(ServerConfig::default()),
        };
        (dir, state)
    }
}
