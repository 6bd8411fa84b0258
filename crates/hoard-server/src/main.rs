//! # hoard-server
//!
//! HTTP API server for the Hoard rewards ledger.
//!
//! This binary provides:
//! - **Account registration** with referral codes and multi-level
//!   referral bonuses
//! - **Earning sessions** with tier multipliers and lazy tier expiry
//! - **Daily claim streaks** with a referral bonus multiplier
//! - **Fixed-term staking** of points
//! - **Promo codes** with a per-account reuse cooldown
//! - **Leaderboard and classification** derived from referral counts
//! - **Per-IP rate limiting** to protect against abuse

mod api;
mod auth;
mod cascade;
mod config;
mod error;
mod handlers;
mod rate_limit;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hoard_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::rate_limit::RateLimiter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,hoard_server=debug")),
        )
        .init();

    info!("Starting Hoard ledger server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open the database (runs migrations)
    // -----------------------------------------------------------------------
    let db = match &config.db_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };

    // Rate limiter: 120 requests per 10 seconds per client.
    let rate_limiter = RateLimiter::default();

    let app_state = AppState {
        db: Arc::new(Mutex::new(db)),
        rate_limiter: rate_limiter.clone(),
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic rate limiter cleanup (every 5 minutes, evict windows idle >10 min)
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rate_limiter
                .purge_idle(std::time::Duration::from_secs(600))
                .await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    // tokio::select! ensures that if either the HTTP server or a shutdown
    // signal arrives, we exit cleanly.
    let http_addr = app_state.config.http_addr;
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
