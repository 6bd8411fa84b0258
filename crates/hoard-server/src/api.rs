use std::sync::Arc;

use axum::{
    http::Method,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use hoard_store::Database;

use crate::config::ServerConfig;
use crate::handlers;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};

#[derive(Clone)]
pub struct AppState {
    /// Single connection guarded by an async mutex: every
    /// load-compute-save cycle holds the lock for its duration, so
    /// same-account read-modify-write races cannot lose updates.
    pub db: Arc<Mutex<Database>>,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        // Accounts
        .route("/register", post(handlers::accounts::register))
        .route("/user/:external_id", get(handlers::accounts::user_details))
        .route("/referrals/:external_id", get(handlers::accounts::user_referrals))
        .route("/play-game", post(handlers::accounts::play_game))
        .route(
            "/wallet-address",
            put(handlers::accounts::update_wallet).get(handlers::accounts::get_wallet),
        )
        // Earning sessions
        .route(
            "/users/:external_id/start-earning",
            post(handlers::earning::start_earning),
        )
        .route("/users/:external_id/claim", post(handlers::earning::claim_points))
        // Daily streaks
        .route(
            "/claim-daily-points/:external_id",
            post(handlers::daily::claim_daily_points),
        )
        .route(
            "/daily-point-status/:external_id",
            get(handlers::daily::daily_point_status),
        )
        // Leaderboard
        .route("/leaderboard", get(handlers::leaderboard::leaderboard))
        .route("/users", get(handlers::leaderboard::all_users))
        .route("/rank/:display_name", get(handlers::leaderboard::user_rank))
        // Staking
        .route("/stakes", post(handlers::stakes::create_stake))
        .route("/stakes/claim", post(handlers::stakes::claim_stake))
        .route("/stakes/unstake", post(handlers::stakes::unstake))
        .route("/stakes/active/:external_id", get(handlers::stakes::active_stakes))
        .route(
            "/stakes/claimable/:external_id",
            get(handlers::stakes::claimable_stakes),
        )
        // Promo codes
        .route("/apply-promo-code", post(handlers::promo::apply_promo_code))
        // Tasks
        .route("/tasks/complete", post(handlers::tasks::complete_task))
        .route("/tasks/for/:display_name", get(handlers::tasks::tasks_for_user))
        .route("/tasks/:id", get(handlers::tasks::get_task))
        .route(
            "/users/:external_id/completed-tasks",
            get(handlers::tasks::completed_tasks),
        )
        // Stats
        .route("/stats", get(handlers::stats::ledger_stats))
        // Admin
        .route("/admin/users/:external_id/tier", put(handlers::earning::set_tier))
        .route("/admin/promo-codes", post(handlers::promo::create_promo_code))
        .route("/admin/tasks", post(handlers::tasks::create_task))
        .route("/admin/tasks/bulk", post(handlers::tasks::create_tasks_bulk))
        .route("/admin/tasks/:id", put(handlers::tasks::update_task))
        .route("/admin/wallets", get(handlers::accounts::all_wallets))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
