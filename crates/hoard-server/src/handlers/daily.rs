//! Daily streak endpoints.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use hoard_core::{DailyStreak, StreakStatus};
use hoard_store::{Database, StoreError};

use crate::api::AppState;
use crate::error::ApiError;

/// Load the account's streak record, creating a fresh one lazily.
fn load_or_new_streak(
    db: &Database,
    account_id: uuid::Uuid,
    today: chrono::NaiveDate,
) -> Result<DailyStreak, StoreError> {
    match db.get_streak(account_id) {
        Ok(streak) => Ok(streak),
        Err(StoreError::NotFound) => Ok(DailyStreak::new(account_id, today)),
        Err(e) => Err(e),
    }
}

#[derive(Debug, Serialize)]
pub struct ClaimDailyResponse {
    pub message: &'static str,
    pub claimed_amount: i64,
    pub current_streak: i64,
    pub next_claim_amount: i64,
    pub new_balance: i64,
    pub bonus_applied: bool,
}

/// Claim today's daily points.
pub async fn claim_daily_points(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
) -> Result<Json<ClaimDailyResponse>, ApiError> {
    let now = Utc::now();
    let today = now.date_naive();
    let db = state.db.lock().await;

    let mut account = db
        .get_account_by_external_id(&external_id)
        .map_err(ApiError::not_found("User"))?;
    let mut streak = load_or_new_streak(&db, account.id, today)?;

    let claim = streak.claim(today)?;

    account.add_earnings(claim.amount);
    account.last_active = now;
    db.update_account(&account)?;
    db.upsert_streak(&streak)?;

    info!(
        external_id = %account.external_id,
        amount = claim.amount,
        streak = claim.streak,
        bonus = claim.bonus_applied,
        "daily points claimed"
    );

    Ok(Json(ClaimDailyResponse {
        message: "Daily points claimed successfully",
        claimed_amount: claim.amount,
        current_streak: streak.current_streak,
        next_claim_amount: streak.next_claim_amount,
        new_balance: account.balance,
        bonus_applied: claim.bonus_applied,
    }))
}

/// Streak status for the daily screen.
pub async fn daily_point_status(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
) -> Result<Json<StreakStatus>, ApiError> {
    let today = Utc::now().date_naive();
    let db = state.db.lock().await;

    let account = db
        .get_account_by_external_id(&external_id)
        .map_err(ApiError::not_found("User"))?;

    // Materialize the record on first sight so later claims and referral
    // counts have a row to work against.
    let streak = match db.get_streak(account.id) {
        Ok(streak) => streak,
        Err(StoreError::NotFound) => {
            let fresh = DailyStreak::new(account.id, today);
            db.upsert_streak(&fresh)?;
            fresh
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(streak.status(today)))
}
