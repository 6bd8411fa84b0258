//! Earning session endpoints: start, claim, and tier assignment.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use hoard_core::{EarningTier, LedgerError};

use crate::api::AppState;
use crate::auth::require_admin;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct StartEarningResponse {
    pub message: &'static str,
    pub is_earning: bool,
    pub last_start_time: Option<DateTime<Utc>>,
}

/// Start an earning session.
pub async fn start_earning(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
) -> Result<Json<StartEarningResponse>, ApiError> {
    let now = Utc::now();
    let db = state.db.lock().await;

    let mut account = db
        .get_account_by_external_id(&external_id)
        .map_err(ApiError::not_found("User"))?;

    account.refresh_tier(now);
    if !account.start_earning(now) {
        return Err(LedgerError::AlreadyEarning.into());
    }
    account.last_active = now;
    db.update_account(&account)?;

    Ok(Json(StartEarningResponse {
        message: "Started earning points",
        is_earning: account.is_earning,
        last_start_time: account.last_start_time,
    }))
}

#[derive(Debug, Serialize)]
pub struct ClaimPointsResponse {
    pub message: &'static str,
    pub claimed_amount: i64,
    pub new_balance: i64,
    pub is_earning: bool,
}

/// Claim the running session's accrual.
pub async fn claim_points(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
) -> Result<Json<ClaimPointsResponse>, ApiError> {
    let now = Utc::now();
    let db = state.db.lock().await;

    let mut account = db
        .get_account_by_external_id(&external_id)
        .map_err(ApiError::not_found("User"))?;

    account.refresh_tier(now);
    let claimed_amount = account.claim_earnings(now);
    if claimed_amount == 0 {
        // Persist a tier reversion even when the claim is rejected.
        db.update_account(&account)?;
        return Err(LedgerError::NothingToClaim.into());
    }
    account.last_active = now;
    db.update_account(&account)?;

    info!(
        external_id = %account.external_id,
        claimed_amount,
        "session points claimed"
    );

    Ok(Json(ClaimPointsResponse {
        message: "Points claimed successfully",
        claimed_amount,
        new_balance: account.balance,
        is_earning: account.is_earning,
    }))
}

#[derive(Deserialize)]
pub struct SetTierRequest {
    pub tier: String,
    pub duration_days: Option<i64>,
}

#[derive(Serialize)]
pub struct SetTierResponse {
    pub message: &'static str,
    pub external_id: String,
    pub earning_tier: &'static str,
    pub tier_expires_at: Option<DateTime<Utc>>,
}

/// Admin: assign an earning tier, optionally time-limited.
pub async fn set_tier(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(external_id): Path<String>,
    Json(req): Json<SetTierRequest>,
) -> Result<Json<SetTierResponse>, ApiError> {
    require_admin(&headers, &state.config)?;

    let tier = EarningTier::parse(&req.tier).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if let Some(days) = req.duration_days {
        if days <= 0 {
            return Err(ApiError::BadRequest(
                "Duration must be a positive number of days".to_string(),
            ));
        }
    }

    let now = Utc::now();
    let db = state.db.lock().await;

    let mut account = db
        .get_account_by_external_id(&external_id)
        .map_err(ApiError::not_found("User"))?;

    account.set_tier(tier, req.duration_days, now);
    db.update_account(&account)?;

    info!(
        external_id = %account.external_id,
        tier = account.earning_tier.as_str(),
        "earning tier assigned"
    );

    Ok(Json(SetTierResponse {
        message: "User tier updated successfully",
        external_id: account.external_id,
        earning_tier: account.earning_tier.as_str(),
        tier_expires_at: account.tier_expires_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::accounts::{register, RegisterRequest};
    use crate::handlers::test_support::test_state;

    async fn registered(state: &AppState, external_id: &str, name: &str) {
        register(
            State(state.clone()),
            Json(RegisterRequest {
                external_id: external_id.to_string(),
                display_name: name.to_string(),
                referral_code: None,
            }),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn start_then_start_again_is_rejected() {
        let (_dir, state) = test_state();
        registered(&state, "1", "alice").await;

        let Json(resp) = start_earning(State(state.clone()), Path("1".to_string()))
            .await
            .unwrap();
        assert!(resp.is_earning);
        assert!(resp.last_start_time.is_some());

        let err = start_earning(State(state.clone()), Path("1".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Rule(LedgerError::AlreadyEarning)));
    }

    #[tokio::test]
    async fn claim_without_session_is_rejected() {
        let (_dir, state) = test_state();
        registered(&state, "1", "alice").await;

        let err = claim_points(State(state.clone()), Path("1".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Rule(LedgerError::NothingToClaim)));
    }

    #[tokio::test]
    async fn unknown_user_is_404() {
        let (_dir, state) = test_state();
        let err = start_earning(State(state.clone()), Path("missing".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
