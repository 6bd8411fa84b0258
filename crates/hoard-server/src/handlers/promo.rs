//! Promo code endpoints.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use hoard_core::{LedgerError, PromoCode};
use hoard_store::StoreError;

use crate::api::AppState;
use crate::auth::require_admin;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct ApplyPromoRequest {
    pub external_id: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct ApplyPromoResponse {
    pub message: &'static str,
    pub points_added: i64,
    pub new_balance: i64,
}

/// Redeem a promo code.
///
/// When `PROMO_REQUIRES_TASKS` is on, every active task must be
/// completed before any code can be redeemed.
pub async fn apply_promo_code(
    State(state): State<AppState>,
    Json(req): Json<ApplyPromoRequest>,
) -> Result<Json<ApplyPromoResponse>, ApiError> {
    if req.external_id.trim().is_empty() || req.code.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "External ID and promo code are required".to_string(),
        ));
    }

    let now = Utc::now();
    let db = state.db.lock().await;

    let mut account = db
        .get_account_by_external_id(&req.external_id)
        .map_err(ApiError::not_found("User"))?;
    let promo = db
        .get_promo_code(req.code.trim())
        .map_err(ApiError::not_found("Promo code"))?;

    if state.config.promo_requires_tasks {
        let required = db.count_active_tasks()?;
        let completed = db.count_completed_active_tasks(account.id)?;
        if completed < required {
            return Err(LedgerError::TasksIncomplete.into());
        }
    }

    let uses = db.list_promo_uses(account.id)?;
    promo.check_redeemable(&uses, now)?;

    // The boost is spendable but does not count as mined points.
    account.balance += promo.points_boost;
    db.insert_promo_use(account.id, promo.id, now)?;
    db.update_account(&account)?;

    info!(
        external_id = %account.external_id,
        code = %promo.code,
        points = promo.points_boost,
        "promo code applied"
    );

    Ok(Json(ApplyPromoResponse {
        message: "Promo code applied successfully",
        points_added: promo.points_boost,
        new_balance: account.balance,
    }))
}

#[derive(Deserialize)]
pub struct CreatePromoRequest {
    pub code: String,
    pub points_boost: i64,
    pub is_active: Option<bool>,
    pub expiration_date: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct CreatePromoResponse {
    pub message: &'static str,
    pub code: String,
    pub points_boost: i64,
    pub is_active: bool,
    pub expiration_date: Option<DateTime<Utc>>,
}

/// Admin: create a promo code.
pub async fn create_promo_code(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(req): Json<CreatePromoRequest>,
) -> Result<(StatusCode, Json<CreatePromoResponse>), ApiError> {
    require_admin(&headers, &state.config)?;

    if req.code.trim().is_empty() || req.points_boost <= 0 {
        return Err(ApiError::BadRequest(
            "Code and a positive points boost are required".to_string(),
        ));
    }

    let now = Utc::now();
    let db = state.db.lock().await;

    match db.get_promo_code(req.code.trim()) {
        Ok(_) => {
            return Err(ApiError::BadRequest("Promo code already exists".to_string()));
        }
        Err(StoreError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }

    let promo = PromoCode::new(
        req.code.trim(),
        req.points_boost,
        req.is_active.unwrap_or(true),
        req.expiration_date,
        now,
    );
    db.insert_promo_code(&promo)?;

    info!(code = %promo.code, points = promo.points_boost, "promo code created");

    Ok((
        StatusCode::CREATED,
        Json(CreatePromoResponse {
            message: "Promo code created successfully",
            code: promo.code,
            points_boost: promo.points_boost,
            is_active: promo.is_active,
            expiration_date: promo.expiration_date,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::ServerConfig;
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

    async fn seed_promo(state: &AppState, code: &str, boost: i64) {
        let db = state.db.lock().await;
        db.insert_promo_code(&PromoCode::new(code, boost, true, None, Utc::now()))
            .unwrap();
    }

    fn apply_req(external_id: &str, code: &str) -> ApplyPromoRequest {
        ApplyPromoRequest {
            external_id: external_id.to_string(),
            code: code.to_string(),
        }
    }

    #[tokio::test]
    async fn redeem_credits_balance_only() {
        let (_dir, state) = test_state();
        registered(&state, "1", "alice").await;
        seed_promo(&state, "WELCOME", 5_000).await;

        let Json(resp) = apply_promo_code(State(state.clone()), Json(apply_req("1", "WELCOME")))
            .await
            .unwrap();
        assert_eq!(resp.points_added, 5_000);
        assert_eq!(resp.new_balance, 35_000);

        let db = state.db.lock().await;
        let account = db.get_account_by_external_id("1").unwrap();
        // Lifetime earnings are untouched by promo boosts.
        assert_eq!(account.total_earnings, 30_000);
    }

    #[tokio::test]
    async fn immediate_reuse_hits_the_cooldown() {
        let (_dir, state) = test_state();
        registered(&state, "1", "alice").await;
        seed_promo(&state, "WELCOME", 5_000).await;

        apply_promo_code(State(state.clone()), Json(apply_req("1", "WELCOME")))
            .await
            .unwrap();
        let err = apply_promo_code(State(state.clone()), Json(apply_req("1", "WELCOME")))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Rule(LedgerError::PromoCooldown { hours_left: 24 })
        ));
    }

    #[tokio::test]
    async fn unknown_code_is_404() {
        let (_dir, state) = test_state();
        registered(&state, "1", "alice").await;

        let err = apply_promo_code(State(state.clone()), Json(apply_req("1", "NOPE")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(m) if m == "Promo code not found"));
    }

    #[tokio::test]
    async fn task_policy_gates_redemption() {
        let (_dir, mut state) = test_state();
        state.config = Arc::new(ServerConfig {
            promo_requires_tasks: true,
            ..ServerConfig::default()
        });

        registered(&state, "1", "alice").await;
        seed_promo(&state, "WELCOME", 5_000).await;

        let task = {
            let db = state.db.lock().await;
            let task = hoard_core::Task::new("Follow the channel", 2_500, Utc::now());
            db.insert_task(&task).unwrap();
            task
        };

        let err = apply_promo_code(State(state.clone()), Json(apply_req("1", "WELCOME")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Rule(LedgerError::TasksIncomplete)));

        {
            let db = state.db.lock().await;
            let account = db.get_account_by_external_id("1").unwrap();
            db.insert_task_completion(account.id, task.id, Utc::now())
                .unwrap();
        }

        assert!(
            apply_promo_code(State(state.clone()), Json(apply_req("1", "WELCOME")))
                .await
                .is_ok()
        );
    }
}
