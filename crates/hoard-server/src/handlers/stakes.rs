//! Staking endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use hoard_core::{Account, Stake, StakePayout};
use hoard_store::Database;

use crate::api::AppState;
use crate::error::ApiError;

/// Wire shape for a stake.
#[derive(Debug, Serialize)]
pub struct StakeView {
    pub id: Uuid,
    pub amount: i64,
    pub period_days: i64,
    pub interest_rate: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: &'static str,
    pub matured: bool,
}

impl StakeView {
    fn from_stake(stake: &Stake, now: DateTime<Utc>) -> Self {
        Self {
            id: stake.id,
            amount: stake.amount,
            period_days: stake.period.days(),
            interest_rate: stake.period.interest_rate(),
            start_date: stake.start_date,
            end_date: stake.end_date,
            status: stake.status.as_str(),
            matured: stake.is_matured(now),
        }
    }
}

/// Load the caller's account and one of its stakes; a stake that exists
/// but belongs to someone else is indistinguishable from a missing one.
fn load_owned_stake(
    db: &Database,
    external_id: &str,
    stake_id: Uuid,
) -> Result<(Account, Stake), ApiError> {
    let account = db
        .get_account_by_external_id(external_id)
        .map_err(ApiError::not_found("User"))?;
    let stake = db.get_stake(stake_id).map_err(ApiError::not_found("Stake"))?;
    if stake.account_id != account.id {
        return Err(ApiError::NotFound("Stake not found".to_string()));
    }
    Ok((account, stake))
}

#[derive(Deserialize)]
pub struct CreateStakeRequest {
    pub external_id: String,
    pub amount: i64,
    pub period_days: i64,
}

#[derive(Debug, Serialize)]
pub struct CreateStakeResponse {
    pub message: &'static str,
    pub stake: StakeView,
    pub new_balance: i64,
}

/// Open a stake, escrowing the amount from the balance.
pub async fn create_stake(
    State(state): State<AppState>,
    Json(req): Json<CreateStakeRequest>,
) -> Result<(StatusCode, Json<CreateStakeResponse>), ApiError> {
    if req.external_id.trim().is_empty() || req.amount <= 0 {
        return Err(ApiError::BadRequest(
            "External ID and a positive amount are required".to_string(),
        ));
    }

    let now = Utc::now();
    let db = state.db.lock().await;

    let mut account = db
        .get_account_by_external_id(&req.external_id)
        .map_err(ApiError::not_found("User"))?;

    let stake = Stake::open(&mut account, req.amount, req.period_days, now)?;
    db.insert_stake(&stake)?;
    db.update_account(&account)?;

    info!(
        external_id = %account.external_id,
        amount = stake.amount,
        period_days = stake.period.days(),
        "stake opened"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateStakeResponse {
            message: "Stake created successfully",
            stake: StakeView::from_stake(&stake, now),
            new_balance: account.balance,
        }),
    ))
}

#[derive(Deserialize)]
pub struct StakeActionRequest {
    pub external_id: String,
    pub stake_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct StakePayoutResponse {
    pub message: &'static str,
    pub principal: i64,
    pub interest: i64,
    pub total: i64,
    pub new_balance: i64,
}

fn payout_response(
    message: &'static str,
    payout: StakePayout,
    new_balance: i64,
) -> StakePayoutResponse {
    StakePayoutResponse {
        message,
        principal: payout.principal,
        interest: payout.interest,
        total: payout.total,
        new_balance,
    }
}

/// Claim a matured stake.
pub async fn claim_stake(
    State(state): State<AppState>,
    Json(req): Json<StakeActionRequest>,
) -> Result<Json<StakePayoutResponse>, ApiError> {
    let now = Utc::now();
    let db = state.db.lock().await;

    let (mut account, mut stake) = load_owned_stake(&db, &req.external_id, req.stake_id)?;

    let payout = stake.claim(&mut account, now)?;
    db.update_stake_status(&stake)?;
    db.update_account(&account)?;

    info!(
        external_id = %account.external_id,
        stake = %stake.id,
        interest = payout.interest,
        "stake claimed"
    );

    Ok(Json(payout_response(
        "Stake claimed successfully",
        payout,
        account.balance,
    )))
}

/// Withdraw a stake; early withdrawal forfeits the interest.
pub async fn unstake(
    State(state): State<AppState>,
    Json(req): Json<StakeActionRequest>,
) -> Result<Json<StakePayoutResponse>, ApiError> {
    let now = Utc::now();
    let db = state.db.lock().await;

    let (mut account, mut stake) = load_owned_stake(&db, &req.external_id, req.stake_id)?;

    let payout = stake.unstake(&mut account, now)?;
    db.update_stake_status(&stake)?;
    db.update_account(&account)?;

    info!(
        external_id = %account.external_id,
        stake = %stake.id,
        interest = payout.interest,
        "stake withdrawn"
    );

    Ok(Json(payout_response(
        "Stake withdrawn successfully",
        payout,
        account.balance,
    )))
}

#[derive(Serialize)]
pub struct StakeListResponse {
    pub stakes: Vec<StakeView>,
}

/// Active stakes for an account.
pub async fn active_stakes(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
) -> Result<Json<StakeListResponse>, ApiError> {
    let now = Utc::now();
    let db = state.db.lock().await;

    let account = db
        .get_account_by_external_id(&external_id)
        .map_err(ApiError::not_found("User"))?;

    let stakes = db
        .list_active_stakes(account.id)?
        .iter()
        .map(|s| StakeView::from_stake(s, now))
        .collect();

    Ok(Json(StakeListResponse { stakes }))
}

/// Active stakes that have matured and can be claimed.
pub async fn claimable_stakes(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
) -> Result<Json<StakeListResponse>, ApiError> {
    let now = Utc::now();
    let db = state.db.lock().await;

    let account = db
        .get_account_by_external_id(&external_id)
        .map_err(ApiError::not_found("User"))?;

    let stakes = db
        .list_claimable_stakes(account.id, now)?
        .iter()
        .map(|s| StakeView::from_stake(s, now))
        .collect();

    Ok(Json(StakeListResponse { stakes }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoard_core::LedgerError;

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

    fn stake_req(external_id: &str, amount: i64, period_days: i64) -> CreateStakeRequest {
        CreateStakeRequest {
            external_id: external_id.to_string(),
            amount,
            period_days,
        }
    }

    #[tokio::test]
    async fn create_escrows_balance() {
        let (_dir, state) = test_state();
        registered(&state, "1", "alice").await;

        let (status, Json(resp)) =
            create_stake(State(state.clone()), Json(stake_req("1", 10_000, 15)))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        // Join bonus 30000 minus the escrowed 10000.
        assert_eq!(resp.new_balance, 20_000);
        assert_eq!(resp.stake.interest_rate, 0.10);
        assert!(!resp.stake.matured);

        let Json(list) = active_stakes(State(state.clone()), Path("1".to_string()))
            .await
            .unwrap();
        assert_eq!(list.stakes.len(), 1);

        // Nothing claimable yet.
        let Json(list) = claimable_stakes(State(state.clone()), Path("1".to_string()))
            .await
            .unwrap();
        assert!(list.stakes.is_empty());
    }

    #[tokio::test]
    async fn create_rejects_bad_period_and_overdraft() {
        let (_dir, state) = test_state();
        registered(&state, "1", "alice").await;

        let err = create_stake(State(state.clone()), Json(stake_req("1", 10_000, 7)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Rule(LedgerError::InvalidStakePeriod(7))
        ));

        let err = create_stake(State(state.clone()), Json(stake_req("1", 99_000_000, 15)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Rule(LedgerError::InsufficientBalance)
        ));
    }

    #[tokio::test]
    async fn claim_before_maturity_fails_and_unstake_returns_principal() {
        let (_dir, state) = test_state();
        registered(&state, "1", "alice").await;

        let (_, Json(created)) =
            create_stake(State(state.clone()), Json(stake_req("1", 10_000, 45)))
                .await
                .unwrap();

        let action = StakeActionRequest {
            external_id: "1".to_string(),
            stake_id: created.stake.id,
        };
        let err = claim_stake(
            State(state.clone()),
            Json(StakeActionRequest { ..action }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Rule(LedgerError::StakeNotMatured)));

        let Json(payout) = unstake(
            State(state.clone()),
            Json(StakeActionRequest {
                external_id: "1".to_string(),
                stake_id: created.stake.id,
            }),
        )
        .await
        .unwrap();
        assert_eq!(payout.principal, 10_000);
        assert_eq!(payout.interest, 0);
        assert_eq!(payout.new_balance, 30_000);
    }

    #[tokio::test]
    async fn foreign_stake_is_invisible() {
        let (_dir, state) = test_state();
        registered(&state, "1", "alice").await;
        registered(&state, "2", "bob").await;

        let (_, Json(created)) =
            create_stake(State(state.clone()), Json(stake_req("1", 10_000, 15)))
                .await
                .unwrap();

        let err = unstake(
            State(state.clone()),
            Json(StakeActionRequest {
                external_id: "2".to_string(),
                stake_id: created.stake.id,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
