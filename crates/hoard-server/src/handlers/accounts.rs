//! Registration, account details, wallets, and the game score credit.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use hoard_core::constants::{DIRECT_REFERRAL_BONUS, JOIN_BONUS};
use hoard_core::{Account, DailyStreak};
use hoard_store::StoreError;

use crate::api::AppState;
use crate::auth::require_admin;
use crate::cascade::run_referral_cascade;
use crate::error::ApiError;

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub external_id: String,
    pub display_name: String,
    pub referral_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub external_id: String,
    pub display_name: String,
    /// The account's own referral code (its display name).
    pub referral_code: String,
    pub balance: i64,
    pub total_earnings: i64,
    pub referred_by: Option<String>,
}

/// Register a new account.
///
/// An optional referral code (an existing display name) links the new
/// account into the referral graph, pays the referrer the direct bonus,
/// and kicks off the multi-level cascade.  The join bonus is credited
/// unconditionally.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    if req.external_id.trim().is_empty() || req.display_name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "External ID and display name are required".to_string(),
        ));
    }

    let external_id = req.external_id.trim();
    let display_name = req.display_name.trim();
    let now = Utc::now();
    let today = now.date_naive();
    let db = state.db.lock().await;

    if db.get_account_by_external_id(external_id).is_ok() {
        return Err(ApiError::BadRequest("Account already registered".to_string()));
    }
    if db.get_account_by_display_name(display_name).is_ok() {
        return Err(ApiError::BadRequest("Display name already taken".to_string()));
    }

    let referrer = match req.referral_code.as_deref().filter(|c| !c.is_empty()) {
        Some(code) => Some(db.get_account_by_display_name(code).map_err(|e| match e {
            StoreError::NotFound => ApiError::BadRequest("Invalid referral code".to_string()),
            other => other.into(),
        })?),
        None => None,
    };

    let mut account = Account::new(external_id, display_name, now);
    account.referred_by = referrer.as_ref().map(|r| r.id);
    account.add_earnings(JOIN_BONUS);
    db.insert_account(&account)?;
    db.upsert_streak(&DailyStreak::new(account.id, today))?;

    if let Some(mut referrer) = referrer {
        referrer.add_earnings(DIRECT_REFERRAL_BONUS);
        db.update_account(&referrer)?;

        // Count toward the referrer's daily claim bonus.
        match db.get_streak(referrer.id) {
            Ok(mut streak) => {
                streak.record_referral(today);
                db.upsert_streak(&streak)?;
            }
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        run_referral_cascade(&db, account.id, referrer.id, now);
    }

    info!(
        external_id = %account.external_id,
        display_name = %account.display_name,
        referred = account.referred_by.is_some(),
        "account registered"
    );

    let referred_by = req.referral_code.filter(|c| !c.is_empty());
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Account registered successfully",
            referral_code: account.display_name.clone(),
            external_id: account.external_id,
            display_name: account.display_name,
            balance: account.balance,
            total_earnings: account.total_earnings,
            referred_by,
        }),
    ))
}

// ---------------------------------------------------------------------------
// Details and referrals
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct UserDetailsResponse {
    pub external_id: String,
    pub display_name: String,
    pub earning_tier: &'static str,
    pub classification: &'static str,
    pub balance: i64,
    pub total_earnings: i64,
    /// Live accrual preview for the running session.
    pub current_earnings: i64,
    pub is_earning: bool,
    pub last_start_time: Option<DateTime<Utc>>,
    pub last_claim_time: Option<DateTime<Utc>>,
    pub tier_expires_at: Option<DateTime<Utc>>,
    pub referral_code: String,
    pub referred_by: Option<String>,
    pub referrals: Vec<String>,
}

pub async fn user_details(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
) -> Result<Json<UserDetailsResponse>, ApiError> {
    let now = Utc::now();
    let db = state.db.lock().await;

    let mut account = db
        .get_account_by_external_id(&external_id)
        .map_err(ApiError::not_found("User"))?;

    // Lazy tier expiry: persisted so later requests see the reversion.
    if account.refresh_tier(now) {
        db.update_account(&account)?;
    }

    let current_earnings = account.accrued_points(now);
    let referrals = db
        .referrals_of(account.id)?
        .into_iter()
        .map(|a| a.display_name)
        .collect();
    let referred_by = account
        .referred_by
        .and_then(|id| db.get_account(id).ok())
        .map(|a| a.display_name);

    Ok(Json(UserDetailsResponse {
        external_id: account.external_id,
        earning_tier: account.earning_tier.as_str(),
        classification: account.classification.as_str(),
        balance: account.balance,
        total_earnings: account.total_earnings,
        current_earnings,
        is_earning: account.is_earning,
        last_start_time: account.last_start_time,
        last_claim_time: account.last_claim_time,
        tier_expires_at: account.tier_expires_at,
        referral_code: account.display_name.clone(),
        display_name: account.display_name,
        referred_by,
        referrals,
    }))
}

#[derive(Serialize)]
pub struct ReferralsResponse {
    pub referrals: Vec<String>,
}

pub async fn user_referrals(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
) -> Result<Json<ReferralsResponse>, ApiError> {
    let db = state.db.lock().await;
    let account = db
        .get_account_by_external_id(&external_id)
        .map_err(ApiError::not_found("User"))?;

    let referrals = db
        .referrals_of(account.id)?
        .into_iter()
        .map(|a| a.display_name)
        .collect();

    Ok(Json(ReferralsResponse { referrals }))
}

// ---------------------------------------------------------------------------
// Game score credit
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct PlayGameRequest {
    pub display_name: String,
    pub score: i64,
}

#[derive(Serialize)]
pub struct PlayGameResponse {
    pub message: &'static str,
    pub score_added: i64,
    pub previous_balance: i64,
    pub new_balance: i64,
}

/// Credit a game score to the balance.
pub async fn play_game(
    State(state): State<AppState>,
    Json(req): Json<PlayGameRequest>,
) -> Result<Json<PlayGameResponse>, ApiError> {
    if req.display_name.trim().is_empty() || req.score < 0 {
        return Err(ApiError::BadRequest("Invalid input".to_string()));
    }

    let now = Utc::now();
    let db = state.db.lock().await;
    let mut account = db
        .get_account_by_display_name(&req.display_name)
        .map_err(ApiError::not_found("User"))?;

    let previous_balance = account.balance;
    account.add_earnings(req.score);
    account.last_active = now;
    db.update_account(&account)?;

    Ok(Json(PlayGameResponse {
        message: "Game score added to balance successfully",
        score_added: req.score,
        previous_balance,
        new_balance: account.balance,
    }))
}

// ---------------------------------------------------------------------------
// Wallet addresses
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct UpdateWalletRequest {
    pub display_name: String,
    pub wallet_address: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateWalletResponse {
    pub message: &'static str,
    pub wallet_address: String,
}

pub async fn update_wallet(
    State(state): State<AppState>,
    Json(req): Json<UpdateWalletRequest>,
) -> Result<Json<UpdateWalletResponse>, ApiError> {
    if req.display_name.trim().is_empty() || req.wallet_address.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Display name and wallet address are required".to_string(),
        ));
    }

    let db = state.db.lock().await;
    let mut account = db
        .get_account_by_display_name(&req.display_name)
        .map_err(ApiError::not_found("User"))?;

    // The address must not belong to anyone else.
    match db.get_account_by_wallet(&req.wallet_address) {
        Ok(other) if other.id != account.id => {
            return Err(ApiError::BadRequest(
                "Wallet address is already in use".to_string(),
            ));
        }
        Ok(_) | Err(StoreError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }

    account.wallet_address = Some(req.wallet_address.trim().to_string());
    db.update_account(&account)?;

    Ok(Json(UpdateWalletResponse {
        message: "Wallet address updated successfully",
        wallet_address: account.wallet_address.unwrap_or_default(),
    }))
}

#[derive(Deserialize)]
pub struct WalletQuery {
    pub display_name: Option<String>,
}

#[derive(Serialize)]
pub struct WalletResponse {
    pub wallet_address: String,
}

pub async fn get_wallet(
    State(state): State<AppState>,
    Query(query): Query<WalletQuery>,
) -> Result<Json<WalletResponse>, ApiError> {
    let Some(display_name) = query.display_name.filter(|n| !n.is_empty()) else {
        return Err(ApiError::BadRequest("Display name is required".to_string()));
    };

    let db = state.db.lock().await;
    let account = db
        .get_account_by_display_name(&display_name)
        .map_err(ApiError::not_found("User"))?;

    match account.wallet_address {
        Some(wallet_address) => Ok(Json(WalletResponse { wallet_address })),
        None => Err(ApiError::NotFound("Wallet address not set".to_string())),
    }
}

#[derive(Serialize)]
pub struct WalletListEntry {
    pub external_id: String,
    pub display_name: String,
    pub wallet_address: Option<String>,
}

#[derive(Serialize)]
pub struct WalletListResponse {
    pub users: Vec<WalletListEntry>,
}

/// Admin listing of every account with its wallet address.
pub async fn all_wallets(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<WalletListResponse>, ApiError> {
    require_admin(&headers, &state.config)?;

    let db = state.db.lock().await;
    let users = db
        .list_accounts()?
        .into_iter()
        .map(|a| WalletListEntry {
            external_id: a.external_id,
            display_name: a.display_name,
            wallet_address: a.wallet_address,
        })
        .collect();

    Ok(Json(WalletListResponse { users }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::test_state;

    fn register_req(external_id: &str, name: &str, code: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            external_id: external_id.to_string(),
            display_name: name.to_string(),
            referral_code: code.map(|c| c.to_string()),
        }
    }

    #[tokio::test]
    async fn register_without_referral_pays_join_bonus() {
        let (_dir, state) = test_state();

        let (status, Json(resp)) = register(State(state.clone()), Json(register_req("1", "alice", None)))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(resp.balance, 30_000);
        assert_eq!(resp.total_earnings, 30_000);

        // The streak record exists from day one.
        let db = state.db.lock().await;
        let account = db.get_account_by_external_id("1").unwrap();
        assert!(db.get_streak(account.id).is_ok());
    }

    #[tokio::test]
    async fn register_with_referral_pays_direct_and_cascade_bonus() {
        let (_dir, state) = test_state();

        register(State(state.clone()), Json(register_req("1", "alice", None)))
            .await
            .unwrap();
        let (_, Json(resp)) = register(
            State(state.clone()),
            Json(register_req("2", "bob", Some("alice"))),
        )
        .await
        .unwrap();

        // Bob only gets the join bonus.
        assert_eq!(resp.balance, 30_000);

        // Alice: 30000 join + 15000 direct + 6000 level-1 cascade.
        let db = state.db.lock().await;
        let alice = db.get_account_by_external_id("1").unwrap();
        assert_eq!(alice.balance, 51_000);
        assert_eq!(alice.total_earnings, 51_000);
        assert_eq!(db.referral_count(alice.id).unwrap(), 1);

        // The referral counts toward alice's daily bonus.
        assert_eq!(db.get_streak(alice.id).unwrap().daily_referrals, 1);
    }

    #[tokio::test]
    async fn register_rejects_bad_referral_code() {
        let (_dir, state) = test_state();
        let err = register(
            State(state.clone()),
            Json(register_req("1", "alice", Some("nobody"))),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(m) if m == "Invalid referral code"));
    }

    #[tokio::test]
    async fn register_rejects_duplicates() {
        let (_dir, state) = test_state();
        register(State(state.clone()), Json(register_req("1", "alice", None)))
            .await
            .unwrap();

        let err = register(State(state.clone()), Json(register_req("1", "alice2", None)))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err = register(State(state.clone()), Json(register_req("2", "alice", None)))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn wallet_uniqueness_is_enforced() {
        let (_dir, state) = test_state();
        register(State(state.clone()), Json(register_req("1", "alice", None)))
            .await
            .unwrap();
        register(State(state.clone()), Json(register_req("2", "bob", None)))
            .await
            .unwrap();

        let req = UpdateWalletRequest {
            display_name: "alice".to_string(),
            wallet_address: "0xabc".to_string(),
        };
        update_wallet(State(state.clone()), Json(req)).await.unwrap();

        // Same address again for the same account is fine.
        let req = UpdateWalletRequest {
            display_name: "alice".to_string(),
            wallet_address: "0xabc".to_string(),
        };
        update_wallet(State(state.clone()), Json(req)).await.unwrap();

        // A different account may not take it.
        let req = UpdateWalletRequest {
            display_name: "bob".to_string(),
            wallet_address: "0xabc".to_string(),
        };
        let err = update_wallet(State(state.clone()), Json(req)).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(m) if m == "Wallet address is already in use"));
    }

    #[tokio::test]
    async fn play_game_rejects_negative_scores() {
        let (_dir, state) = test_state();
        register(State(state.clone()), Json(register_req("1", "alice", None)))
            .await
            .unwrap();

        let req = PlayGameRequest {
            display_name: "alice".to_string(),
            score: -100,
        };
        assert!(play_game(State(state.clone()), Json(req)).await.is_err());

        let req = PlayGameRequest {
            display_name: "alice".to_string(),
            score: 500,
        };
        let Json(resp) = play_game(State(state.clone()), Json(req)).await.unwrap();
        assert_eq!(resp.previous_balance, 30_000);
        assert_eq!(resp.new_balance, 30_500);
    }
}
