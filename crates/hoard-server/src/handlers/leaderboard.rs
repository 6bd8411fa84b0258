//! Leaderboard, ranking, and classification promotion.
//!
//! Classification is recomputed lazily whenever a ranking endpoint runs.
//! The pure classifier lives in `hoard_core::referral`; this module only
//! applies the promotion it reports and persists the result, so querying
//! an unchanged account twice never double-awards.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use tracing::info;

use hoard_core::referral::promote_if_eligible;
use hoard_core::{Account, Classification};
use hoard_store::Database;

use crate::api::AppState;
use crate::error::ApiError;

/// Apply and persist a pending promotion.  Returns the points awarded
/// (0 when no promotion was due).
fn apply_promotion(db: &Database, account: &mut Account, referral_count: i64) -> Result<i64, ApiError> {
    let Some(promotion) = promote_if_eligible(account.classification, referral_count) else {
        return Ok(0);
    };

    account.classification = promotion.classification;
    account.add_earnings(promotion.award);
    db.update_account(account)?;

    info!(
        display_name = %account.display_name,
        classification = promotion.classification.as_str(),
        award = promotion.award,
        "classification promotion"
    );

    Ok(promotion.award)
}

#[derive(Serialize)]
pub struct RankEntry {
    pub display_name: String,
    pub classification: &'static str,
    pub referral_count: i64,
    /// 1-based position in descending referral-count order.
    pub rank: usize,
    /// Points awarded by a promotion applied during this query.
    pub points_awarded: i64,
    pub balance: i64,
    pub total_earnings: i64,
}

#[derive(Serialize)]
pub struct LeaderboardResponse {
    pub promoters: Vec<RankEntry>,
    pub influencers: Vec<RankEntry>,
    pub ambassadors: Vec<RankEntry>,
}

/// Leaderboard grouped by classification tier.
pub async fn leaderboard(
    State(state): State<AppState>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let db = state.db.lock().await;

    let mut promoters = Vec::new();
    let mut influencers = Vec::new();
    let mut ambassadors = Vec::new();

    for (rank0, (mut account, referral_count)) in
        db.list_accounts_ranked()?.into_iter().enumerate()
    {
        let points_awarded = apply_promotion(&db, &mut account, referral_count)?;
        let entry = RankEntry {
            display_name: account.display_name.clone(),
            classification: account.classification.as_str(),
            referral_count,
            rank: rank0 + 1,
            points_awarded,
            balance: account.balance,
            total_earnings: account.total_earnings,
        };

        match account.classification {
            Classification::Promoter => promoters.push(entry),
            Classification::Influencer => influencers.push(entry),
            Classification::Ambassador => ambassadors.push(entry),
            Classification::None => {}
        }
    }

    Ok(Json(LeaderboardResponse {
        promoters,
        influencers,
        ambassadors,
    }))
}

#[derive(Serialize)]
pub struct AllUsersResponse {
    pub users: Vec<RankEntry>,
}

/// Flat ranking of every account.
pub async fn all_users(State(state): State<AppState>) -> Result<Json<AllUsersResponse>, ApiError> {
    let db = state.db.lock().await;

    let mut users = Vec::new();
    for (rank0, (mut account, referral_count)) in
        db.list_accounts_ranked()?.into_iter().enumerate()
    {
        let points_awarded = apply_promotion(&db, &mut account, referral_count)?;
        users.push(RankEntry {
            display_name: account.display_name.clone(),
            classification: account.classification.as_str(),
            referral_count,
            rank: rank0 + 1,
            points_awarded,
            balance: account.balance,
            total_earnings: account.total_earnings,
        });
    }

    Ok(Json(AllUsersResponse { users }))
}

/// A single account's rank and classification.
pub async fn user_rank(
    State(state): State<AppState>,
    Path(display_name): Path<String>,
) -> Result<Json<RankEntry>, ApiError> {
    let db = state.db.lock().await;

    let ranked = db.list_accounts_ranked()?;
    let position = ranked
        .iter()
        .position(|(a, _)| a.display_name == display_name)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let (mut account, referral_count) = ranked[position].clone();
    let points_awarded = apply_promotion(&db, &mut account, referral_count)?;

    Ok(Json(RankEntry {
        display_name: account.display_name.clone(),
        classification: account.classification.as_str(),
        referral_count,
        rank: position + 1,
        points_awarded,
        balance: account.balance,
        total_earnings: account.total_earnings,
    }))
}
