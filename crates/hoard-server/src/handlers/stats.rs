//! Aggregate stats endpoint.

use axum::extract::State;
use axum::Json;
use chrono::Utc;

use hoard_store::stats::LedgerStats;

use crate::api::AppState;
use crate::error::ApiError;

/// Service-wide counters: total users, total points mined, daily and
/// hourly activity.
pub async fn ledger_stats(State(state): State<AppState>) -> Result<Json<LedgerStats>, ApiError> {
    let db = state.db.lock().await;
    let stats = db.ledger_stats(Utc::now())?;
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::handlers::accounts::{register, RegisterRequest};
    use crate::handlers::test_support::test_state;

    #[tokio::test]
    async fn totals_reflect_registrations() {
        let (_dir, state) = test_state();

        for (id, name) in [("1", "alice"), ("2", "bob")] {
            register(
                State(state.clone()),
                Json(RegisterRequest {
                    external_id: id.to_string(),
                    display_name: name.to_string(),
                    referral_code: None,
                }),
            )
            .await
            .unwrap();
        }

        let Json(stats) = ledger_stats(State(state.clone())).await.unwrap();
        assert_eq!(stats.total_users, 2);
        // Two join bonuses.
        assert_eq!(stats.total_mined, 60_000);
        // Nobody has claimed session points yet.
        assert_eq!(stats.daily_users, 0);
        // Both accounts were just active.
        assert_eq!(stats.online_users, 2);
    }
}
