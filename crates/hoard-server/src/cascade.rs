//! Multi-level referral cascade application.
//!
//! Each cascade level is an independent single-row save; there is no
//! cross-row transaction.  A watermark row is written first and advanced
//! after every persisted level, so a run cut short mid-chain records
//! exactly how many levels were paid.  Failures stop the walk and are
//! logged; nothing is rolled back.

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use hoard_core::referral::cascade_steps;
use hoard_store::cascades::CascadeRecord;
use hoard_store::{Database, StoreError};

/// What a cascade run actually paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeOutcome {
    pub levels_applied: i64,
    pub total_awarded: i64,
}

/// Walk the referral chain upward from `referrer_id`, paying each level
/// its share.
///
/// The walk stops when the chain runs out, when every level is paid, or
/// on the first persistence failure (logged, not propagated).
pub fn run_referral_cascade(
    db: &Database,
    new_account_id: Uuid,
    referrer_id: Uuid,
    now: DateTime<Utc>,
) -> CascadeOutcome {
    let mut record = CascadeRecord::new(new_account_id, now);
    if let Err(e) = db.insert_cascade(&record) {
        // The cascade still runs; only the progress record is missing.
        warn!(error = %e, "failed to create cascade watermark");
    }

    let mut current = Some(referrer_id);
    for step in cascade_steps() {
        let Some(id) = current else { break };

        let mut ancestor = match db.get_account(id) {
            Ok(acct) => acct,
            Err(StoreError::NotFound) => break,
            Err(e) => {
                error!(level = step.level, error = %e, "cascade aborted: ancestor load failed");
                break;
            }
        };

        ancestor.add_earnings(step.amount);
        if let Err(e) = db.update_account(&ancestor) {
            error!(
                level = step.level,
                ancestor = %ancestor.display_name,
                error = %e,
                "cascade aborted: award save failed"
            );
            break;
        }

        record.levels_applied += 1;
        record.total_awarded += step.amount;
        if let Err(e) = db.update_cascade_progress(&record) {
            warn!(error = %e, "failed to advance cascade watermark");
        }

        current = ancestor.referred_by;
    }

    info!(
        account = %new_account_id,
        levels = record.levels_applied,
        total = record.total_awarded,
        "referral cascade applied"
    );

    CascadeOutcome {
        levels_applied: record.levels_applied,
        total_awarded: record.total_awarded,
    }
}
