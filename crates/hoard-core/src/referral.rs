//! Referral cascade math and referral-count classification.
//!
//! On each registration with a referral code, ancestors up the
//! `referred_by` chain receive a share of [`CASCADE_BASE`], the direct
//! referrer being level 1.  The cascade is expressed here as a pure step
//! list; applying the steps (and recording how far the walk got) is the
//! server's job, since each level is an independent single-row save.
//!
//! Classification is a pure function of the referral count.  The
//! promotion award is paid once per tier, on first entry.

use serde::Serialize;

use crate::account::Classification;
use crate::constants::{
    AMBASSADOR_AWARD, AMBASSADOR_THRESHOLD, CASCADE_BASE, CASCADE_SHARES, INFLUENCER_AWARD,
    INFLUENCER_THRESHOLD, PROMOTER_AWARD, PROMOTER_THRESHOLD,
};

// ---------------------------------------------------------------------------
// Cascade
// ---------------------------------------------------------------------------

/// One level of the referral cascade.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct CascadeStep {
    /// 1-based ancestor level; level 1 is the direct referrer.
    pub level: usize,
    /// Share of [`CASCADE_BASE`] paid at this level.
    pub share: f64,
    /// Points paid at this level, floored to whole points.
    pub amount: i64,
}

/// The full cascade, level 1 first.
pub fn cascade_steps() -> Vec<CascadeStep> {
    CASCADE_SHARES
        .iter()
        .enumerate()
        .map(|(i, &share)| CascadeStep {
            level: i + 1,
            share,
            amount: (CASCADE_BASE as f64 * share).floor() as i64,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classification earned by a referral count.  Highest threshold wins.
pub fn classify(referral_count: i64) -> Classification {
    if referral_count >= AMBASSADOR_THRESHOLD {
        Classification::Ambassador
    } else if referral_count >= INFLUENCER_THRESHOLD {
        Classification::Influencer
    } else if referral_count >= PROMOTER_THRESHOLD {
        Classification::Promoter
    } else {
        Classification::None
    }
}

/// One-time award for entering a tier.
pub fn tier_award(classification: Classification) -> i64 {
    match classification {
        Classification::None => 0,
        Classification::Promoter => PROMOTER_AWARD,
        Classification::Influencer => INFLUENCER_AWARD,
        Classification::Ambassador => AMBASSADOR_AWARD,
    }
}

/// A pending tier promotion.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Promotion {
    pub classification: Classification,
    pub award: i64,
}

/// Compute the promotion an account is due, if any.
///
/// Returns `Some` only when the referral count earns a strictly higher
/// tier than the one already held, so re-evaluating an unchanged account
/// awards nothing.  Persisting the new tier and the award is left to the
/// caller.
pub fn promote_if_eligible(
    current: Classification,
    referral_count: i64,
) -> Option<Promotion> {
    let earned = classify(referral_count);
    if earned > current {
        Some(Promotion {
            classification: earned,
            award: tier_award(earned),
        })
    } else {
        None
    }
}
