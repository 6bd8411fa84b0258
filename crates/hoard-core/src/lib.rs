//! # hoard-core
//!
//! Domain models and the points rules engines for the Hoard rewards
//! ledger: earning sessions, daily claim streaks, referral cascades and
//! classification, fixed-term staking, and promo codes.
//!
//! Everything in this crate is pure: no I/O and no wall clock.  Every
//! time-dependent operation takes the current instant (or calendar day)
//! as a parameter, so the engines can be exercised deterministically in
//! tests and the server layer decides what "now" means.

pub mod account;
pub mod constants;
pub mod promo;
pub mod referral;
pub mod staking;
pub mod streak;
pub mod task;

mod error;

pub use account::{Account, Classification, EarningTier};
pub use error::LedgerError;
pub use promo::{PromoCode, PromoUse};
pub use staking::{Stake, StakePayout, StakePeriod, StakeStatus};
pub use streak::{DailyClaim, DailyStreak, StreakStatus};
pub use task::Task;
