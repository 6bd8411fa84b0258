use thiserror::Error;

/// Business-rule violations raised by the rules engines.
///
/// Every variant carries a human-readable message; the server layer maps
/// all of them to HTTP 400.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LedgerError {
    #[error("User is already earning points")]
    AlreadyEarning,

    #[error("No points available to claim")]
    NothingToClaim,

    #[error("Daily points already claimed today")]
    AlreadyClaimedToday,

    #[error("Insufficient balance for staking")]
    InsufficientBalance,

    #[error("Invalid staking period")]
    InvalidStakePeriod(i64),

    #[error("Stake is not active")]
    StakeNotActive,

    #[error("Staking period has not ended yet")]
    StakeNotMatured,

    #[error("Promo code is not active")]
    PromoInactive,

    #[error("Promo code has expired")]
    PromoExpired,

    #[error("You can use this promo code again in {hours_left} hours")]
    PromoCooldown { hours_left: i64 },

    #[error("You must complete all available tasks before using a promo code")]
    TasksIncomplete,

    #[error("Unknown earning tier: {0}")]
    UnknownTier(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LedgerError>;
