//! Fixed-term staking.
//!
//! A stake escrows points out of the spendable balance for one of three
//! fixed periods, each with its own interest rate.  Claiming requires
//! maturity and pays principal plus interest; unstaking is allowed at
//! any time but pays interest only once the stake has matured.  A stake
//! is immutable after creation except for its status, which moves from
//! `Active` to exactly one of the terminal states.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::Account;
use crate::error::{LedgerError, Result};

// ---------------------------------------------------------------------------
// Period and status
// ---------------------------------------------------------------------------

/// Allowed staking periods.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StakePeriod {
    Days3,
    Days15,
    Days45,
}

impl StakePeriod {
    pub fn from_days(days: i64) -> Result<Self> {
        match days {
            3 => Ok(StakePeriod::Days3),
            15 => Ok(StakePeriod::Days15),
            45 => Ok(StakePeriod::Days45),
            other => Err(LedgerError::InvalidStakePeriod(other)),
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            StakePeriod::Days3 => 3,
            StakePeriod::Days15 => 15,
            StakePeriod::Days45 => 45,
        }
    }

    pub fn interest_rate(&self) -> f64 {
        match self {
            StakePeriod::Days3 => 0.03,
            StakePeriod::Days15 => 0.10,
            StakePeriod::Days45 => 0.35,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StakeStatus {
    Active,
    Claimed,
    Unstaked,
}

impl StakeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StakeStatus::Active => "active",
            StakeStatus::Claimed => "claimed",
            StakeStatus::Unstaked => "unstaked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(StakeStatus::Active),
            "claimed" => Some(StakeStatus::Claimed),
            "unstaked" => Some(StakeStatus::Unstaked),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Stake
// ---------------------------------------------------------------------------

/// A fixed-term escrow of points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stake {
    pub id: Uuid,
    pub account_id: Uuid,
    /// Escrowed principal, deducted from the balance at creation.
    pub amount: i64,
    pub period: StakePeriod,
    pub start_date: DateTime<Utc>,
    /// `start_date` plus the period.
    pub end_date: DateTime<Utc>,
    pub status: StakeStatus,
}

/// What a claim or unstake paid out.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StakePayout {
    pub principal: i64,
    pub interest: i64,
    pub total: i64,
}

impl Stake {
    /// Open a stake, escrowing `amount` from the account's balance.
    pub fn open(
        account: &mut Account,
        amount: i64,
        period_days: i64,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if account.balance < amount {
            return Err(LedgerError::InsufficientBalance);
        }
        let period = StakePeriod::from_days(period_days)?;

        account.balance -= amount;

        Ok(Self {
            id: Uuid::new_v4(),
            account_id: account.id,
            amount,
            period,
            start_date: now,
            end_date: now + Duration::days(period.days()),
            status: StakeStatus::Active,
        })
    }

    pub fn is_matured(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_date
    }

    /// Interest earned at maturity, floored to whole points.
    pub fn interest(&self) -> i64 {
        (self.amount as f64 * self.period.interest_rate()).floor() as i64
    }

    /// Claim a matured stake, paying principal plus interest back to the
    /// balance.
    pub fn claim(&mut self, account: &mut Account, now: DateTime<Utc>) -> Result<StakePayout> {
        if self.status != StakeStatus::Active {
            return Err(LedgerError::StakeNotActive);
        }
        if !self.is_matured(now) {
            return Err(LedgerError::StakeNotMatured);
        }

        let interest = self.interest();
        let total = self.amount + interest;
        account.balance += total;
        self.status = StakeStatus::Claimed;

        Ok(StakePayout {
            principal: self.amount,
            interest,
            total,
        })
    }

    /// Withdraw a stake at any time.
    ///
    /// Before maturity only the principal comes back; at or after
    /// maturity the full interest is paid, same as a claim.
    pub fn unstake(&mut self, account: &mut Account, now: DateTime<Utc>) -> Result<StakePayout> {
        if self.status != StakeStatus::Active {
            return Err(LedgerError::StakeNotActive);
        }

        let interest = if self.is_matured(now) {
            self.interest()
        } else {
            0
        };
        let total = self.amount + interest;
        account.balance += total;
        self.status = StakeStatus::Unstaked;

        Ok(StakePayout {
            principal: self.amount,
            interest,
            total,
        })
    }
}
