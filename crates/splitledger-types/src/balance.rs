//! Derived balance types. Never stored; recomputed from unpaid splits.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{LedgerError, Result, UserId};

/// Signed net position of a user.
///
/// Positive: others owe this user. Negative: this user owes others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetBalance {
    pub user_id: UserId,
    pub amount: Decimal,
}

impl NetBalance {
    #[must_use]
    pub fn new(user_id: UserId, amount: Decimal) -> Self {
        Self { user_id, amount }
    }

    #[must_use]
    pub fn is_creditor(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    #[must_use]
    pub fn is_debtor(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }
}

/// Net position between two users over all their unpaid splits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairwiseBalance {
    pub user_a: UserId,
    pub user_b: UserId,
    /// Unpaid amount A owes on expenses paid by B.
    pub owed_by_a: Decimal,
    /// Unpaid amount B owes on expenses paid by A.
    pub owed_by_b: Decimal,
    /// `owed_by_b - owed_by_a`; positive means B owes A.
    pub net: Decimal,
}

impl PairwiseBalance {
    #[must_use]
    pub fn new(user_a: UserId, user_b: UserId, owed_by_a: Decimal, owed_by_b: Decimal) -> Self {
        Self {
            user_a,
            user_b,
            owed_by_a,
            owed_by_b,
            net: owed_by_b - owed_by_a,
        }
    }

    /// Whether the pair has nothing outstanding in either direction.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.owed_by_a.is_zero() && self.owed_by_b.is_zero()
    }
}

/// Sum of a set of net balances. Zero for any closed group.
pub fn total_net(balances: &[NetBalance]) -> Result<Decimal> {
    checked_sum(balances.iter().map(|b| b.amount), "net balances")
}

/// Exact sum that reports overflow as [`LedgerError::AmountOverflow`]
/// instead of panicking. `context` names what was being summed.
pub fn checked_sum<I>(amounts: I, context: &'static str) -> Result<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
        .ok_or(LedgerError::AmountOverflow { context })
}
