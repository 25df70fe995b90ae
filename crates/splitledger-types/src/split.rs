//! Split model: one user's obligated share of one expense.
//!
//! A split is created once, together with every other split of the same
//! expense. Its only later mutation is `paid: false -> true`, performed by
//! the settlement executor.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ExpenseId, GroupId, SplitId, UserId};

/// Allocation policy used to derive split amounts from an expense total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SplitType {
    /// Total divided evenly; remainder placed per `RemainderPolicy`.
    Equal,
    /// Each participant supplies an exact amount.
    Amount,
    /// Each participant supplies a percentage of the total.
    Percentage,
}

impl fmt::Display for SplitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "EQUAL"),
            Self::Amount => write!(f, "AMOUNT"),
            Self::Percentage => write!(f, "PERCENTAGE"),
        }
    }
}

/// A participant in a split request.
///
/// `amount` is required for [`SplitType::Amount`], `percentage` for
/// [`SplitType::Percentage`]; both are ignored for [`SplitType::Equal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: UserId,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub percentage: Option<Decimal>,
}

impl Participant {
    #[must_use]
    pub fn equal(user_id: UserId) -> Self {
        Self {
            user_id,
            amount: None,
            percentage: None,
        }
    }

    #[must_use]
    pub fn with_amount(user_id: UserId, amount: Decimal) -> Self {
        Self {
            user_id,
            amount: Some(amount),
            percentage: None,
        }
    }

    #[must_use]
    pub fn with_percentage(user_id: UserId, percentage: Decimal) -> Self {
        Self {
            user_id,
            amount: None,
            percentage: Some(percentage),
        }
    }
}

/// Output of the split calculator for one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedShare {
    pub user_id: UserId,
    pub amount: Decimal,
    /// Present for percentage splits only.
    pub percentage: Option<Decimal>,
}

/// A split row as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub id: SplitId,
    pub expense_id: ExpenseId,
    /// The ower.
    pub user_id: UserId,
    pub amount: Decimal,
    pub split_type: SplitType,
    pub percentage: Option<Decimal>,
    pub paid: bool,
}

impl Split {
    /// Materialize a computed share as a new, unpaid split row.
    #[must_use]
    pub fn from_share(expense_id: ExpenseId, split_type: SplitType, share: &ComputedShare) -> Self {
        Self {
            id: SplitId::new(),
            expense_id,
            user_id: share.user_id,
            amount: share.amount,
            split_type,
            percentage: share.percentage,
            paid: false,
        }
    }
}

/// An unpaid split joined with the owning expense's payer and group.
///
/// This is the row shape the balance aggregator and executor work on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenSplit {
    pub split: Split,
    pub payer_id: UserId,
    pub group_id: Option<GroupId>,
}

impl OpenSplit {
    /// A user's share of their own expense is not a debt.
    #[must_use]
    pub fn is_self_owed(&self) -> bool {
        self.split.user_id == self.payer_id
    }

    #[must_use]
    pub fn debtor(&self) -> UserId {
        self.split.user_id
    }

    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.split.amount
    }
}
