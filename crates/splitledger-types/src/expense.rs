//! Expense model.
//!
//! Expenses are owned by the persistence collaborator. The engine reads the
//! amount, payer and group; it never mutates an expense.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ExpenseId, GroupId, UserId};

/// A paid expense waiting to be split among participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    /// Total amount paid. Immutable once splits exist.
    pub amount: Decimal,
    /// The user who paid and is therefore owed by every other participant.
    pub payer_id: UserId,
    /// Group the expense belongs to, if any.
    pub group_id: Option<GroupId>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    #[must_use]
    pub fn new(amount: Decimal, payer_id: UserId, group_id: Option<GroupId>) -> Self {
        Self {
            id: ExpenseId::new(),
            amount,
            payer_id,
            group_id,
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Builder-style description setter.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether the expense is scoped to the given group.
    #[must_use]
    pub fn in_group(&self, group_id: GroupId) -> bool {
        self.group_id == Some(group_id)
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Expense {
    /// Expense with a whole-unit amount, for tests.
    #[must_use]
    pub fn dummy(payer_id: UserId, units: i64, group_id: Option<GroupId>) -> Self {
        Self::new(Decimal::new(units, 0), payer_id, group_id)
            .with_description(format!("dummy expense of {units}"))
    }
}
