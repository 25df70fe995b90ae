//! Settlement plan and execution result types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{SplitId, UserId};

/// One leg of a settlement plan: `from` pays `to` the given amount.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SettlementTransaction {
    pub from: UserId,
    pub to: UserId,
    pub amount: Decimal,
}

impl SettlementTransaction {
    #[must_use]
    pub fn new(from: UserId, to: UserId, amount: Decimal) -> Self {
        Self { from, to, amount }
    }
}

/// Output of the settlement optimizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPlan {
    /// Legs in emission order.
    pub transactions: Vec<SettlementTransaction>,
    /// Sum of all positive input balances.
    pub total_debt: Decimal,
    /// Hex SHA-256 over the ordered legs. Identical plans share a digest.
    pub digest: String,
}

impl SettlementPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Sum of all leg amounts. Equals `total_debt` for a well-formed plan.
    #[must_use]
    pub fn total_transferred(&self) -> Decimal {
        self.transactions.iter().map(|t| t.amount).sum()
    }
}

/// Result of applying settlement legs to the split store.
///
/// A leg that matched no split is not an error; it shows up in `unmatched`
/// and adds nothing to `settled_split_count` / `settled_amount`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub settled_amount: Decimal,
    pub settled_split_count: usize,
    pub transactions_processed: usize,
    pub settled_split_ids: Vec<SplitId>,
    pub unmatched: Vec<SettlementTransaction>,
}

impl ExecutionSummary {
    /// Fold one processed leg into the summary.
    pub fn record_leg(
        &mut self,
        leg: &SettlementTransaction,
        settled: &[SplitId],
        settled_amount: Decimal,
    ) {
        self.transactions_processed += 1;
        if settled.is_empty() {
            self.unmatched.push(leg.clone());
            return;
        }
        self.settled_split_count += settled.len();
        self.settled_amount += settled_amount;
        self.settled_split_ids.extend_from_slice(settled);
    }

    /// Whether every processed leg settled at least one split.
    #[must_use]
    pub fn fully_matched(&self) -> bool {
        self.unmatched.is_empty()
    }
}
