//! Greedy debt netting.
//!
//! ```text
//! optimize_settlement(&[NetBalance]) -> SettlementPlan
//! ```
//!
//! ## Algorithm
//!
//! 1. Split balances into creditors (> 0) and debtors (< 0); drop zeros
//! 2. Take the creditor with the largest remainder and the debtor with the
//!    largest absolute remainder (ties: lower user id first)
//! 3. Transfer `min(creditor, |debtor|)`, emit one leg
//! 4. Put back whichever party still has a remainder; repeat
//!
//! Every leg exhausts at least one party and the last leg exhausts both, so
//! `N` non-zero balances yield at most `N - 1` legs. Not globally minimal.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use rust_decimal::Decimal;
use splitledger_types::{
    LedgerError, NetBalance, Result, SettlementPlan, SettlementTransaction, UserId,
};

use crate::digest::plan_digest;

/// A creditor or debtor with its outstanding (absolute) amount.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Party {
    remaining: Decimal,
    user: UserId,
}

impl Ord for Party {
    /// Max-heap order: larger remainder first, then lower user id first.
    fn cmp(&self, other: &Self) -> Ordering {
        self.remaining
            .cmp(&other.remaining)
            .then_with(|| other.user.cmp(&self.user))
    }
}

impl PartialOrd for Party {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compute a settlement plan for a set of net balances.
///
/// # Errors
/// - `InvalidTransaction` if a user appears more than once
/// - `PlanImbalance` if positive and negative balances do not cancel out
/// - `AmountOverflow` if either side's total exceeds the decimal range
pub fn optimize_settlement(balances: &[NetBalance]) -> Result<SettlementPlan> {
    let mut seen = HashSet::with_capacity(balances.len());
    let mut creditors = BinaryHeap::new();
    let mut debtors = BinaryHeap::new();
    let mut credits = Decimal::ZERO;
    let mut debits = Decimal::ZERO;

    for balance in balances {
        if !seen.insert(balance.user_id) {
            return Err(LedgerError::InvalidTransaction {
                reason: format!("user {} appears more than once", balance.user_id),
            });
        }
        if balance.is_creditor() {
            credits = credits
                .checked_add(balance.amount)
                .ok_or(LedgerError::AmountOverflow { context: "plan credits" })?;
            creditors.push(Party {
                remaining: balance.amount,
                user: balance.user_id,
            });
        } else if balance.is_debtor() {
            debits = debits
                .checked_add(balance.amount.abs())
                .ok_or(LedgerError::AmountOverflow { context: "plan debits" })?;
            debtors.push(Party {
                remaining: balance.amount.abs(),
                user: balance.user_id,
            });
        }
    }

    if credits != debits {
        tracing::error!(%credits, %debits, "settlement input does not balance");
        return Err(LedgerError::PlanImbalance { credits, debits });
    }

    let mut transactions = Vec::with_capacity((creditors.len() + debtors.len()).saturating_sub(1));
    while let (Some(mut creditor), Some(mut debtor)) = (creditors.peek().cloned(), debtors.peek().cloned()) {
        creditors.pop();
        debtors.pop();

        let amount = creditor.remaining.min(debtor.remaining);
        transactions.push(SettlementTransaction::new(debtor.user, creditor.user, amount));

        creditor.remaining -= amount;
        debtor.remaining -= amount;
        if !creditor.remaining.is_zero() {
            creditors.push(creditor);
        }
        if !debtor.remaining.is_zero() {
            debtors.push(debtor);
        }
    }

    let digest = plan_digest(&transactions);
    tracing::info!(
        legs = transactions.len(),
        total_debt = %credits,
        digest = %digest,
        "computed settlement plan"
    );

    Ok(SettlementPlan {
        transactions,
        total_debt: credits,
        digest,
    })
}
