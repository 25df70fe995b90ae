//! Balance sheet and the closed-group conservation invariant.
//!
//! Every unpaid split moves the same amount onto the payer's credit and the
//! debtor's debit, so for a closed group:
//! ```text
//! Σ members' net balance == 0
//! ```
//!
//! A non-zero residual means split or expense data involves users outside
//! the roster (or was corrupted upstream). It is reported, never absorbed.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use splitledger_types::{GroupId, LedgerError, NetBalance, OpenSplit, Result, UserId, total_net};

/// Per-user running credit/debit totals.
#[derive(Debug, Clone, Default)]
pub struct BalanceSheet {
    credits: BTreeMap<UserId, Decimal>,
    debits: BTreeMap<UserId, Decimal>,
}

impl BalanceSheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one unpaid split. Self-owed splits are not debts and are
    /// ignored.
    ///
    /// # Errors
    /// `AmountOverflow` if a user's running total leaves the decimal range.
    pub fn record(&mut self, row: &OpenSplit) -> Result<()> {
        if row.is_self_owed() {
            return Ok(());
        }
        accumulate(&mut self.credits, row.payer_id, row.amount(), "balance credits")?;
        accumulate(&mut self.debits, row.debtor(), row.amount(), "balance debits")
    }

    /// Amount others owe `user`.
    #[must_use]
    pub fn credit(&self, user: UserId) -> Decimal {
        self.credits.get(&user).copied().unwrap_or(Decimal::ZERO)
    }

    /// Amount `user` owes others.
    #[must_use]
    pub fn debit(&self, user: UserId) -> Decimal {
        self.debits.get(&user).copied().unwrap_or(Decimal::ZERO)
    }

    /// Signed net balance of `user`.
    #[must_use]
    pub fn net(&self, user: UserId) -> Decimal {
        self.credit(user) - self.debit(user)
    }

    /// Net balances for the given users, in the given order. Users with no
    /// involvement get zero.
    #[must_use]
    pub fn net_balances(&self, users: &[UserId]) -> Vec<NetBalance> {
        users
            .iter()
            .map(|&user| NetBalance::new(user, self.net(user)))
            .collect()
    }

    /// Every user seen on either side, ascending by id.
    #[must_use]
    pub fn participants(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.credits.keys().chain(self.debits.keys()).copied().collect();
        users.sort();
        users.dedup();
        users
    }
}

fn accumulate(
    totals: &mut BTreeMap<UserId, Decimal>,
    user: UserId,
    amount: Decimal,
    context: &'static str,
) -> Result<()> {
    let total = totals.entry(user).or_insert(Decimal::ZERO);
    *total = total
        .checked_add(amount)
        .ok_or(LedgerError::AmountOverflow { context })?;
    Ok(())
}

/// Verify that a closed group's balances sum to exactly zero.
///
/// # Errors
/// Returns [`LedgerError::GroupImbalance`] with the residual otherwise.
pub fn verify_closed_group(group_id: GroupId, balances: &[NetBalance]) -> Result<()> {
    let residual = total_net(balances)?;
    if !residual.is_zero() {
        return Err(LedgerError::GroupImbalance { group_id, residual });
    }
    Ok(())
}
