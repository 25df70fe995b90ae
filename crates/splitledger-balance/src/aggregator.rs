//! Balance aggregation over unpaid splits.
//!
//! Paid splits never contribute to a balance. A user's share of their own
//! expense is not a debt and is skipped everywhere.
//!
//! Balance views are advisory: they read outside any store transaction and
//! may race with a settlement in flight.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use splitledger_store::{GroupRoster, SplitFilter, SplitStore};
use splitledger_types::{
    EngineConfig, GroupId, LedgerError, NetBalance, OpenSplit, PairwiseBalance, Result, UserId,
    checked_sum,
};

use crate::conservation::{BalanceSheet, verify_closed_group};

/// Computes pairwise, per-user and per-group net balances.
pub struct BalanceAggregator<S> {
    store: Arc<S>,
    enforce_group_conservation: bool,
}

impl<S> BalanceAggregator<S>
where
    S: SplitStore + GroupRoster,
{
    #[must_use]
    pub fn new(store: Arc<S>, config: &EngineConfig) -> Self {
        Self {
            store,
            enforce_group_conservation: config.enforce_group_conservation,
        }
    }

    /// Net position between `user_a` and `user_b` across all unpaid splits.
    ///
    /// `net > 0` means B owes A.
    ///
    /// # Errors
    /// `SelfBalance` if both users are the same.
    pub fn pairwise_balance(&self, user_a: UserId, user_b: UserId) -> Result<PairwiseBalance> {
        if user_a == user_b {
            return Err(LedgerError::SelfBalance(user_a));
        }

        let owed_by_a = self.sum_owed(user_a, user_b)?;
        let owed_by_b = self.sum_owed(user_b, user_a)?;
        Ok(PairwiseBalance::new(user_a, user_b, owed_by_a, owed_by_b))
    }

    /// Net balance of every roster member of `group_id`, in roster order.
    ///
    /// Members with no unpaid involvement appear with zero.
    ///
    /// # Errors
    /// - `GroupNotFound` if the roster collaborator does not know the group
    /// - `GroupImbalance` if conservation is enforced and the members'
    ///   balances do not sum to zero
    pub fn group_balances(&self, group_id: GroupId) -> Result<Vec<NetBalance>> {
        let members = self.store.members(group_id)?;
        let rows = self.store.unpaid_splits(&SplitFilter::in_group(group_id))?;

        let mut sheet = BalanceSheet::new();
        for row in &rows {
            sheet.record(row)?;
        }
        let balances = sheet.net_balances(&members);

        if self.enforce_group_conservation {
            if let Err(err) = verify_closed_group(group_id, &balances) {
                let outsiders: Vec<UserId> = sheet
                    .participants()
                    .into_iter()
                    .filter(|u| !members.contains(u))
                    .collect();
                tracing::error!(
                    %group_id,
                    error = %err,
                    outsiders = outsiders.len(),
                    "group balances do not conserve"
                );
                return Err(err);
            }
        }

        tracing::debug!(
            %group_id,
            members = members.len(),
            open_splits = rows.len(),
            "computed group balances"
        );
        Ok(balances)
    }

    /// One pairwise balance per counterparty `user` has unpaid splits with,
    /// ascending by counterparty id.
    pub fn balances_for_user(&self, user: UserId) -> Result<Vec<PairwiseBalance>> {
        // counterparty -> (owed by user, owed to user)
        let mut per_counterparty: BTreeMap<UserId, (Decimal, Decimal)> = BTreeMap::new();

        for row in self.store.unpaid_splits(&SplitFilter::new().with_debtor(user))? {
            if row.is_self_owed() {
                continue;
            }
            let owed = &mut per_counterparty.entry(row.payer_id).or_default().0;
            *owed = checked_sum([*owed, row.amount()], "pairwise balance")?;
        }
        for row in self.store.unpaid_splits(&SplitFilter::new().with_payer(user))? {
            if row.is_self_owed() {
                continue;
            }
            let owed = &mut per_counterparty.entry(row.debtor()).or_default().1;
            *owed = checked_sum([*owed, row.amount()], "pairwise balance")?;
        }

        Ok(per_counterparty
            .into_iter()
            .map(|(other, (owed_by_user, owed_by_other))| {
                PairwiseBalance::new(user, other, owed_by_user, owed_by_other)
            })
            .collect())
    }

    fn sum_owed(&self, debtor: UserId, payer: UserId) -> Result<Decimal> {
        let rows = self.store.unpaid_splits(&SplitFilter::owed_by(debtor, payer))?;
        checked_sum(
            rows.iter().filter(|row| !row.is_self_owed()).map(OpenSplit::amount),
            "pairwise balance",
        )
    }
}
