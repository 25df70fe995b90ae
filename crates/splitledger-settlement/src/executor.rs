//! Settlement execution: turns settlement legs into `paid = true` flags.
//!
//! Each leg runs in its own store transaction:
//! 1. Read the unpaid splits `from` owes on expenses paid by `to`
//! 2. Pick rows according to the [`MatchPolicy`]
//! 3. Mark them paid; the store rejects rows already paid
//!
//! A leg either commits all its rows or none. Legs of one batch are
//! independent: an earlier leg stays committed if a later one fails. Under
//! an idempotency key the committed prefix is recorded, and a retry resumes
//! after it.
//!
//! ## Row matching
//!
//! Under [`MatchPolicy::ExactRow`] a leg settles one split whose amount
//! equals the leg amount exactly. Optimizer legs are computed from
//! aggregated balances, so a leg spanning several splits matches nothing
//! under that policy; such legs are logged and returned in
//! [`ExecutionSummary::unmatched`]. [`MatchPolicy::ExactCover`] settles a
//! set of rows adding up to the leg exactly, preferring older rows. The
//! search covers the oldest [`MAX_COVER_CANDIDATES`] eligible rows.

use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use splitledger_store::{SplitFilter, SplitStore};
use splitledger_types::constants::MAX_COVER_CANDIDATES;
use splitledger_types::{
    EngineConfig, ExecutionSummary, IdempotencyKey, LedgerError, MatchPolicy, OpenSplit, Result,
    SettlementPlan, SettlementTransaction, SplitId, UserId, checked_sum,
};

use crate::digest::{plan_digest, verify_plan_digest};
use crate::idempotency::{IdempotencyGuard, Progress};

/// Applies settlement legs to the split store.
pub struct SettlementExecutor<S> {
    store: Arc<S>,
    match_policy: MatchPolicy,
    /// Held for the whole of an idempotent execution so concurrent retries
    /// of one key run one at a time.
    idempotency: Mutex<IdempotencyGuard>,
}

impl<S: SplitStore> SettlementExecutor<S> {
    #[must_use]
    pub fn new(store: Arc<S>, config: &EngineConfig) -> Self {
        Self {
            store,
            match_policy: config.match_policy,
            idempotency: Mutex::new(IdempotencyGuard::new(config.idempotency_cache_size)),
        }
    }

    /// Apply a batch of settlement legs.
    ///
    /// # Errors
    /// - `SelfSettlement` / `InvalidTransaction` for malformed legs; checked
    ///   before anything is written
    /// - store errors from a failing leg (earlier legs stay committed)
    pub fn execute(&self, transactions: &[SettlementTransaction]) -> Result<ExecutionSummary> {
        validate_legs(transactions)?;

        let mut summary = ExecutionSummary::default();
        self.apply_legs(transactions, &mut summary)?;
        Ok(summary)
    }

    /// Apply a batch at most once per `key`.
    ///
    /// A retry with the same key and the same legs returns the first
    /// execution's summary and writes nothing. If the first execution
    /// failed partway, the retry applies only the legs after the committed
    /// prefix and returns the summary of the whole batch.
    ///
    /// # Errors
    /// - `IdempotencyKeyReused` if `key` was used for different legs
    /// - everything [`execute`](Self::execute) returns
    pub fn execute_idempotent(
        &self,
        key: IdempotencyKey,
        transactions: &[SettlementTransaction],
    ) -> Result<ExecutionSummary> {
        validate_legs(transactions)?;

        let digest = plan_digest(transactions);
        let mut guard = self
            .idempotency
            .lock()
            .map_err(|_| LedgerError::Store("idempotency guard lock poisoned".to_string()))?;

        let mut summary = match guard.lookup(&key, &digest)? {
            Some(Progress::Complete(previous)) => {
                tracing::info!(%key, %digest, "settlement replay, returning recorded result");
                return Ok(previous);
            }
            Some(Progress::Partial(committed)) => {
                tracing::info!(
                    %key,
                    resume_at = committed.transactions_processed,
                    "resuming interrupted settlement"
                );
                committed
            }
            None => ExecutionSummary::default(),
        };

        let remaining = transactions
            .get(summary.transactions_processed..)
            .unwrap_or_default();
        match self.apply_legs(remaining, &mut summary) {
            Ok(()) => {
                guard.record(key, digest, summary.clone());
                Ok(summary)
            }
            Err(err) => {
                tracing::warn!(
                    %key,
                    committed_legs = summary.transactions_processed,
                    error = %err,
                    "settlement interrupted, committed legs recorded for retry"
                );
                guard.record_partial(key, digest, summary);
                Err(err)
            }
        }
    }

    /// Execute an optimizer plan under an idempotency key.
    ///
    /// # Errors
    /// - `InvalidTransaction` if the plan's digest does not match its legs
    /// - everything [`execute_idempotent`](Self::execute_idempotent) returns
    pub fn execute_plan(&self, key: IdempotencyKey, plan: &SettlementPlan) -> Result<ExecutionSummary> {
        if !verify_plan_digest(plan) {
            tracing::error!(%key, digest = %plan.digest, "settlement plan digest mismatch");
            return Err(LedgerError::InvalidTransaction {
                reason: format!("plan digest {} does not match its legs", plan.digest),
            });
        }
        self.execute_idempotent(key, &plan.transactions)
    }

    /// Settle what `payer` owes `payee`.
    ///
    /// With `amount`, behaves like a single-leg [`execute`](Self::execute).
    /// Without, every unpaid split `payer` owes on `payee`'s expenses is
    /// marked paid in one transaction.
    ///
    /// # Errors
    /// `SelfSettlement` if `payer == payee`.
    pub fn settle_pairwise(
        &self,
        payer: UserId,
        payee: UserId,
        amount: Option<Decimal>,
    ) -> Result<ExecutionSummary> {
        if payer == payee {
            return Err(LedgerError::SelfSettlement(payer));
        }
        if let Some(amount) = amount {
            return self.execute(&[SettlementTransaction::new(payer, payee, amount)]);
        }

        let filter = SplitFilter::owed_by(payer, payee);
        let (settled, total) = self.store.atomically(|tx| {
            let rows = tx.unpaid_splits(&filter)?;
            let ids: Vec<SplitId> = rows.iter().map(|r| r.split.id).collect();
            let total = checked_sum(rows.iter().map(OpenSplit::amount), "pairwise settlement")?;
            tx.mark_paid(&ids)?;
            Ok((ids, total))
        })?;

        let mut summary = ExecutionSummary::default();
        summary.record_leg(&SettlementTransaction::new(payer, payee, total), &settled, total);
        tracing::info!(
            %payer,
            %payee,
            settled_splits = summary.settled_split_count,
            settled_amount = %summary.settled_amount,
            "settled all debt between users"
        );
        Ok(summary)
    }

    /// Apply `legs` in order, folding each committed leg into `summary`.
    /// On error `summary` still describes every leg committed before it.
    fn apply_legs(&self, legs: &[SettlementTransaction], summary: &mut ExecutionSummary) -> Result<()> {
        for leg in legs {
            let (settled, amount) = self.settle_leg(leg)?;
            if settled.is_empty() {
                tracing::warn!(
                    from = %leg.from,
                    to = %leg.to,
                    amount = %leg.amount,
                    policy = ?self.match_policy,
                    "settlement leg matched no unpaid split"
                );
            }
            summary.record_leg(leg, &settled, amount);
        }

        tracing::info!(
            legs = summary.transactions_processed,
            settled_splits = summary.settled_split_count,
            settled_amount = %summary.settled_amount,
            unmatched = summary.unmatched.len(),
            "executed settlement"
        );
        Ok(())
    }

    /// Settle one leg inside one store transaction. Returns the settled
    /// split ids and their total.
    fn settle_leg(&self, leg: &SettlementTransaction) -> Result<(Vec<SplitId>, Decimal)> {
        let policy = self.match_policy;
        self.store.atomically(|tx| {
            let rows = match policy {
                MatchPolicy::ExactRow => {
                    tx.unpaid_splits(&SplitFilter::owed_by(leg.from, leg.to).with_amount(leg.amount))?
                }
                MatchPolicy::ExactCover => tx.unpaid_splits(&SplitFilter::owed_by(leg.from, leg.to))?,
            };

            let chosen = select_rows(policy, &rows, leg.amount);
            if chosen.is_empty() {
                return Ok((Vec::new(), Decimal::ZERO));
            }
            let ids: Vec<SplitId> = chosen.iter().map(|r| r.split.id).collect();
            tx.mark_paid(&ids)?;
            Ok((ids, leg.amount))
        })
    }
}

/// Pick the rows a leg settles. `rows` is in split id (creation) order.
fn select_rows(policy: MatchPolicy, rows: &[OpenSplit], amount: Decimal) -> Vec<&OpenSplit> {
    if let Some(row) = rows.iter().find(|r| r.amount() == amount) {
        return vec![row];
    }
    if policy == MatchPolicy::ExactRow {
        return Vec::new();
    }
    exact_cover(rows, amount)
}

/// Oldest-first subset of `rows` summing exactly to `amount`, or nothing.
///
/// Depth-first over the oldest eligible rows, taking a row before skipping
/// it, so the first cover found is the one made of the oldest rows.
fn exact_cover(rows: &[OpenSplit], amount: Decimal) -> Vec<&OpenSplit> {
    let candidates: Vec<&OpenSplit> = rows
        .iter()
        .filter(|r| r.amount() > Decimal::ZERO && r.amount() <= amount)
        .take(MAX_COVER_CANDIDATES)
        .collect();

    // suffix[i]: total of candidates[i..], an upper bound on what is left to take
    let mut suffix = vec![Decimal::ZERO; candidates.len() + 1];
    for i in (0..candidates.len()).rev() {
        suffix[i] = suffix[i + 1].saturating_add(candidates[i].amount());
    }

    let mut picked = Vec::new();
    if cover_from(&candidates, &suffix, 0, amount, &mut picked) {
        picked.into_iter().map(|i| candidates[i]).collect()
    } else {
        Vec::new()
    }
}

fn cover_from(
    candidates: &[&OpenSplit],
    suffix: &[Decimal],
    start: usize,
    remaining: Decimal,
    picked: &mut Vec<usize>,
) -> bool {
    if remaining.is_zero() {
        return true;
    }
    for i in start..candidates.len() {
        if suffix[i] < remaining {
            return false;
        }
        let row_amount = candidates[i].amount();
        if row_amount <= remaining {
            picked.push(i);
            if cover_from(candidates, suffix, i + 1, remaining - row_amount, picked) {
                return true;
            }
            picked.pop();
        }
    }
    false
}

fn validate_legs(transactions: &[SettlementTransaction]) -> Result<()> {
    for leg in transactions {
        if leg.from == leg.to {
            return Err(LedgerError::SelfSettlement(leg.from));
        }
        if leg.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidTransaction {
                reason: format!(
                    "leg {} -> {} has non-positive amount {}",
                    leg.from, leg.to, leg.amount
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use splitledger_store::{MemoryStore, SplitTransaction};
    use splitledger_types::{ComputedShare, Expense, ExpenseId, Split, SplitType};

    use super::*;

    /// Delegates to a [`MemoryStore`] but fails the `fail_on`-th transaction.
    struct FlakyStore {
        inner: MemoryStore,
        calls: AtomicUsize,
        fail_on: usize,
    }

    impl SplitStore for FlakyStore {
        fn expense(&self, id: ExpenseId) -> Result<Expense> {
            self.inner.expense(id)
        }

        fn create_splits(&self, expense_id: ExpenseId, splits: Vec<Split>) -> Result<Vec<Split>> {
            self.inner.create_splits(expense_id, splits)
        }

        fn splits_for_expense(&self, expense_id: ExpenseId) -> Result<Vec<Split>> {
            self.inner.splits_for_expense(expense_id)
        }

        fn unpaid_splits(&self, filter: &SplitFilter) -> Result<Vec<OpenSplit>> {
            self.inner.unpaid_splits(filter)
        }

        fn atomically<T, F>(&self, f: F) -> Result<T>
        where
            F: FnOnce(&mut dyn SplitTransaction) -> Result<T>,
        {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == self.fail_on {
                return Err(LedgerError::Store("transient".into()));
            }
            self.inner.atomically(f)
        }
    }

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn users() -> [UserId; 3] {
        [UserId::from_u128(1), UserId::from_u128(2), UserId::from_u128(3)]
    }

    /// One expense paid by `payer`, one split per (user, amount).
    fn add_expense(store: &MemoryStore, payer: UserId, shares: &[(UserId, i64)]) -> Vec<Split> {
        let total: i64 = shares.iter().map(|(_, a)| a).sum();
        let expense = Expense::dummy(payer, total, None);
        store.insert_expense(expense.clone()).unwrap();
        let splits = shares
            .iter()
            .map(|&(user_id, units)| {
                Split::from_share(
                    expense.id,
                    SplitType::Amount,
                    &ComputedShare {
                        user_id,
                        amount: dec(units),
                        percentage: None,
                    },
                )
            })
            .collect();
        store.create_splits(expense.id, splits).unwrap()
    }

    fn executor(store: &Arc<MemoryStore>, policy: MatchPolicy) -> SettlementExecutor<MemoryStore> {
        let config = EngineConfig {
            match_policy: policy,
            ..EngineConfig::default()
        };
        SettlementExecutor::new(Arc::clone(store), &config)
    }

    #[test]
    fn exact_row_settles_matching_split() {
        let store = Arc::new(MemoryStore::new());
        let [a, b, c] = users();
        let splits = add_expense(&store, a, &[(a, 30), (b, 30), (c, 30)]);

        let summary = executor(&store, MatchPolicy::ExactRow)
            .execute(&[SettlementTransaction::new(b, a, dec(30))])
            .unwrap();

        assert_eq!(summary.transactions_processed, 1);
        assert_eq!(summary.settled_split_count, 1);
        assert_eq!(summary.settled_amount, dec(30));
        assert_eq!(summary.settled_split_ids, vec![splits[1].id]);
        assert!(store.split(splits[1].id).unwrap().paid);
        assert!(!store.split(splits[2].id).unwrap().paid);
    }

    #[test]
    fn scenario_c_partial_amount_settles_nothing() {
        let store = Arc::new(MemoryStore::new());
        let [a, b, _] = users();
        let splits = add_expense(&store, a, &[(b, 30)]);

        let summary = executor(&store, MatchPolicy::ExactRow)
            .execute(&[SettlementTransaction::new(b, a, dec(15))])
            .unwrap();

        assert_eq!(summary.transactions_processed, 1);
        assert_eq!(summary.settled_split_count, 0);
        assert_eq!(summary.settled_amount, Decimal::ZERO);
        assert_eq!(summary.unmatched.len(), 1);
        assert!(!store.split(splits[0].id).unwrap().paid);
    }

    #[test]
    fn exact_row_takes_oldest_of_equal_rows() {
        let store = Arc::new(MemoryStore::new());
        let [a, b, _] = users();
        let first = add_expense(&store, a, &[(b, 20)]);
        let second = add_expense(&store, a, &[(b, 20)]);

        let summary = executor(&store, MatchPolicy::ExactRow)
            .execute(&[SettlementTransaction::new(b, a, dec(20))])
            .unwrap();

        assert_eq!(summary.settled_split_ids, vec![first[0].id]);
        assert!(!store.split(second[0].id).unwrap().paid);
    }

    #[test]
    fn exact_row_cannot_span_rows_but_exact_cover_can() {
        let [a, b, _] = users();

        let store = Arc::new(MemoryStore::new());
        add_expense(&store, a, &[(b, 10)]);
        add_expense(&store, a, &[(b, 20)]);
        let leg = [SettlementTransaction::new(b, a, dec(30))];

        let summary = executor(&store, MatchPolicy::ExactRow).execute(&leg).unwrap();
        assert_eq!(summary.settled_split_count, 0);

        let summary = executor(&store, MatchPolicy::ExactCover).execute(&leg).unwrap();
        assert_eq!(summary.settled_split_count, 2);
        assert_eq!(summary.settled_amount, dec(30));
    }

    #[test]
    fn exact_cover_is_all_or_nothing() {
        let store = Arc::new(MemoryStore::new());
        let [a, b, _] = users();
        let splits = add_expense(&store, a, &[(b, 10)]);
        add_expense(&store, a, &[(b, 25)]);

        let summary = executor(&store, MatchPolicy::ExactCover)
            .execute(&[SettlementTransaction::new(b, a, dec(30))])
            .unwrap();
        assert_eq!(summary.settled_split_count, 0);
        assert!(!store.split(splits[0].id).unwrap().paid);
    }

    #[test]
    fn select_rows_prefers_single_exact_row() {
        let [a, b, _] = users();
        let store = MemoryStore::new();
        add_expense(&store, a, &[(b, 10)]);
        add_expense(&store, a, &[(b, 20)]);
        add_expense(&store, a, &[(b, 30)]);
        let rows = store.unpaid_splits(&SplitFilter::owed_by(b, a)).unwrap();

        let picked = select_rows(MatchPolicy::ExactCover, &rows, dec(30));
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].amount(), dec(30));
    }

    #[test]
    fn self_settlement_rejected_before_writes() {
        let store = Arc::new(MemoryStore::new());
        let [a, b, _] = users();
        let splits = add_expense(&store, a, &[(b, 30)]);

        let err = executor(&store, MatchPolicy::ExactRow)
            .execute(&[
                SettlementTransaction::new(b, a, dec(30)),
                SettlementTransaction::new(a, a, dec(5)),
            ])
            .unwrap_err();
        assert!(matches!(err, LedgerError::SelfSettlement(u) if u == a));
        assert!(!store.split(splits[0].id).unwrap().paid);

        let err = executor(&store, MatchPolicy::ExactRow)
            .settle_pairwise(a, a, None)
            .unwrap_err();
        assert!(matches!(err, LedgerError::SelfSettlement(_)));
    }

    #[test]
    fn non_positive_leg_rejected() {
        let store = Arc::new(MemoryStore::new());
        let [a, b, _] = users();
        let err = executor(&store, MatchPolicy::ExactRow)
            .execute(&[SettlementTransaction::new(b, a, Decimal::ZERO)])
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTransaction { .. }));
    }

    #[test]
    fn pairwise_without_amount_settles_everything_owed() {
        let store = Arc::new(MemoryStore::new());
        let [a, b, c] = users();
        add_expense(&store, a, &[(b, 10), (c, 10)]);
        add_expense(&store, a, &[(b, 15)]);
        let reverse = add_expense(&store, b, &[(a, 7)]);

        let summary = executor(&store, MatchPolicy::ExactRow)
            .settle_pairwise(b, a, None)
            .unwrap();

        assert_eq!(summary.settled_split_count, 2);
        assert_eq!(summary.settled_amount, dec(25));
        assert!(store.unpaid_splits(&SplitFilter::owed_by(b, a)).unwrap().is_empty());
        // debts in the other direction and to other payers are untouched
        assert!(!store.split(reverse[0].id).unwrap().paid);
        assert_eq!(store.unpaid_splits(&SplitFilter::owed_by(c, a)).unwrap().len(), 1);
    }

    #[test]
    fn pairwise_with_amount_uses_exact_match() {
        let store = Arc::new(MemoryStore::new());
        let [a, b, _] = users();
        add_expense(&store, a, &[(b, 10)]);
        add_expense(&store, a, &[(b, 15)]);

        let exec = executor(&store, MatchPolicy::ExactRow);
        let miss = exec.settle_pairwise(b, a, Some(dec(25))).unwrap();
        assert_eq!(miss.settled_split_count, 0);

        let hit = exec.settle_pairwise(b, a, Some(dec(15))).unwrap();
        assert_eq!(hit.settled_split_count, 1);
        assert_eq!(hit.settled_amount, dec(15));
    }

    #[test]
    fn pairwise_with_nothing_owed_is_a_no_op() {
        let store = Arc::new(MemoryStore::new());
        let [a, b, _] = users();
        let summary = executor(&store, MatchPolicy::ExactRow)
            .settle_pairwise(b, a, None)
            .unwrap();
        assert_eq!(summary.transactions_processed, 1);
        assert_eq!(summary.settled_split_count, 0);
    }

    #[test]
    fn repeated_leg_never_settles_a_row_twice() {
        let store = Arc::new(MemoryStore::new());
        let [a, b, _] = users();
        add_expense(&store, a, &[(b, 30)]);
        let leg = SettlementTransaction::new(b, a, dec(30));

        let summary = executor(&store, MatchPolicy::ExactRow)
            .execute(&[leg.clone(), leg])
            .unwrap();
        assert_eq!(summary.transactions_processed, 2);
        assert_eq!(summary.settled_split_count, 1);
        assert_eq!(summary.unmatched.len(), 1);
    }

    #[test]
    fn idempotent_replay_does_not_settle_again() {
        let store = Arc::new(MemoryStore::new());
        let [a, b, _] = users();
        add_expense(&store, a, &[(b, 30)]);
        add_expense(&store, a, &[(b, 30)]);
        let legs = [SettlementTransaction::new(b, a, dec(30))];
        let exec = executor(&store, MatchPolicy::ExactRow);
        let key = IdempotencyKey::new("req-1");

        let first = exec.execute_idempotent(key.clone(), &legs).unwrap();
        let replay = exec.execute_idempotent(key, &legs).unwrap();

        assert_eq!(first, replay);
        assert_eq!(
            store.unpaid_splits(&SplitFilter::owed_by(b, a)).unwrap().len(),
            1,
            "replay must not consume the second split"
        );
    }

    #[test]
    fn idempotency_key_reuse_rejected() {
        let store = Arc::new(MemoryStore::new());
        let [a, b, _] = users();
        add_expense(&store, a, &[(b, 30)]);
        let exec = executor(&store, MatchPolicy::ExactRow);
        let key = IdempotencyKey::new("req-1");

        exec.execute_idempotent(key.clone(), &[SettlementTransaction::new(b, a, dec(30))])
            .unwrap();
        let err = exec
            .execute_idempotent(key, &[SettlementTransaction::new(b, a, dec(31))])
            .unwrap_err();
        assert!(matches!(err, LedgerError::IdempotencyKeyReused { .. }));
    }

    #[test]
    fn exact_cover_finds_non_prefix_subset() {
        let store = Arc::new(MemoryStore::new());
        let [a, b, _] = users();
        let oldest = add_expense(&store, a, &[(b, 20)]);
        let second = add_expense(&store, a, &[(b, 15)]);
        let third = add_expense(&store, a, &[(b, 15)]);

        let summary = executor(&store, MatchPolicy::ExactCover)
            .execute(&[SettlementTransaction::new(b, a, dec(30))])
            .unwrap();

        assert_eq!(summary.settled_split_ids, vec![second[0].id, third[0].id]);
        assert_eq!(summary.settled_amount, dec(30));
        assert!(!store.split(oldest[0].id).unwrap().paid);
    }

    #[test]
    fn exact_cover_prefers_oldest_rows() {
        let [a, b, _] = users();
        let store = MemoryStore::new();
        add_expense(&store, a, &[(b, 10)]);
        add_expense(&store, a, &[(b, 25)]);
        add_expense(&store, a, &[(b, 20)]);
        add_expense(&store, a, &[(b, 5)]);
        let rows = store.unpaid_splits(&SplitFilter::owed_by(b, a)).unwrap();

        let picked: Vec<Decimal> = select_rows(MatchPolicy::ExactCover, &rows, dec(30))
            .iter()
            .map(|r| r.amount())
            .collect();
        assert_eq!(picked, vec![dec(10), dec(20)]);
    }

    #[test]
    fn interrupted_idempotent_batch_resumes_after_committed_legs() {
        let [a, b, c] = users();
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            calls: AtomicUsize::new(0),
            fail_on: 2,
        });
        add_expense(&store.inner, a, &[(b, 20)]);
        add_expense(&store.inner, a, &[(b, 20)]);
        add_expense(&store.inner, a, &[(c, 5)]);
        let exec = SettlementExecutor::new(Arc::clone(&store), &EngineConfig::default());
        let legs = [
            SettlementTransaction::new(b, a, dec(20)),
            SettlementTransaction::new(c, a, dec(5)),
        ];
        let key = IdempotencyKey::new("k");

        let err = exec.execute_idempotent(key.clone(), &legs).unwrap_err();
        assert!(matches!(err, LedgerError::Store(_)));
        assert_eq!(store.inner.unpaid_splits(&SplitFilter::owed_by(b, a)).unwrap().len(), 1);

        let summary = exec.execute_idempotent(key.clone(), &legs).unwrap();
        assert_eq!(summary.transactions_processed, 2);
        assert_eq!(summary.settled_split_count, 2);
        assert_eq!(summary.settled_amount, dec(25));
        assert_eq!(
            store.inner.unpaid_splits(&SplitFilter::owed_by(b, a)).unwrap().len(),
            1,
            "the committed leg must not settle a second row"
        );
        assert!(store.inner.unpaid_splits(&SplitFilter::owed_by(c, a)).unwrap().is_empty());

        // completed now: a further retry is a pure replay
        assert_eq!(exec.execute_idempotent(key, &legs).unwrap(), summary);
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn tampered_plan_rejected_before_writes() {
        let store = Arc::new(MemoryStore::new());
        let [a, b, _] = users();
        let splits = add_expense(&store, a, &[(b, 30)]);
        let exec = executor(&store, MatchPolicy::ExactRow);
        let legs = vec![SettlementTransaction::new(b, a, dec(30))];
        let mut plan = SettlementPlan {
            digest: plan_digest(&legs),
            transactions: legs,
            total_debt: dec(30),
        };
        plan.transactions[0].amount = dec(40);

        let err = exec.execute_plan(IdempotencyKey::new("p"), &plan).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTransaction { .. }));
        assert!(!store.split(splits[0].id).unwrap().paid);

        plan.transactions[0].amount = dec(30);
        let summary = exec.execute_plan(IdempotencyKey::new("p"), &plan).unwrap();
        assert_eq!(summary.settled_split_ids, vec![splits[0].id]);
    }
}
