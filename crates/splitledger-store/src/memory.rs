//! In-memory reference implementation of the store traits.
//!
//! All state lives behind one `Mutex`. A transaction holds the lock for its
//! whole duration and stages `paid` flags in a side set; the set is applied
//! only when the closure returns `Ok`, so a failed transaction leaves every
//! row untouched.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use splitledger_types::{
    Expense, ExpenseId, GroupId, LedgerError, OpenSplit, Result, Split, SplitId, UserId,
};

use crate::ports::{GroupRoster, SplitFilter, SplitStore, SplitTransaction};

#[derive(Debug, Default)]
struct MemoryState {
    expenses: HashMap<ExpenseId, Expense>,
    /// Ordered by id, i.e. by creation time.
    splits: BTreeMap<SplitId, Split>,
    splits_by_expense: HashMap<ExpenseId, Vec<SplitId>>,
    groups: HashMap<GroupId, Vec<UserId>>,
}

impl MemoryState {
    fn open_splits<'a>(
        &'a self,
        filter: &'a SplitFilter,
        exclude: &'a BTreeSet<SplitId>,
    ) -> impl Iterator<Item = OpenSplit> + 'a {
        self.splits
            .values()
            .filter(move |split| !split.paid && !exclude.contains(&split.id))
            .filter_map(move |split| {
                let expense = self.expenses.get(&split.expense_id)?;
                filter.matches(split, expense).then(|| OpenSplit {
                    split: split.clone(),
                    payer_id: expense.payer_id,
                    group_id: expense.group_id,
                })
            })
    }
}

/// Thread-safe in-memory expense, split and group store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| LedgerError::Store("memory store lock poisoned".to_string()))
    }

    /// Insert or replace an expense. Stands in for the expense CRUD service.
    pub fn insert_expense(&self, expense: Expense) -> Result<ExpenseId> {
        let id = expense.id;
        self.lock()?.expenses.insert(id, expense);
        Ok(id)
    }

    /// Register a group with its roster. Stands in for the group service.
    pub fn insert_group(&self, group_id: GroupId, members: Vec<UserId>) -> Result<()> {
        self.lock()?.groups.insert(group_id, members);
        Ok(())
    }

    /// Look up a single split row, paid or not.
    pub fn split(&self, id: SplitId) -> Result<Split> {
        self.lock()?
            .splits
            .get(&id)
            .cloned()
            .ok_or(LedgerError::SplitNotFound(id))
    }
}

impl SplitStore for MemoryStore {
    fn expense(&self, id: ExpenseId) -> Result<Expense> {
        self.lock()?
            .expenses
            .get(&id)
            .cloned()
            .ok_or(LedgerError::ExpenseNotFound(id))
    }

    fn create_splits(&self, expense_id: ExpenseId, splits: Vec<Split>) -> Result<Vec<Split>> {
        let mut state = self.lock()?;
        if !state.expenses.contains_key(&expense_id) {
            return Err(LedgerError::ExpenseNotFound(expense_id));
        }
        if state
            .splits_by_expense
            .get(&expense_id)
            .is_some_and(|ids| !ids.is_empty())
        {
            return Err(LedgerError::AlreadySplit(expense_id));
        }
        if let Some(stray) = splits.iter().find(|s| s.expense_id != expense_id) {
            return Err(LedgerError::Store(format!(
                "split {} belongs to {}, not {expense_id}",
                stray.id, stray.expense_id
            )));
        }

        let ids: Vec<SplitId> = splits.iter().map(|s| s.id).collect();
        for split in &splits {
            state.splits.insert(split.id, split.clone());
        }
        state.splits_by_expense.insert(expense_id, ids);

        tracing::debug!(%expense_id, count = splits.len(), "stored splits");
        Ok(splits)
    }

    fn splits_for_expense(&self, expense_id: ExpenseId) -> Result<Vec<Split>> {
        let state = self.lock()?;
        let mut splits: Vec<Split> = state
            .splits_by_expense
            .get(&expense_id)
            .into_iter()
            .flatten()
            .filter_map(|id| state.splits.get(id).cloned())
            .collect();
        splits.sort_by_key(|s| s.id);
        Ok(splits)
    }

    fn unpaid_splits(&self, filter: &SplitFilter) -> Result<Vec<OpenSplit>> {
        let state = self.lock()?;
        let none = BTreeSet::new();
        Ok(state.open_splits(filter, &none).collect())
    }

    fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn SplitTransaction) -> Result<T>,
    {
        let mut state = self.lock()?;
        let mut tx = MemoryTransaction {
            state: &*state,
            staged: BTreeSet::new(),
        };
        let out = f(&mut tx)?;
        let MemoryTransaction { staged, .. } = tx;

        for id in &staged {
            if let Some(split) = state.splits.get_mut(id) {
                split.paid = true;
            }
        }
        if !staged.is_empty() {
            tracing::debug!(marked_paid = staged.len(), "committed store transaction");
        }
        Ok(out)
    }
}

impl GroupRoster for MemoryStore {
    fn members(&self, group_id: GroupId) -> Result<Vec<UserId>> {
        self.lock()?
            .groups
            .get(&group_id)
            .cloned()
            .ok_or(LedgerError::GroupNotFound(group_id))
    }
}

/// A transaction over a locked [`MemoryState`].
struct MemoryTransaction<'a> {
    state: &'a MemoryState,
    staged: BTreeSet<SplitId>,
}

impl SplitTransaction for MemoryTransaction<'_> {
    fn unpaid_splits(&self, filter: &SplitFilter) -> Result<Vec<OpenSplit>> {
        Ok(self.state.open_splits(filter, &self.staged).collect())
    }

    fn mark_paid(&mut self, split_ids: &[SplitId]) -> Result<()> {
        let mut batch = BTreeSet::new();
        for id in split_ids {
            let split = self
                .state
                .splits
                .get(id)
                .ok_or(LedgerError::SplitNotFound(*id))?;
            if split.paid || self.staged.contains(id) || !batch.insert(*id) {
                return Err(LedgerError::SplitAlreadyPaid(*id));
            }
        }
        self.staged.extend(batch);
        Ok(())
    }
}
