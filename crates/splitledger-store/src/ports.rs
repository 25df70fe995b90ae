//! Repository traits consumed by the settlement engine.
//!
//! The engine never talks to a database directly. Persistence is injected
//! through these traits; every settlement-affecting write goes through
//! [`SplitStore::atomically`].

use rust_decimal::Decimal;
use splitledger_types::{
    Expense, ExpenseId, GroupId, OpenSplit, Result, Split, SplitId, UserId,
};

/// Selection criteria for unpaid split rows. `None` fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitFilter {
    /// The ower (`split.user_id`).
    pub debtor: Option<UserId>,
    /// The owning expense's payer.
    pub payer: Option<UserId>,
    /// The owning expense's group.
    pub group: Option<GroupId>,
    /// Exact split amount.
    pub amount: Option<Decimal>,
}

impl SplitFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits `debtor` owes on expenses paid by `payer`.
    #[must_use]
    pub fn owed_by(debtor: UserId, payer: UserId) -> Self {
        Self {
            debtor: Some(debtor),
            payer: Some(payer),
            ..Self::default()
        }
    }

    /// Splits on expenses belonging to `group`.
    #[must_use]
    pub fn in_group(group: GroupId) -> Self {
        Self {
            group: Some(group),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn with_debtor(mut self, debtor: UserId) -> Self {
        self.debtor = Some(debtor);
        self
    }

    #[must_use]
    pub fn with_payer(mut self, payer: UserId) -> Self {
        self.payer = Some(payer);
        self
    }

    /// Whether a split row joined with its expense satisfies the filter.
    /// Paid status is the store's concern, not checked here.
    #[must_use]
    pub fn matches(&self, split: &Split, expense: &Expense) -> bool {
        self.debtor.is_none_or(|d| split.user_id == d)
            && self.payer.is_none_or(|p| expense.payer_id == p)
            && self.group.is_none_or(|g| expense.in_group(g))
            && self.amount.is_none_or(|a| split.amount == a)
    }
}

/// The expense/split store.
///
/// Reads outside [`atomically`](Self::atomically) may observe a settlement in
/// flight; they back advisory balance views only.
pub trait SplitStore: Send + Sync {
    /// Read one expense.
    ///
    /// # Errors
    /// `ExpenseNotFound` if the expense does not exist.
    fn expense(&self, id: ExpenseId) -> Result<Expense>;

    /// Persist every split of an expense in one atomic write.
    ///
    /// # Errors
    /// - `ExpenseNotFound` if the expense does not exist
    /// - `AlreadySplit` if the expense already has splits
    fn create_splits(&self, expense_id: ExpenseId, splits: Vec<Split>) -> Result<Vec<Split>>;

    /// All splits (paid or not) of one expense, in split id order.
    fn splits_for_expense(&self, expense_id: ExpenseId) -> Result<Vec<Split>>;

    /// Unpaid splits matching `filter`, joined with payer and group, in split
    /// id order.
    fn unpaid_splits(&self, filter: &SplitFilter) -> Result<Vec<OpenSplit>>;

    /// Run `f` inside one isolated store transaction.
    ///
    /// Writes made through the transaction commit only if `f` returns `Ok`;
    /// on `Err` every `paid` flag is left unchanged. Concurrent transactions
    /// must not both observe the same row as unpaid and mark it paid.
    fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn SplitTransaction) -> Result<T>;
}

/// Operations available inside [`SplitStore::atomically`].
pub trait SplitTransaction {
    /// Unpaid splits matching `filter`, as seen by this transaction
    /// (rows already marked paid in it are excluded).
    fn unpaid_splits(&self, filter: &SplitFilter) -> Result<Vec<OpenSplit>>;

    /// Mark the given splits paid.
    ///
    /// # Errors
    /// - `SplitNotFound` for an unknown id
    /// - `SplitAlreadyPaid` if a row is already paid (committed or staged);
    ///   nothing is staged in that case
    fn mark_paid(&mut self, split_ids: &[SplitId]) -> Result<()>;
}

/// Group roster collaborator.
pub trait GroupRoster: Send + Sync {
    /// Member user ids of a group, in roster order.
    ///
    /// # Errors
    /// `GroupNotFound` if the group does not exist.
    fn members(&self, group_id: GroupId) -> Result<Vec<UserId>>;
}
