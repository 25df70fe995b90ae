//! # splitledger-engine
//!
//! The **SplitLedger** settlement engine behind one API.
//!
//! [`SettlementEngine`] wires the components over an injected store:
//!
//! ```text
//! Expense + participants ─▶ SplitCalculator ─▶ SplitStore (splits)
//!                                                   │
//!      SettlementExecutor ◀─ SettlementPlan ◀─ BalanceAggregator
//!             │
//!             └─▶ paid flags in SplitStore
//! ```
//!
//! - **Splitting**: [`SettlementEngine::compute_splits`], [`SettlementEngine::split_expense`]
//! - **Balances**: [`SettlementEngine::pairwise_balance`], [`SettlementEngine::group_balances`],
//!   [`SettlementEngine::balances_for_user`]
//! - **Netting**: [`SettlementEngine::optimize_settlement`], [`SettlementEngine::plan_group_settlement`]
//! - **Execution**: [`SettlementEngine::execute_settlement`],
//!   [`SettlementEngine::execute_settlement_idempotent`], [`SettlementEngine::execute_plan`],
//!   [`SettlementEngine::settle_pairwise_debt`]
//!
//! Call [`telemetry::init_tracing`] once per process to see the engine's logs.

pub mod telemetry;

use std::sync::Arc;

use rust_decimal::Decimal;
use splitledger_balance::BalanceAggregator;
use splitledger_settlement::{SettlementExecutor, optimize_settlement};
use splitledger_split::SplitCalculator;
use splitledger_store::{GroupRoster, SplitStore};
use splitledger_types::{
    ComputedShare, EngineConfig, ExecutionSummary, ExpenseId, GroupId, IdempotencyKey, LedgerError,
    NetBalance, PairwiseBalance, Participant, Result, SettlementPlan, SettlementTransaction, Split,
    SplitType, UserId,
};

/// Settlement engine over a store `S`.
pub struct SettlementEngine<S> {
    store: Arc<S>,
    config: EngineConfig,
    calculator: SplitCalculator,
    aggregator: BalanceAggregator<S>,
    executor: SettlementExecutor<S>,
}

impl<S> SettlementEngine<S>
where
    S: SplitStore + GroupRoster,
{
    /// Build an engine; the configuration is validated first.
    ///
    /// # Errors
    /// `Configuration` if a config value is out of range.
    pub fn new(store: Arc<S>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            engine = splitledger_types::constants::ENGINE_NAME,
            version = splitledger_types::constants::VERSION,
            currency_scale = config.currency_scale,
            match_policy = ?config.match_policy,
            "settlement engine ready"
        );
        Ok(Self {
            calculator: SplitCalculator::new(&config),
            aggregator: BalanceAggregator::new(Arc::clone(&store), &config),
            executor: SettlementExecutor::new(Arc::clone(&store), &config),
            store,
            config,
        })
    }

    /// Engine with [`EngineConfig::default`].
    pub fn with_defaults(store: Arc<S>) -> Result<Self> {
        Self::new(store, EngineConfig::default())
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // -- Splitting --

    /// Shares of `total` under `split_type`. Pure; nothing is stored.
    pub fn compute_splits(
        &self,
        total: Decimal,
        split_type: SplitType,
        participants: &[Participant],
    ) -> Result<Vec<ComputedShare>> {
        self.calculator.compute(total, split_type, participants)
    }

    /// Compute the splits of a stored expense and persist them atomically.
    ///
    /// For a group expense every participant must be on the group roster.
    ///
    /// # Errors
    /// - `ExpenseNotFound` / `GroupNotFound`
    /// - `NotGroupMember` for a participant outside the expense's group
    /// - calculator validation errors
    /// - `AlreadySplit` if the expense already has splits
    pub fn split_expense(
        &self,
        expense_id: ExpenseId,
        split_type: SplitType,
        participants: &[Participant],
    ) -> Result<Vec<Split>> {
        let expense = self.store.expense(expense_id)?;

        if let Some(group_id) = expense.group_id {
            let members = self.store.members(group_id)?;
            if let Some(outsider) = participants.iter().find(|p| !members.contains(&p.user_id)) {
                return Err(LedgerError::NotGroupMember {
                    user_id: outsider.user_id,
                    group_id,
                });
            }
        }

        let shares = self.calculator.compute(expense.amount, split_type, participants)?;
        let splits = shares
            .iter()
            .map(|share| Split::from_share(expense_id, split_type, share))
            .collect();
        let stored = self.store.create_splits(expense_id, splits)?;

        tracing::info!(
            %expense_id,
            %split_type,
            total = %expense.amount,
            splits = stored.len(),
            "expense split"
        );
        Ok(stored)
    }

    // -- Balances --

    /// Net position between two users; `net > 0` means `user_b` owes `user_a`.
    pub fn pairwise_balance(&self, user_a: UserId, user_b: UserId) -> Result<PairwiseBalance> {
        self.aggregator.pairwise_balance(user_a, user_b)
    }

    /// Net balance of every member of a group, in roster order.
    pub fn group_balances(&self, group_id: GroupId) -> Result<Vec<NetBalance>> {
        self.aggregator.group_balances(group_id)
    }

    /// `user` against each counterparty with unpaid splits.
    pub fn balances_for_user(&self, user: UserId) -> Result<Vec<PairwiseBalance>> {
        self.aggregator.balances_for_user(user)
    }

    // -- Netting --

    /// Greedy settlement plan for arbitrary net balances.
    #[allow(clippy::unused_self)]
    pub fn optimize_settlement(&self, balances: &[NetBalance]) -> Result<SettlementPlan> {
        optimize_settlement(balances)
    }

    /// Settlement plan for a group's current balances.
    pub fn plan_group_settlement(&self, group_id: GroupId) -> Result<SettlementPlan> {
        let balances = self.aggregator.group_balances(group_id)?;
        optimize_settlement(&balances)
    }

    // -- Execution --

    /// Mark splits paid for each leg. See [`SettlementExecutor::execute`].
    pub fn execute_settlement(&self, transactions: &[SettlementTransaction]) -> Result<ExecutionSummary> {
        self.executor.execute(transactions)
    }

    /// Execute at most once per `key`. A retry replays the first summary,
    /// or resumes after the legs committed before a failure.
    pub fn execute_settlement_idempotent(
        &self,
        key: IdempotencyKey,
        transactions: &[SettlementTransaction],
    ) -> Result<ExecutionSummary> {
        self.executor.execute_idempotent(key, transactions)
    }

    /// Execute a plan from [`plan_group_settlement`](Self::plan_group_settlement)
    /// under `key`, after checking its digest against its legs.
    pub fn execute_plan(&self, key: IdempotencyKey, plan: &SettlementPlan) -> Result<ExecutionSummary> {
        self.executor.execute_plan(key, plan)
    }

    /// Settle what `payer` owes `payee`: one exact amount, or everything
    /// when `amount` is `None`.
    pub fn settle_pairwise_debt(
        &self,
        payer: UserId,
        payee: UserId,
        amount: Option<Decimal>,
    ) -> Result<ExecutionSummary> {
        self.executor.settle_pairwise(payer, payee, amount)
    }
}
