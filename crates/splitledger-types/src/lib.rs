//! # splitledger-types
//!
//! Shared types, errors, and configuration for the **SplitLedger** settlement
//! engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`UserId`], [`GroupId`], [`ExpenseId`], [`SplitId`], [`IdempotencyKey`]
//! - **Expense model**: [`Expense`]
//! - **Split model**: [`Split`], [`SplitType`], [`Participant`], [`ComputedShare`], [`OpenSplit`]
//! - **Balance model**: [`NetBalance`], [`PairwiseBalance`]
//! - **Settlement model**: [`SettlementTransaction`], [`SettlementPlan`], [`ExecutionSummary`]
//! - **Configuration**: [`EngineConfig`], [`RemainderPolicy`], [`MatchPolicy`]
//! - **Errors**: [`LedgerError`] with `SL_ERR_` prefix codes, [`ErrorKind`]
//! - **Constants**: defaults and limits
//!
//! Every monetary value is a [`rust_decimal::Decimal`]. Floats never appear.

pub mod balance;
pub mod config;
pub mod constants;
pub mod error;
pub mod expense;
pub mod ids;
pub mod settlement;
pub mod split;

pub use balance::*;
pub use config::*;
pub use error::*;
pub use expense::*;
pub use ids::*;
pub use settlement::*;
pub use split::*;

// Constants are accessed via `splitledger_types::constants::FOO`
// (not re-exported to avoid name collisions).
