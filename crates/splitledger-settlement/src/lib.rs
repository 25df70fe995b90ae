//! # splitledger-settlement
//!
//! Debt netting and settlement execution.
//!
//! ## Pipeline
//!
//! 1. [`optimize_settlement`] turns net balances into at most `N - 1`
//!    transfers, fingerprinted by [`plan_digest`]
//! 2. [`SettlementExecutor`] marks the matching unpaid splits as paid, one
//!    store transaction per leg
//! 3. [`IdempotencyGuard`] makes retried executions safe: same key and same
//!    legs replay the recorded summary or resume an interrupted batch, same
//!    key with other legs is refused

pub mod digest;
pub mod executor;
pub mod idempotency;
pub mod optimizer;

pub use digest::{plan_digest, verify_plan_digest};
pub use executor::SettlementExecutor;
pub use idempotency::{IdempotencyGuard, Progress};
pub use optimizer::optimize_settlement;
