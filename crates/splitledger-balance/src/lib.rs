//! # splitledger-balance
//!
//! Net balances derived from unpaid splits.
//!
//! - [`BalanceAggregator::pairwise_balance`]: what two users owe each other
//! - [`BalanceAggregator::group_balances`]: every roster member's net position
//! - [`BalanceAggregator::balances_for_user`]: one user against everyone
//!
//! Group reports check the conservation invariant (members sum to zero)
//! through [`conservation::verify_closed_group`].

pub mod aggregator;
pub mod conservation;

pub use aggregator::BalanceAggregator;
pub use conservation::{BalanceSheet, verify_closed_group};
