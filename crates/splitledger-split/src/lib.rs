//! # splitledger-split
//!
//! **Pure split calculator for SplitLedger.**
//!
//! Given an expense total and a participant list, produces one share per
//! participant under one of three policies:
//!
//! - **EQUAL**: even division, remainder in minimal currency units placed
//!   deterministically
//! - **AMOUNT**: explicit amounts that must add up to the total exactly
//! - **PERCENTAGE**: percentages summing to 100 (within tolerance)
//!
//! No I/O and no store access. Persisting the shares is the caller's job.

pub mod calculator;

pub use calculator::SplitCalculator;
