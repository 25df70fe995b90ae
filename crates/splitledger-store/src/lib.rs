//! # splitledger-store
//!
//! Persistence seams for the settlement engine.
//!
//! - [`SplitStore`]: expense reads, one-shot split creation, unpaid-split
//!   queries and isolated transactions
//! - [`SplitTransaction`]: reads and `paid` writes inside one transaction
//! - [`GroupRoster`]: group membership reads
//! - [`MemoryStore`]: mutex-backed implementation of all of the above
//!
//! Components take the store as an injected `Arc<S>`; there is no global
//! client.

pub mod memory;
pub mod ports;

pub use memory::MemoryStore;
pub use ports::{GroupRoster, SplitFilter, SplitStore, SplitTransaction};
