//! System-wide constants for the SplitLedger settlement engine.

/// Default currency scale: amounts carry at most two decimal places (cents).
pub const DEFAULT_CURRENCY_SCALE: u32 = 2;

/// Largest currency scale accepted by configuration validation.
pub const MAX_CURRENCY_SCALE: u32 = 8;

/// Allowed deviation of a percentage split's total from 100, in
/// hundredths of a percent (0.01).
pub const DEFAULT_PERCENTAGE_TOLERANCE_BP: i64 = 1;

/// Scale of [`DEFAULT_PERCENTAGE_TOLERANCE_BP`].
pub const PERCENTAGE_TOLERANCE_SCALE: u32 = 2;

/// Number of settlement requests remembered by the idempotency guard.
pub const DEFAULT_IDEMPOTENCY_CACHE_SIZE: usize = 10_000;

/// Rows an exact-cover settlement leg considers, oldest first.
pub const MAX_COVER_CANDIDATES: usize = 20;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "SplitLedger";
