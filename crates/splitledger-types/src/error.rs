//! Error types for the SplitLedger settlement engine.
//!
//! All errors use the `SL_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by category:
//! - 1xx: Validation errors (malformed split or settlement requests)
//! - 2xx: Not found (referenced expense, group or split absent)
//! - 3xx: Conflict (state transition already taken)
//! - 4xx: Integrity (stored data violates a balance invariant)
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ExpenseId, GroupId, IdempotencyKey, SplitId, UserId};

/// Coarse error category, used by the transport layer to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Integrity,
    Internal,
}

/// Central error enum for all SplitLedger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// A split request carried no participants.
    #[error("SL_ERR_100: Invalid split: no participants")]
    NoParticipants,

    /// The expense total is zero or negative.
    #[error("SL_ERR_101: Invalid split: total amount must be positive, got {0}")]
    NonPositiveTotal(Decimal),

    /// The expense total has more decimal places than the currency allows.
    #[error("SL_ERR_102: Invalid split: total {total} exceeds currency scale {scale}")]
    TotalPrecision { total: Decimal, scale: u32 },

    /// The same user appears twice in one split request.
    #[error("SL_ERR_103: Invalid split: duplicate participant {0}")]
    DuplicateParticipant(UserId),

    /// A participant omitted the amount or percentage its policy requires.
    #[error("SL_ERR_104: Invalid split: participant {user_id} is missing its {field}")]
    MissingShare { user_id: UserId, field: &'static str },

    /// A participant supplied a zero or negative amount or percentage.
    #[error("SL_ERR_105: Invalid split: participant {user_id} has non-positive {field} {value}")]
    NonPositiveShare {
        user_id: UserId,
        field: &'static str,
        value: Decimal,
    },

    /// AMOUNT split whose amounts do not add up to the expense total.
    #[error("SL_ERR_106: Invalid split: specified amounts total {specified}, expected {expected}")]
    AmountMismatch { specified: Decimal, expected: Decimal },

    /// PERCENTAGE split whose percentages are not 100 within tolerance.
    #[error("SL_ERR_107: Invalid split: percentages total {actual}, expected 100")]
    PercentageMismatch { actual: Decimal },

    /// Caller-supplied amounts too large for exact decimal arithmetic.
    #[error("SL_ERR_108: Invalid amount: {context} overflows decimal range")]
    AmountOverflow { context: &'static str },

    /// A user attempted to settle a debt with themselves.
    #[error("SL_ERR_109: Invalid settlement: payer and payee are the same user {0}")]
    SelfSettlement(UserId),

    /// A pairwise balance was requested for a user against themselves.
    #[error("SL_ERR_110: Invalid balance query: both sides are user {0}")]
    SelfBalance(UserId),

    /// A split participant is not on the expense group's roster.
    #[error("SL_ERR_111: Invalid split: user {user_id} is not a member of {group_id}")]
    NotGroupMember { user_id: UserId, group_id: GroupId },

    /// A settlement leg or balance list is malformed.
    #[error("SL_ERR_112: Invalid settlement: {reason}")]
    InvalidTransaction { reason: String },

    // =================================================================
    // Not Found (2xx)
    // =================================================================
    #[error("SL_ERR_200: Expense not found: {0}")]
    ExpenseNotFound(ExpenseId),

    #[error("SL_ERR_201: Group not found: {0}")]
    GroupNotFound(GroupId),

    #[error("SL_ERR_202: Split not found: {0}")]
    SplitNotFound(SplitId),

    // =================================================================
    // Conflict (3xx)
    // =================================================================
    /// Splits already exist for this expense; splitting is a one-way transition.
    #[error("SL_ERR_300: Expense already split: {0}")]
    AlreadySplit(ExpenseId),

    /// The split was already marked paid (double-settlement guard).
    #[error("SL_ERR_301: Split already paid: {0}")]
    SplitAlreadyPaid(SplitId),

    /// An idempotency key was replayed with a different settlement payload.
    #[error("SL_ERR_302: Idempotency key {key} reused with a different settlement")]
    IdempotencyKeyReused { key: IdempotencyKey },

    // =================================================================
    // Integrity (4xx)
    // =================================================================
    /// A closed group's net balances do not sum to zero.
    #[error("SL_ERR_400: Balance integrity violation in {group_id}: residual {residual}")]
    GroupImbalance { group_id: GroupId, residual: Decimal },

    /// Optimizer input whose credits and debits disagree.
    #[error("SL_ERR_401: Balance integrity violation: credits {credits} != debits {debits}")]
    PlanImbalance { credits: Decimal, debits: Decimal },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// The backing store failed.
    #[error("SL_ERR_900: Store error: {0}")]
    Store(String),

    /// Configuration error (invalid config file, out-of-range values, etc.).
    #[error("SL_ERR_901: Configuration error: {0}")]
    Configuration(String),

    /// Serialization / deserialization error.
    #[error("SL_ERR_902: Serialization error: {0}")]
    Serialization(String),

    /// I/O error.
    #[error("SL_ERR_903: I/O error: {0}")]
    Io(String),
}

impl LedgerError {
    /// Category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoParticipants
            | Self::NonPositiveTotal(_)
            | Self::TotalPrecision { .. }
            | Self::DuplicateParticipant(_)
            | Self::MissingShare { .. }
            | Self::NonPositiveShare { .. }
            | Self::AmountMismatch { .. }
            | Self::PercentageMismatch { .. }
            | Self::AmountOverflow { .. }
            | Self::SelfSettlement(_)
            | Self::SelfBalance(_)
            | Self::NotGroupMember { .. }
            | Self::InvalidTransaction { .. } => ErrorKind::Validation,
            Self::ExpenseNotFound(_) | Self::GroupNotFound(_) | Self::SplitNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::AlreadySplit(_)
            | Self::SplitAlreadyPaid(_)
            | Self::IdempotencyKeyReused { .. } => ErrorKind::Conflict,
            Self::GroupImbalance { .. } | Self::PlanImbalance { .. } => ErrorKind::Integrity,
            Self::Store(_) | Self::Configuration(_) | Self::Serialization(_) | Self::Io(_) => {
                ErrorKind::Internal
            }
        }
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LedgerError>;

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
