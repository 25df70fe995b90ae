//! Settlement plan digests.
//!
//! The optimizer is deterministic, so the same balances always produce the
//! same legs and the same digest. The executor's idempotency guard uses the
//! digest to tell a genuine retry from a reused key with a different
//! payload.

use sha2::{Digest, Sha256};
use splitledger_types::{SettlementPlan, SettlementTransaction};

/// Hex-encoded SHA-256 over the ordered legs.
///
/// Amounts are normalized first so `30` and `30.00` hash alike.
#[must_use]
pub fn plan_digest(transactions: &[SettlementTransaction]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"splitledger:plan:v1:");
    hasher.update((transactions.len() as u64).to_le_bytes());

    for leg in transactions {
        hasher.update(leg.from.0.as_bytes());
        hasher.update(leg.to.0.as_bytes());
        hasher.update(leg.amount.normalize().to_string().as_bytes());
        hasher.update(b";");
    }

    hex::encode(hasher.finalize())
}

/// Whether a plan's stored digest matches its legs.
#[must_use]
pub fn verify_plan_digest(plan: &SettlementPlan) -> bool {
    plan_digest(&plan.transactions) == plan.digest
}
