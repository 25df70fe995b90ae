//! Engine configuration.
//!
//! Loaded from JSON; every field has a default so a partial file (or `{}`)
//! is valid.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{LedgerError, Result, constants};

/// Where the indivisible remainder of an EQUAL split goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// The whole remainder goes to the first participant in input order.
    #[default]
    FirstParticipant,
    /// One minimal currency unit each to the first `k` participants.
    RoundRobin,
}

/// How the executor matches a settlement leg against split rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Settle the oldest single row whose amount equals the leg exactly.
    #[default]
    ExactRow,
    /// Settle the oldest rows whose amounts add up to the leg exactly.
    ExactCover,
}

/// Configuration for a settlement engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Decimal places of the smallest currency unit (2 = cents).
    pub currency_scale: u32,
    /// Allowed deviation of percentage totals from 100.
    pub percentage_tolerance: Decimal,
    pub remainder_policy: RemainderPolicy,
    pub match_policy: MatchPolicy,
    /// Bounded size of the settlement idempotency cache.
    pub idempotency_cache_size: usize,
    /// Reject group balance reports whose members do not sum to zero.
    pub enforce_group_conservation: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            currency_scale: constants::DEFAULT_CURRENCY_SCALE,
            percentage_tolerance: Decimal::new(
                constants::DEFAULT_PERCENTAGE_TOLERANCE_BP,
                constants::PERCENTAGE_TOLERANCE_SCALE,
            ),
            remainder_policy: RemainderPolicy::default(),
            match_policy: MatchPolicy::default(),
            idempotency_cache_size: constants::DEFAULT_IDEMPOTENCY_CACHE_SIZE,
            enforce_group_conservation: true,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.currency_scale > constants::MAX_CURRENCY_SCALE {
            return Err(LedgerError::Configuration(format!(
                "currency_scale {} exceeds maximum {}",
                self.currency_scale,
                constants::MAX_CURRENCY_SCALE
            )));
        }
        if self.percentage_tolerance.is_sign_negative()
            || self.percentage_tolerance >= Decimal::ONE_HUNDRED
        {
            return Err(LedgerError::Configuration(format!(
                "percentage_tolerance {} must be in [0, 100)",
                self.percentage_tolerance
            )));
        }
        if self.idempotency_cache_size == 0 {
            return Err(LedgerError::Configuration(
                "idempotency_cache_size must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// The smallest representable currency amount, e.g. 0.01 for scale 2.
    #[must_use]
    pub fn minimal_unit(&self) -> Decimal {
        Decimal::new(1, self.currency_scale)
    }
}
