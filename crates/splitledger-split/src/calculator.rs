//! Split calculator: turns an expense total and a participant list into
//! per-user shares.
//!
//! ```text
//! compute(total, split_type, participants) -> Vec<ComputedShare>
//! ```
//!
//! The calculator is pure and deterministic: same inputs, same shares, in
//! participant input order. It fails instead of truncating; every accepted
//! EQUAL or AMOUNT result sums to the total exactly.

use std::collections::HashSet;

use rust_decimal::{Decimal, RoundingStrategy};
use splitledger_types::{
    ComputedShare, EngineConfig, LedgerError, Participant, RemainderPolicy, Result, SplitType,
    checked_sum,
};

/// Stateless split calculator configured with a currency precision.
#[derive(Debug, Clone)]
pub struct SplitCalculator {
    currency_scale: u32,
    percentage_tolerance: Decimal,
    remainder_policy: RemainderPolicy,
}

impl SplitCalculator {
    /// Create a calculator from engine configuration.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            currency_scale: config.currency_scale,
            percentage_tolerance: config.percentage_tolerance,
            remainder_policy: config.remainder_policy,
        }
    }

    /// Smallest currency amount at the configured scale.
    #[must_use]
    pub fn minimal_unit(&self) -> Decimal {
        Decimal::new(1, self.currency_scale)
    }

    /// Compute the shares of `total` for `participants` under `split_type`.
    ///
    /// # Errors
    /// - `NoParticipants` for an empty participant list
    /// - `NonPositiveTotal` if `total <= 0`
    /// - `DuplicateParticipant` if a user appears twice
    /// - policy-specific validation errors (see the per-policy functions)
    pub fn compute(
        &self,
        total: Decimal,
        split_type: SplitType,
        participants: &[Participant],
    ) -> Result<Vec<ComputedShare>> {
        if participants.is_empty() {
            return Err(LedgerError::NoParticipants);
        }
        if total <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveTotal(total));
        }
        ensure_distinct(participants)?;

        let shares = match split_type {
            SplitType::Equal => self.split_equal(total, participants)?,
            SplitType::Amount => split_by_amount(total, participants)?,
            SplitType::Percentage => self.split_by_percentage(total, participants)?,
        };

        tracing::debug!(
            %split_type,
            %total,
            participants = shares.len(),
            "computed split shares"
        );
        Ok(shares)
    }

    /// EQUAL: `total / n` truncated to the currency scale, remainder placed
    /// according to the remainder policy.
    fn split_equal(&self, total: Decimal, participants: &[Participant]) -> Result<Vec<ComputedShare>> {
        if total.normalize().scale() > self.currency_scale {
            return Err(LedgerError::TotalPrecision {
                total,
                scale: self.currency_scale,
            });
        }

        let count = Decimal::from(participants.len());
        let base = (total / count).round_dp_with_strategy(self.currency_scale, RoundingStrategy::ToZero);
        let remainder = total - base * count;

        let mut shares: Vec<ComputedShare> = participants
            .iter()
            .map(|p| ComputedShare {
                user_id: p.user_id,
                amount: base,
                percentage: None,
            })
            .collect();

        match self.remainder_policy {
            RemainderPolicy::FirstParticipant => {
                // Non-empty: checked by `compute`.
                if let Some(first) = shares.first_mut() {
                    first.amount += remainder;
                }
            }
            RemainderPolicy::RoundRobin => {
                // remainder < n minimal units, so one pass always suffices
                let unit = self.minimal_unit();
                let mut left = remainder;
                for share in &mut shares {
                    if left <= Decimal::ZERO {
                        break;
                    }
                    share.amount += unit;
                    left -= unit;
                }
            }
        }

        Ok(shares)
    }

    /// PERCENTAGE: `total * pct / 100` per participant, percentages summing
    /// to 100 within the configured tolerance.
    fn split_by_percentage(
        &self,
        total: Decimal,
        participants: &[Participant],
    ) -> Result<Vec<ComputedShare>> {
        let mut percentages = Vec::with_capacity(participants.len());
        for p in participants {
            let pct = p.percentage.ok_or(LedgerError::MissingShare {
                user_id: p.user_id,
                field: "percentage",
            })?;
            if pct <= Decimal::ZERO {
                return Err(LedgerError::NonPositiveShare {
                    user_id: p.user_id,
                    field: "percentage",
                    value: pct,
                });
            }
            percentages.push(pct);
        }

        let pct_total = checked_sum(percentages.iter().copied(), "split percentages")?;
        if (pct_total - Decimal::ONE_HUNDRED).abs() > self.percentage_tolerance {
            return Err(LedgerError::PercentageMismatch { actual: pct_total });
        }

        // Exact shares; within tolerance they may total slightly off `total`.
        let mut shares = Vec::with_capacity(participants.len());
        for (p, pct) in participants.iter().zip(percentages) {
            let amount = total
                .checked_mul(pct)
                .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
                .ok_or(LedgerError::AmountOverflow {
                    context: "percentage share",
                })?;
            shares.push(ComputedShare {
                user_id: p.user_id,
                amount,
                percentage: Some(pct),
            });
        }

        Ok(shares)
    }
}

impl Default for SplitCalculator {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

/// AMOUNT: shares are the supplied amounts verbatim; they must add up to
/// the total exactly.
fn split_by_amount(total: Decimal, participants: &[Participant]) -> Result<Vec<ComputedShare>> {
    let mut shares = Vec::with_capacity(participants.len());
    for p in participants {
        let amount = p.amount.ok_or(LedgerError::MissingShare {
            user_id: p.user_id,
            field: "amount",
        })?;
        if amount <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveShare {
                user_id: p.user_id,
                field: "amount",
                value: amount,
            });
        }
        shares.push(ComputedShare {
            user_id: p.user_id,
            amount,
            percentage: None,
        });
    }

    let specified = checked_sum(shares.iter().map(|s| s.amount), "split amounts")?;
    if specified != total {
        return Err(LedgerError::AmountMismatch {
            specified,
            expected: total,
        });
    }
    Ok(shares)
}

fn ensure_distinct(participants: &[Participant]) -> Result<()> {
    let mut seen = HashSet::with_capacity(participants.len());
    for p in participants {
        if !seen.insert(p.user_id) {
            return Err(LedgerError::DuplicateParticipant(p.user_id));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use splitledger_types::UserId;

    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn users(n: u128) -> Vec<UserId> {
        (1..=n).map(UserId::from_u128).collect()
    }

    fn equal_participants(n: u128) -> Vec<Participant> {
        users(n).into_iter().map(Participant::equal).collect()
    }

    fn sum(shares: &[ComputedShare]) -> Decimal {
        shares.iter().map(|s| s.amount).sum()
    }

    #[test]
    fn no_participants_rejected_for_every_policy() {
        let calc = SplitCalculator::default();
        for split_type in [SplitType::Equal, SplitType::Amount, SplitType::Percentage] {
            let err = calc.compute(dec(10), split_type, &[]).unwrap_err();
            assert!(matches!(err, LedgerError::NoParticipants), "{split_type}: {err}");
        }
    }

    #[test]
    fn non_positive_total_rejected() {
        let calc = SplitCalculator::default();
        let err = calc
            .compute(Decimal::ZERO, SplitType::Equal, &equal_participants(2))
            .unwrap_err();
        assert!(matches!(err, LedgerError::NonPositiveTotal(_)));
    }

    #[test]
    fn duplicate_participant_rejected() {
        let calc = SplitCalculator::default();
        let user = UserId::from_u128(1);
        let err = calc
            .compute(
                dec(10),
                SplitType::Equal,
                &[Participant::equal(user), Participant::equal(user)],
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateParticipant(u) if u == user));
    }

    #[test]
    fn equal_exact_division() {
        let calc = SplitCalculator::default();
        let shares = calc
            .compute(dec(90), SplitType::Equal, &equal_participants(3))
            .unwrap();
        assert!(shares.iter().all(|s| s.amount == dec(30)));
        assert!(shares.iter().all(|s| s.percentage.is_none()));
    }

    #[test]
    fn equal_remainder_goes_to_first_participant() {
        let calc = SplitCalculator::default();
        let shares = calc
            .compute(dec(100), SplitType::Equal, &equal_participants(3))
            .unwrap();
        assert_eq!(shares[0].amount, Decimal::new(3334, 2));
        assert_eq!(shares[1].amount, Decimal::new(3333, 2));
        assert_eq!(shares[2].amount, Decimal::new(3333, 2));
        assert_eq!(sum(&shares), dec(100));
    }

    #[test]
    fn equal_round_robin_spreads_units() {
        let config = EngineConfig {
            remainder_policy: RemainderPolicy::RoundRobin,
            ..EngineConfig::default()
        };
        let calc = SplitCalculator::new(&config);
        // 0.05 / 3 -> 0.01 each, remainder 0.02 -> first two get one cent
        let shares = calc
            .compute(Decimal::new(5, 2), SplitType::Equal, &equal_participants(3))
            .unwrap();
        let amounts: Vec<Decimal> = shares.iter().map(|s| s.amount).collect();
        assert_eq!(
            amounts,
            vec![Decimal::new(2, 2), Decimal::new(2, 2), Decimal::new(1, 2)]
        );
    }

    #[test]
    fn equal_rejects_sub_unit_total() {
        let calc = SplitCalculator::default();
        let err = calc
            .compute(Decimal::new(1001, 3), SplitType::Equal, &equal_participants(2))
            .unwrap_err();
        assert!(matches!(err, LedgerError::TotalPrecision { scale: 2, .. }));
    }

    #[test]
    fn equal_accepts_trailing_zeros_beyond_scale() {
        let calc = SplitCalculator::default();
        // 10.000 normalizes to 10
        let shares = calc
            .compute(Decimal::new(10_000, 3), SplitType::Equal, &equal_participants(4))
            .unwrap();
        assert_eq!(sum(&shares), dec(10));
    }

    #[test]
    fn equal_sum_is_exact_for_random_inputs() {
        let calc = SplitCalculator::default();
        let mut rng = StdRng::seed_from_u64(0x5EED);
        for _ in 0..500 {
            let cents: i64 = rng.gen_range(1..=10_000_000);
            let n: u128 = rng.gen_range(1..=17);
            let total = Decimal::new(cents, 2);
            let shares = calc
                .compute(total, SplitType::Equal, &equal_participants(n))
                .unwrap();
            assert_eq!(sum(&shares), total, "total {total} over {n}");
            assert!(shares.iter().all(|s| s.amount.scale() <= 2));
        }
    }

    #[test]
    fn amount_split_verbatim() {
        let calc = SplitCalculator::default();
        let u = users(2);
        let participants = vec![
            Participant::with_amount(u[0], Decimal::new(10_050, 2)),
            Participant::with_amount(u[1], Decimal::new(4_950, 2)),
        ];
        let shares = calc.compute(dec(150), SplitType::Amount, &participants).unwrap();
        assert_eq!(shares[0].amount, Decimal::new(10_050, 2));
        assert_eq!(shares[1].amount, Decimal::new(4_950, 2));
    }

    #[test]
    fn amount_mismatch_names_both_totals() {
        let calc = SplitCalculator::default();
        let u = users(2);
        let participants = vec![
            Participant::with_amount(u[0], dec(100)),
            Participant::with_amount(u[1], dec(40)),
        ];
        let err = calc
            .compute(dec(150), SplitType::Amount, &participants)
            .unwrap_err();
        match err {
            LedgerError::AmountMismatch { specified, expected } => {
                assert_eq!(specified, dec(140));
                assert_eq!(expected, dec(150));
            }
            other => panic!("expected AmountMismatch, got {other}"),
        }
    }

    #[test]
    fn amount_missing_or_non_positive() {
        let calc = SplitCalculator::default();
        let u = users(2);
        let err = calc
            .compute(dec(10), SplitType::Amount, &[Participant::equal(u[0])])
            .unwrap_err();
        assert!(matches!(err, LedgerError::MissingShare { field: "amount", .. }));

        let err = calc
            .compute(
                dec(10),
                SplitType::Amount,
                &[
                    Participant::with_amount(u[0], dec(15)),
                    Participant::with_amount(u[1], dec(-5)),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::NonPositiveShare { .. }));
    }

    #[test]
    fn amount_rejected_iff_sum_differs() {
        let calc = SplitCalculator::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..300 {
            let n: u128 = rng.gen_range(1..=6);
            let amounts: Vec<Decimal> = (0..n)
                .map(|_| Decimal::new(rng.gen_range(1..=50_000), 2))
                .collect();
            let actual: Decimal = amounts.iter().copied().sum();
            let offset = Decimal::new(rng.gen_range(-3..=3), 2);
            let total = actual + offset;
            if total <= Decimal::ZERO {
                continue;
            }
            let participants: Vec<Participant> = users(n)
                .into_iter()
                .zip(amounts.iter().copied())
                .map(|(u, a)| Participant::with_amount(u, a))
                .collect();
            let result = calc.compute(total, SplitType::Amount, &participants);
            if offset.is_zero() {
                let shares = result.unwrap();
                let got: Vec<Decimal> = shares.iter().map(|s| s.amount).collect();
                assert_eq!(got, amounts);
            } else {
                assert!(matches!(result, Err(LedgerError::AmountMismatch { .. })));
            }
        }
    }

    #[test]
    fn percentage_split_attaches_percentages() {
        let calc = SplitCalculator::default();
        let u = users(3);
        let participants = vec![
            Participant::with_percentage(u[0], dec(50)),
            Participant::with_percentage(u[1], dec(30)),
            Participant::with_percentage(u[2], dec(20)),
        ];
        let shares = calc
            .compute(dec(200), SplitType::Percentage, &participants)
            .unwrap();
        assert_eq!(shares[0].amount, dec(100));
        assert_eq!(shares[1].amount, dec(60));
        assert_eq!(shares[2].amount, dec(40));
        assert_eq!(shares[1].percentage, Some(dec(30)));
        assert_eq!(sum(&shares), dec(200));
    }

    #[test]
    fn percentage_within_tolerance_accepted() {
        let calc = SplitCalculator::default();
        let u = users(3);
        // 33.33 * 3 = 99.99
        let participants: Vec<Participant> = u
            .iter()
            .map(|&id| Participant::with_percentage(id, Decimal::new(3333, 2)))
            .collect();
        let shares = calc
            .compute(dec(90), SplitType::Percentage, &participants)
            .unwrap();
        for share in &shares {
            assert_eq!(share.amount, dec(90) * Decimal::new(3333, 2) / dec(100));
        }
        assert!((sum(&shares) - dec(90)).abs() <= Decimal::new(1, 2));
    }

    #[test]
    fn percentage_outside_tolerance_cites_total() {
        let calc = SplitCalculator::default();
        let u = users(2);
        let participants = vec![
            Participant::with_percentage(u[0], dec(60)),
            Participant::with_percentage(u[1], Decimal::new(3998, 2)),
        ];
        let err = calc
            .compute(dec(100), SplitType::Percentage, &participants)
            .unwrap_err();
        match err {
            LedgerError::PercentageMismatch { actual } => assert_eq!(actual, Decimal::new(9998, 2)),
            other => panic!("expected PercentageMismatch, got {other}"),
        }
    }

    #[test]
    fn percentage_inside_tolerance_accepted_for_large_totals() {
        let calc = SplitCalculator::default();
        let u = users(2);
        // 99.99% of 1000 leaves 0.10 unallocated; still within tolerance
        let participants = vec![
            Participant::with_percentage(u[0], dec(50)),
            Participant::with_percentage(u[1], Decimal::new(4999, 2)),
        ];
        let shares = calc
            .compute(dec(1000), SplitType::Percentage, &participants)
            .unwrap();
        assert_eq!(shares[0].amount, dec(500));
        assert_eq!(shares[1].amount, Decimal::new(49990, 2));
        assert_eq!(sum(&shares), Decimal::new(99990, 2));
    }

    #[test]
    fn oversized_amounts_are_rejected_not_panicking() {
        let calc = SplitCalculator::default();
        let u = users(2);
        let huge = Decimal::MAX - Decimal::ONE;
        let participants = vec![
            Participant::with_amount(u[0], huge),
            Participant::with_amount(u[1], huge),
        ];
        let err = calc
            .compute(huge, SplitType::Amount, &participants)
            .unwrap_err();
        assert!(matches!(err, LedgerError::AmountOverflow { .. }));
        assert!(err.is_validation());

        let participants = vec![
            Participant::with_percentage(u[0], dec(50)),
            Participant::with_percentage(u[1], dec(50)),
        ];
        let err = calc
            .compute(huge, SplitType::Percentage, &participants)
            .unwrap_err();
        assert!(matches!(err, LedgerError::AmountOverflow { .. }));
    }

    #[test]
    fn percentage_missing_share() {
        let calc = SplitCalculator::default();
        let u = users(1);
        let err = calc
            .compute(dec(10), SplitType::Percentage, &[Participant::with_amount(u[0], dec(10))])
            .unwrap_err();
        assert!(matches!(err, LedgerError::MissingShare { field: "percentage", .. }));
    }

    #[test]
    fn deterministic_output() {
        let calc = SplitCalculator::default();
        let participants = equal_participants(7);
        let a = calc.compute(Decimal::new(100_001, 2), SplitType::Equal, &participants).unwrap();
        let b = calc.compute(Decimal::new(100_001, 2), SplitType::Equal, &participants).unwrap();
        assert_eq!(a, b);
    }
}
