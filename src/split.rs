use crate::decimal::Money;
use crate::errors::{BnplError, Result};

/// Split a total amount into `count` cent-exact installment amounts.
///
/// The total is converted to minor units, divided evenly, and the remainder
/// is distributed one cent at a time to the first installments. The returned
/// amounts always sum back to the total exactly; the distribution is
/// deterministic and left-loaded.
pub fn split_evenly(total: Money, count: u32) -> Result<Vec<Money>> {
    if count == 0 || !total.is_positive() {
        return Err(BnplError::RoundingInfeasible { total, count });
    }

    let total_cents = total
        .to_cents()
        .ok_or(BnplError::RoundingInfeasible { total, count })?;

    let n = i64::from(count);
    let base_cents = total_cents / n;
    let remainder = total_cents % n;

    // base of zero means at least one installment would get no money
    if base_cents <= 0 {
        return Err(BnplError::RoundingInfeasible { total, count });
    }

    let mut amounts = Vec::with_capacity(count as usize);
    for seq in 1..=n {
        let cents = base_cents + i64::from(seq <= remainder);
        amounts.push(Money::from_cents(cents));
    }

    Ok(amounts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum(amounts: &[Money]) -> Money {
        amounts.iter().fold(Money::ZERO, |acc, &x| acc + x)
    }

    #[test]
    fn test_extra_cents_go_to_first_installments() {
        let amounts = split_evenly(Money::from_major(100), 3).unwrap();
        assert_eq!(
            amounts,
            vec![
                Money::from_cents(3334),
                Money::from_cents(3333),
                Money::from_cents(3333),
            ]
        );
        assert_eq!(sum(&amounts), Money::from_major(100));
    }

    #[test]
    fn test_even_split_has_no_remainder() {
        let amounts = split_evenly(Money::from_major(1000), 4).unwrap();
        assert_eq!(amounts, vec![Money::from_major(250); 4]);
    }

    #[test]
    fn test_sum_exactness_across_awkward_totals() {
        for (total, count) in [("0.07", 3u32), ("99.99", 7), ("1234.56", 13), ("0.03", 2)] {
            let total = Money::from_str_exact(total).unwrap();
            let amounts = split_evenly(total, count).unwrap();
            assert_eq!(amounts.len(), count as usize);
            assert_eq!(sum(&amounts), total, "drift splitting {total} by {count}");
            assert!(amounts.iter().all(|a| a.is_positive()));
            // left-loaded: amounts never increase along the sequence
            for pair in amounts.windows(2) {
                assert!(pair[0] >= pair[1]);
            }
        }
    }

    #[test]
    fn test_count_larger_than_cents_is_infeasible() {
        let err = split_evenly(Money::from_major(1), 101).unwrap_err();
        assert!(matches!(err, BnplError::RoundingInfeasible { count: 101, .. }));
    }

    #[test]
    fn test_zero_count_and_nonpositive_total_rejected() {
        assert!(split_evenly(Money::from_major(100), 0).is_err());
        assert!(split_evenly(Money::ZERO, 3).is_err());
        assert!(split_evenly(Money::from_cents(-100), 3).is_err());
    }

    #[test]
    fn test_one_installment_gets_everything() {
        let total = Money::from_str_exact("42.01").unwrap();
        assert_eq!(split_evenly(total, 1).unwrap(), vec![total]);
    }
}
