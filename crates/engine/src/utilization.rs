//! Credit utilization math.

use crate::money::round_one_decimal;

/// Unrounded share of `credit_limit_minor` currently owed, in percent.
///
/// A credit account owes money when its balance is negative; a positive
/// balance (overpayment) counts as zero utilization. Limits that are not
/// positive yield 0.
fn owed_share_pct(balance_minor: i64, credit_limit_minor: i64) -> f64 {
    if credit_limit_minor <= 0 {
        return 0.0;
    }
    let owed = balance_minor.min(0).unsigned_abs();
    owed as f64 * 100.0 / credit_limit_minor as f64
}

/// Share of the limit in use, rounded to one decimal for display.
pub fn utilization_pct(balance_minor: i64, credit_limit_minor: i64) -> f64 {
    round_one_decimal(owed_share_pct(balance_minor, credit_limit_minor))
}

/// `true` when the utilization reaches `threshold_pct`. Compares the exact
/// share, never the rounded one.
pub fn exceeds_threshold(balance_minor: i64, credit_limit_minor: i64, threshold_pct: f64) -> bool {
    owed_share_pct(balance_minor, credit_limit_minor) >= threshold_pct
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owed_balance_over_limit() {
        assert_eq!(utilization_pct(-30_000, 100_000), 30.0);
        assert_eq!(utilization_pct(-33_333, 100_000), 33.3);
        assert_eq!(utilization_pct(-150_000, 100_000), 150.0);
    }

    #[test]
    fn overpayment_and_bad_limits_are_zero() {
        assert_eq!(utilization_pct(5_000, 100_000), 0.0);
        assert_eq!(utilization_pct(-5_000, 0), 0.0);
    }

    #[test]
    fn threshold_is_inclusive() {
        assert!(exceeds_threshold(-30_000, 100_000, 30.0));
        assert!(!exceeds_threshold(-29_900, 100_000, 30.0));
    }

    #[test]
    fn threshold_ignores_display_rounding() {
        assert_eq!(utilization_pct(-29_960, 100_000), 30.0);
        assert!(!exceeds_threshold(-29_960, 100_000, 30.0));
    }
}
