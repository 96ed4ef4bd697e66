//! Recurring payment detection.
//!
//! Groups debits by a normalized merchant pattern, infers the billing
//! frequency from the median gap between charges and scores how much the
//! group looks like a genuine recurring payment:
//!
//! - amount consistency: `1 / (1 + cv)` where `cv` is the coefficient of
//!   variation of the charged amounts
//! - date regularity: `1 / (1 + var / period)` where `var` is the variance of
//!   the gaps in days and `period` the nominal length of the frequency
//! - both combined by [`calculate_pattern_confidence`], which also rewards
//!   longer histories
//!
//! Groups with fewer than `min_occurrences` charges are not reported at all.

use std::collections::{BTreeMap, HashMap};

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Frequency, Transaction, util::fold_text};

/// Minimum number of charges before a merchant is considered recurring.
pub const MIN_OCCURRENCES: usize = 3;

/// Occurrence count at which the history bonus of the confidence saturates.
const FULL_HISTORY_OCCURRENCES: f64 = (MIN_OCCURRENCES * 2) as f64;

const AMOUNT_WEIGHT: f64 = 0.6;
const DATE_WEIGHT: f64 = 0.4;

/// Trailing tokens that carry no merchant identity.
const NOISE_SUFFIXES: &[&str] = &[
    "autopay",
    "payment",
    "pmt",
    "recurring",
    "subscription",
    "bill",
    "ach",
    "debit",
    "purchase",
    "online",
    "com",
    "inc",
    "llc",
    "ltd",
];

/// Two-token trailing noise, e.g. "AUTO PAY".
const NOISE_SUFFIX_PAIRS: &[(&str, &str)] = &[
    ("auto", "pay"),
    ("direct", "debit"),
    ("standing", "order"),
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub min_occurrences: usize,
    /// Only charges within this many days before `as_of` are considered.
    pub window_days: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_occurrences: MIN_OCCURRENCES,
            // Three yearly charges plus a month of slack.
            window_days: 3 * 365 + 30,
        }
    }
}

/// A group of charges that looks like a recurring payment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedPattern {
    pub merchant_pattern: String,
    /// Description of the most recent charge, as the user would recognize it.
    pub display_name: String,
    pub account_id: Uuid,
    /// Most frequent category among the charges, if any.
    pub category_id: Option<Uuid>,
    pub frequency: Frequency,
    /// Median charged amount, positive.
    pub typical_amount_minor: i64,
    pub occurrences: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub next_due_date: NaiveDate,
    pub amount_consistency: f64,
    pub date_regularity: f64,
    pub confidence: f64,
    pub transaction_ids: Vec<Uuid>,
}

/// Reduces a transaction description to a merchant pattern.
///
/// Case-folds, strips accents and punctuation, then drops trailing tokens that
/// contain digits (store numbers, phone numbers, references) or are billing
/// noise such as "AUTO PAY". If nothing is left the folded text is returned
/// unchanged.
pub fn normalize_merchant(description: &str) -> String {
    let folded = fold_text(description);
    let mut tokens: Vec<&str> = folded.split(' ').filter(|t| !t.is_empty()).collect();

    while let Some(&last) = tokens.last() {
        if tokens.len() >= 2 {
            let prev = tokens[tokens.len() - 2];
            if NOISE_SUFFIX_PAIRS.contains(&(prev, last)) {
                tokens.truncate(tokens.len() - 2);
                continue;
            }
        }
        if last.chars().any(|c| c.is_ascii_digit()) || NOISE_SUFFIXES.contains(&last) {
            tokens.pop();
            continue;
        }
        break;
    }

    if tokens.is_empty() {
        folded
    } else {
        tokens.join(" ")
    }
}

/// Next expected charge after `date`.
///
/// Month arithmetic clamps to the last day of the target month (Jan 31 +
/// 1 month is Feb 28/29).
pub fn predict_next_payment_date(date: NaiveDate, frequency: Frequency) -> NaiveDate {
    let next = match frequency {
        Frequency::Weekly => date.checked_add_days(Days::new(7)),
        Frequency::Monthly => date.checked_add_months(Months::new(1)),
        Frequency::Quarterly => date.checked_add_months(Months::new(3)),
        Frequency::Yearly => date.checked_add_months(Months::new(12)),
    };
    next.unwrap_or(NaiveDate::MAX)
}

/// Combines the regularity scores into a confidence in `[0, 1]`.
///
/// `(0.6 * amount + 0.4 * date) * (0.5 + 0.5 * min(1, occurrences / 6))`.
/// Inputs are clamped to `[0, 1]`; the result never decreases when any
/// argument grows.
pub fn calculate_pattern_confidence(
    amount_consistency: f64,
    date_regularity: f64,
    occurrences: usize,
) -> f64 {
    let amount = clamp_unit(amount_consistency);
    let date = clamp_unit(date_regularity);
    let history = (occurrences as f64 / FULL_HISTORY_OCCURRENCES).min(1.0);
    let confidence = (AMOUNT_WEIGHT * amount + DATE_WEIGHT * date) * (0.5 + 0.5 * history);
    clamp_unit(confidence)
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// `1 / (1 + cv)` of the absolute amounts. 1 means every charge is equal.
pub fn amount_consistency(amounts_minor: &[i64]) -> f64 {
    if amounts_minor.is_empty() {
        return 0.0;
    }
    let values: Vec<f64> = amounts_minor.iter().map(|a| a.unsigned_abs() as f64).collect();
    let mean = mean(&values);
    if mean == 0.0 {
        return 0.0;
    }
    let cv = variance(&values).sqrt() / mean;
    1.0 / (1.0 + cv)
}

/// `1 / (1 + var / period_days)` of the gaps between charges.
pub fn date_regularity(intervals_days: &[i64], period_days: f64) -> f64 {
    if intervals_days.is_empty() || period_days <= 0.0 {
        return 0.0;
    }
    let values: Vec<f64> = intervals_days.iter().map(|d| *d as f64).collect();
    1.0 / (1.0 + variance(&values) / period_days)
}

/// Maps a median gap onto the frequency whose tolerance band contains it.
pub fn classify_interval(median_days: f64) -> Option<Frequency> {
    Frequency::ALL
        .into_iter()
        .find(|f| (median_days - f.nominal_days()).abs() <= f.tolerance_days())
}

/// Runs detection over a transaction history.
///
/// Only debits that are not transfers and fall inside
/// `[as_of - window_days, as_of]` are considered. Results are sorted by
/// confidence, highest first.
pub fn detect_patterns(
    transactions: &[Transaction],
    as_of: NaiveDate,
    config: &DetectionConfig,
) -> Vec<DetectedPattern> {
    let window_start = as_of
        .checked_sub_days(Days::new(u64::from(config.window_days)))
        .unwrap_or(NaiveDate::MIN);
    let min_occurrences = config.min_occurrences.max(2);

    let mut groups: BTreeMap<String, Vec<&Transaction>> = BTreeMap::new();
    for tx in transactions.iter().filter(|tx| {
        tx.is_debit()
            && !tx.is_transfer()
            && tx.transaction_date >= window_start
            && tx.transaction_date <= as_of
    }) {
        let pattern = normalize_merchant(&tx.description);
        if pattern.is_empty() {
            continue;
        }
        groups.entry(pattern).or_default().push(tx);
    }

    let mut detected: Vec<DetectedPattern> = groups
        .into_iter()
        .filter_map(|(pattern, group)| {
            if group.len() < min_occurrences {
                tracing::debug!(
                    pattern = %pattern,
                    occurrences = group.len(),
                    "not enough occurrences for a recurring pattern"
                );
                return None;
            }
            analyze_group(pattern, group)
        })
        .collect();

    detected.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.merchant_pattern.cmp(&b.merchant_pattern))
    });
    detected
}

fn analyze_group(pattern: String, mut group: Vec<&Transaction>) -> Option<DetectedPattern> {
    group.sort_by(|a, b| {
        a.transaction_date
            .cmp(&b.transaction_date)
            .then_with(|| a.id.cmp(&b.id))
    });

    let intervals: Vec<i64> = group
        .windows(2)
        .map(|w| (w[1].transaction_date - w[0].transaction_date).num_days())
        .collect();
    let median_interval = median(&intervals.iter().map(|d| *d as f64).collect::<Vec<_>>())?;
    let Some(frequency) = classify_interval(median_interval) else {
        tracing::debug!(
            pattern = %pattern,
            median_interval,
            "interval does not match any billing frequency"
        );
        return None;
    };

    let amounts: Vec<i64> = group.iter().map(|tx| tx.amount_minor).collect();
    let abs_amounts: Vec<f64> = amounts.iter().map(|a| a.unsigned_abs() as f64).collect();
    let typical_amount_minor = median(&abs_amounts)?.round() as i64;

    let amount_consistency = amount_consistency(&amounts);
    let date_regularity = date_regularity(&intervals, frequency.nominal_days());
    let confidence = calculate_pattern_confidence(amount_consistency, date_regularity, group.len());

    let first = group.first()?;
    let last = group.last()?;

    Some(DetectedPattern {
        merchant_pattern: pattern,
        display_name: last.description.trim().to_string(),
        account_id: last.account_id,
        category_id: most_common_category(&group),
        frequency,
        typical_amount_minor,
        occurrences: group.len(),
        first_date: first.transaction_date,
        last_date: last.transaction_date,
        next_due_date: predict_next_payment_date(last.transaction_date, frequency),
        amount_consistency,
        date_regularity,
        confidence,
        transaction_ids: group.iter().map(|tx| tx.id).collect(),
    })
}

fn most_common_category(group: &[&Transaction]) -> Option<Uuid> {
    let mut counts: HashMap<Uuid, usize> = HashMap::new();
    for id in group.iter().filter_map(|tx| tx.category_id) {
        *counts.entry(id).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(id, _)| id)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance.
fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn charge(account_id: Uuid, description: &str, amount_minor: i64, on: NaiveDate) -> Transaction {
        Transaction::new(account_id, amount_minor, description.to_string(), on).unwrap()
    }

    #[test]
    fn normalize_strips_noise() {
        assert_eq!(normalize_merchant("NETFLIX.COM 866-579-7172"), "netflix");
        assert_eq!(normalize_merchant("Spotify AUTO PAY"), "spotify");
        assert_eq!(normalize_merchant("SPOTIFY USA 123456"), "spotify usa");
        assert_eq!(normalize_merchant("Gym Membership #4455"), "gym membership");
        assert_eq!(normalize_merchant("City Water Bill Payment"), "city water");
        assert_eq!(normalize_merchant("PAYMENT"), "payment");
        assert_eq!(normalize_merchant("  "), "");
    }

    #[test]
    fn predict_next_dates() {
        let d = date(2025, 1, 15);
        assert_eq!(predict_next_payment_date(d, Frequency::Monthly), date(2025, 2, 15));
        assert_eq!(predict_next_payment_date(d, Frequency::Weekly), date(2025, 1, 22));
        assert_eq!(predict_next_payment_date(d, Frequency::Quarterly), date(2025, 4, 15));
        assert_eq!(predict_next_payment_date(d, Frequency::Yearly), date(2026, 1, 15));
    }

    #[test]
    fn predict_clamps_to_month_end() {
        assert_eq!(
            predict_next_payment_date(date(2025, 1, 31), Frequency::Monthly),
            date(2025, 2, 28)
        );
        assert_eq!(
            predict_next_payment_date(date(2024, 2, 29), Frequency::Yearly),
            date(2025, 2, 28)
        );
    }

    #[test]
    fn confidence_is_bounded_and_monotone() {
        let steps = [0.0, 0.1, 0.25, 0.5, 0.75, 0.9, 1.0];
        for &a in &steps {
            for &d in &steps {
                let mut prev = -1.0;
                for occ in 0..12 {
                    let c = calculate_pattern_confidence(a, d, occ);
                    assert!((0.0..=1.0).contains(&c));
                    assert!(c >= prev);
                    prev = c;
                }
            }
        }
        for occ in [3usize, 6] {
            let mut prev = -1.0;
            for &a in &steps {
                let c = calculate_pattern_confidence(a, 0.5, occ);
                assert!(c >= prev);
                prev = c;
            }
            let mut prev = -1.0;
            for &d in &steps {
                let c = calculate_pattern_confidence(0.5, d, occ);
                assert!(c >= prev);
                prev = c;
            }
        }
        assert_eq!(calculate_pattern_confidence(5.0, 5.0, 100), 1.0);
        assert_eq!(calculate_pattern_confidence(-1.0, f64::NAN, 0), 0.0);
    }

    #[test]
    fn classify_uses_tolerance_bands() {
        assert_eq!(classify_interval(7.0), Some(Frequency::Weekly));
        assert_eq!(classify_interval(31.0), Some(Frequency::Monthly));
        assert_eq!(classify_interval(28.0), Some(Frequency::Monthly));
        assert_eq!(classify_interval(92.0), Some(Frequency::Quarterly));
        assert_eq!(classify_interval(366.0), Some(Frequency::Yearly));
        assert_eq!(classify_interval(18.0), None);
        assert_eq!(classify_interval(200.0), None);
    }

    #[test]
    fn detects_monthly_subscription() {
        let account = Uuid::new_v4();
        let history = vec![
            charge(account, "NETFLIX.COM 866-579-7172", -1599, date(2025, 1, 15)),
            charge(account, "NETFLIX.COM 866-579-7172", -1599, date(2025, 2, 15)),
            charge(account, "Netflix.com", -1599, date(2025, 3, 15)),
            charge(account, "NETFLIX.COM 866-579-7172", -1599, date(2025, 4, 15)),
            charge(account, "Corner Coffee", -450, date(2025, 2, 2)),
            charge(account, "Salary ACME", 250_000, date(2025, 3, 1)),
        ];

        let detected = detect_patterns(&history, date(2025, 4, 30), &DetectionConfig::default());
        assert_eq!(detected.len(), 1);
        let netflix = &detected[0];
        assert_eq!(netflix.merchant_pattern, "netflix");
        assert_eq!(netflix.frequency, Frequency::Monthly);
        assert_eq!(netflix.typical_amount_minor, 1599);
        assert_eq!(netflix.occurrences, 4);
        assert_eq!(netflix.next_due_date, date(2025, 5, 15));
        assert_eq!(netflix.amount_consistency, 1.0);
        assert!(netflix.confidence > 0.75, "confidence {}", netflix.confidence);
    }

    #[test]
    fn below_minimum_occurrences_is_not_detected() {
        let account = Uuid::new_v4();
        let history = vec![
            charge(account, "Spotify", -999, date(2025, 1, 3)),
            charge(account, "Spotify", -999, date(2025, 2, 3)),
        ];
        assert!(detect_patterns(&history, date(2025, 3, 1), &DetectionConfig::default()).is_empty());
    }

    #[test]
    fn outlier_amount_lowers_but_keeps_confidence() {
        let account = Uuid::new_v4();
        let steady: Vec<Transaction> = (1..=5)
            .map(|m| charge(account, "Gym Membership #4455", -4000, date(2025, m, 5)))
            .collect();
        let mut with_outlier = steady.clone();
        with_outlier[2].amount_minor = -12_000;

        let as_of = date(2025, 6, 1);
        let config = DetectionConfig::default();
        let clean = detect_patterns(&steady, as_of, &config);
        let noisy = detect_patterns(&with_outlier, as_of, &config);
        assert_eq!(clean.len(), 1);
        assert_eq!(noisy.len(), 1);
        assert!(noisy[0].confidence < clean[0].confidence);
        assert!(noisy[0].confidence > 0.0);
        assert_eq!(noisy[0].typical_amount_minor, 4000);
    }

    #[test]
    fn irregular_gaps_are_rejected() {
        let account = Uuid::new_v4();
        let history = vec![
            charge(account, "Hardware Store", -2500, date(2025, 1, 1)),
            charge(account, "Hardware Store", -2500, date(2025, 1, 19)),
            charge(account, "Hardware Store", -2500, date(2025, 2, 6)),
            charge(account, "Hardware Store", -2500, date(2025, 2, 24)),
        ];
        assert!(detect_patterns(&history, date(2025, 3, 1), &DetectionConfig::default()).is_empty());
    }

    #[test]
    fn window_excludes_old_charges_and_transfers() {
        let account = Uuid::new_v4();
        let mut history = vec![
            charge(account, "Weekly Veg Box", -2000, date(2024, 1, 1)),
            charge(account, "Weekly Veg Box", -2000, date(2025, 3, 3)),
            charge(account, "Weekly Veg Box", -2000, date(2025, 3, 10)),
        ];
        let config = DetectionConfig {
            min_occurrences: 3,
            window_days: 90,
        };
        assert!(detect_patterns(&history, date(2025, 3, 20), &config).is_empty());

        history.push(charge(account, "Weekly Veg Box", -2000, date(2025, 3, 17)));
        let detected = detect_patterns(&history, date(2025, 3, 20), &config);
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].frequency, Frequency::Weekly);
        assert_eq!(detected[0].occurrences, 3);

        for tx in &mut history {
            tx.transfer_id = Some(Uuid::new_v4());
        }
        assert!(detect_patterns(&history, date(2025, 3, 20), &config).is_empty());
    }

    #[test]
    fn yearly_pattern_within_default_window() {
        let account = Uuid::new_v4();
        let history = vec![
            charge(account, "Domain Renewal 2023", -1200, date(2023, 6, 1)),
            charge(account, "Domain Renewal 2024", -1200, date(2024, 6, 1)),
            charge(account, "Domain Renewal 2025", -1300, date(2025, 6, 1)),
        ];
        let detected = detect_patterns(&history, date(2025, 7, 1), &DetectionConfig::default());
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].merchant_pattern, "domain renewal");
        assert_eq!(detected[0].frequency, Frequency::Yearly);
        assert_eq!(detected[0].next_due_date, date(2026, 6, 1));
    }

    #[test]
    fn most_common_category_wins() {
        let account = Uuid::new_v4();
        let streaming = Uuid::new_v4();
        let mut history: Vec<Transaction> = (1..=3)
            .map(|m| charge(account, "Hulu", -799, date(2025, m, 10)))
            .collect();
        history[0].category_id = Some(streaming);
        history[2].category_id = Some(streaming);
        let detected = detect_patterns(&history, date(2025, 4, 1), &DetectionConfig::default());
        assert_eq!(detected[0].category_id, Some(streaming));
    }
}
