//! Budget impact of recurring payments.
//!
//! Normalizes every active recurring payment to a monthly equivalent, sums
//! the result per category and looks for savings opportunities: likely
//! duplicate subscriptions and categories whose share of recurring spend is
//! above their configured budget share.
//!
//! All sums stay in integer minor units. Percentages are rounded to one
//! decimal for display; comparisons use the unrounded values.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Category, Frequency, Money, RecurringPayment,
    recurring::{normalize_merchant, predict_next_payment_date},
};

/// Monthly equivalents within this share of the larger one are "comparable".
const COMPARABLE_AMOUNT_PCT: i64 = 20;
const MAX_EDIT_DISTANCE: usize = 2;
const MIN_CONTAINMENT_LEN: usize = 4;
const MIN_FUZZY_LEN: usize = 5;
const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Default maximum share (percent) of recurring spend per category, used
    /// when the category has no share of its own.
    pub category_share_pct: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            category_share_pct: 40.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryImpact {
    pub category_id: Option<Uuid>,
    pub name: String,
    pub monthly_minor: i64,
    pub yearly_minor: i64,
    pub share_pct: f64,
    pub budget_share_pct: f64,
    pub payment_count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Duplicate,
    CategoryOverspend,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub message: String,
    pub payment_ids: Vec<Uuid>,
    pub category_id: Option<Uuid>,
    /// Monthly amount that acting on the suggestion would free up.
    pub potential_savings_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BudgetImpact {
    pub total_monthly_minor: i64,
    pub total_yearly_minor: i64,
    /// Sorted by monthly amount, largest first.
    pub categories: Vec<CategoryImpact>,
    pub suggestions: Vec<Suggestion>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedPayment {
    pub payment_id: Uuid,
    pub name: String,
    pub due_date: NaiveDate,
    pub amount_minor: i64,
}

/// Charges expected in `[from, to]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingProjection {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total_minor: i64,
    pub payments: Vec<ProjectedPayment>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BudgetReport {
    pub impact: BudgetImpact,
    pub projection: SpendingProjection,
}

/// Converts one payment amount to its monthly equivalent.
///
/// Weekly × 52/12, monthly × 1, quarterly ÷ 3, yearly ÷ 12.
pub fn monthly_equivalent(amount_minor: i64, frequency: Frequency) -> Money {
    let (num, den) = frequency.monthly_ratio();
    Money::new(amount_minor.abs()).scale(num, den)
}

/// Computes the budget impact of the active payments in `payments`.
pub fn analyze(
    payments: &[RecurringPayment],
    categories: &[Category],
    config: &BudgetConfig,
) -> BudgetImpact {
    let active: Vec<&RecurringPayment> = payments.iter().filter(|p| p.is_active()).collect();
    let categories_by_id: HashMap<Uuid, &Category> = categories.iter().map(|c| (c.id, c)).collect();

    let mut totals: HashMap<Option<Uuid>, (Money, usize)> = HashMap::new();
    let mut total = Money::ZERO;
    for payment in &active {
        let monthly = monthly_equivalent(payment.amount_minor, payment.frequency);
        // A payment pointing at a deleted category is counted as uncategorized.
        let key = payment
            .category_id
            .filter(|id| categories_by_id.contains_key(id));
        let entry = totals.entry(key).or_insert((Money::ZERO, 0));
        entry.0 += monthly;
        entry.1 += 1;
        total += monthly;
    }

    let mut breakdown: Vec<CategoryImpact> = totals
        .into_iter()
        .map(|(category_id, (monthly, payment_count))| {
            let category = category_id.and_then(|id| categories_by_id.get(&id));
            CategoryImpact {
                category_id,
                name: category
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| UNCATEGORIZED.to_string()),
                monthly_minor: monthly.minor(),
                yearly_minor: monthly.scale(12, 1).minor(),
                share_pct: monthly.percent_of(total),
                budget_share_pct: category
                    .and_then(|c| c.budget_share_pct)
                    .unwrap_or(config.category_share_pct),
                payment_count,
            }
        })
        .collect();
    breakdown.sort_by(|a, b| {
        b.monthly_minor
            .cmp(&a.monthly_minor)
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut suggestions = duplicate_suggestions(&active);
    suggestions.extend(overspend_suggestions(&breakdown, total));

    BudgetImpact {
        total_monthly_minor: total.minor(),
        total_yearly_minor: total.scale(12, 1).minor(),
        categories: breakdown,
        suggestions,
    }
}

fn duplicate_suggestions(active: &[&RecurringPayment]) -> Vec<Suggestion> {
    let patterns: Vec<String> = active
        .iter()
        .map(|p| {
            if p.merchant_pattern.is_empty() {
                normalize_merchant(&p.name)
            } else {
                p.merchant_pattern.clone()
            }
        })
        .collect();

    let mut suggestions = Vec::new();
    for i in 0..active.len() {
        for j in (i + 1)..active.len() {
            if !similar_patterns(&patterns[i], &patterns[j]) {
                continue;
            }
            let a = monthly_equivalent(active[i].amount_minor, active[i].frequency);
            let b = monthly_equivalent(active[j].amount_minor, active[j].frequency);
            if !comparable_amounts(a, b) {
                continue;
            }
            suggestions.push(Suggestion {
                kind: SuggestionKind::Duplicate,
                message: format!(
                    "'{}' and '{}' look like the same service",
                    active[i].name, active[j].name
                ),
                payment_ids: vec![active[i].id, active[j].id],
                category_id: active[i].category_id,
                potential_savings_minor: a.min(b).minor(),
            });
        }
    }
    suggestions
}

fn overspend_suggestions(breakdown: &[CategoryImpact], total: Money) -> Vec<Suggestion> {
    if total.is_zero() {
        return Vec::new();
    }
    breakdown
        .iter()
        .filter(|c| c.monthly_minor as f64 / total.minor() as f64 * 100.0 > c.budget_share_pct)
        .map(|c| {
            let allowed = Money::new(
                (total.minor() as f64 * c.budget_share_pct / 100.0).round() as i64,
            );
            Suggestion {
                kind: SuggestionKind::CategoryOverspend,
                message: format!(
                    "'{}' takes {:.1}% of recurring spend, above its {:.1}% budget share",
                    c.name, c.share_pct, c.budget_share_pct
                ),
                payment_ids: Vec::new(),
                category_id: c.category_id,
                potential_savings_minor: (Money::new(c.monthly_minor) - allowed).minor().max(0),
            }
        })
        .collect()
}

/// `true` when two merchant patterns likely name the same service.
///
/// Equal patterns, one containing the other, or patterns within a small edit
/// distance of each other.
pub fn similar_patterns(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    let (shorter, longer) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    if shorter.chars().count() >= MIN_CONTAINMENT_LEN && longer.contains(shorter) {
        return true;
    }
    shorter.chars().count() >= MIN_FUZZY_LEN && levenshtein(a, b) <= MAX_EDIT_DISTANCE
}

fn comparable_amounts(a: Money, b: Money) -> bool {
    let larger = a.max(b).minor();
    let diff = (a - b).minor().abs();
    diff * 100 <= larger * COMPARABLE_AMOUNT_PCT
}

/// Edit distance between two strings, counted in chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Lists the charges of active payments expected in `[from, from + days]`.
///
/// Overdue payments are rolled forward to their first due date on or after
/// `from`.
pub fn project(payments: &[RecurringPayment], from: NaiveDate, days: u32) -> SpendingProjection {
    let to = from
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX);

    let mut projected = Vec::new();
    for payment in payments.iter().filter(|p| p.is_active()) {
        let mut due = payment.next_due_date;
        while due < from {
            let next = predict_next_payment_date(due, payment.frequency);
            if next <= due {
                break;
            }
            due = next;
        }
        while due >= from && due <= to {
            projected.push(ProjectedPayment {
                payment_id: payment.id,
                name: payment.name.clone(),
                due_date: due,
                amount_minor: payment.amount_minor,
            });
            let next = predict_next_payment_date(due, payment.frequency);
            if next <= due {
                break;
            }
            due = next;
        }
    }
    projected.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.name.cmp(&b.name)));

    let total_minor = projected
        .iter()
        .fold(Money::ZERO, |acc, p| acc + Money::new(p.amount_minor))
        .minor();

    SpendingProjection {
        from,
        to,
        total_minor,
        payments: projected,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{RecurringSource, RecurringStatus};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn payment(
        name: &str,
        amount_minor: i64,
        frequency: Frequency,
        category_id: Option<Uuid>,
    ) -> RecurringPayment {
        RecurringPayment {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            account_id: None,
            category_id,
            name: name.to_string(),
            merchant_pattern: normalize_merchant(name),
            amount_minor,
            frequency,
            next_due_date: date(2025, 1, 15),
            last_payment_date: None,
            confidence: 1.0,
            status: RecurringStatus::Active,
            source: RecurringSource::Manual,
            created_at: Utc::now(),
        }
    }

    fn category(name: &str, budget_share_pct: Option<f64>) -> Category {
        Category {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            name: name.to_string(),
            budget_share_pct,
        }
    }

    #[test]
    fn monthly_equivalents() {
        assert_eq!(monthly_equivalent(1000, Frequency::Weekly), Money::new(4333));
        assert_eq!(monthly_equivalent(1599, Frequency::Monthly), Money::new(1599));
        assert_eq!(monthly_equivalent(-3000, Frequency::Quarterly), Money::new(1000));
        assert_eq!(monthly_equivalent(12_000, Frequency::Yearly), Money::new(1000));
    }

    #[test]
    fn sums_by_category_with_shares() {
        let streaming = category("Streaming", Some(100.0));
        let utilities = category("Utilities", Some(100.0));
        let payments = vec![
            payment("Netflix", 1500, Frequency::Monthly, Some(streaming.id)),
            payment("Disney Plus", 12_000, Frequency::Yearly, Some(streaming.id)),
            payment("Water", 7500, Frequency::Quarterly, Some(utilities.id)),
            payment("Newspaper", 500, Frequency::Monthly, None),
        ];

        let impact = analyze(
            &payments,
            &[streaming.clone(), utilities.clone()],
            &BudgetConfig {
                category_share_pct: 100.0,
            },
        );
        // 15 + 10 + 25 + 5
        assert_eq!(impact.total_monthly_minor, 5500);
        assert_eq!(impact.total_yearly_minor, 66_000);
        assert_eq!(impact.categories.len(), 3);

        let first = &impact.categories[0];
        assert_eq!(first.name, "Streaming");
        assert_eq!(first.monthly_minor, 2500);
        assert_eq!(first.share_pct, 45.5);
        assert_eq!(first.payment_count, 2);

        let uncategorized = impact
            .categories
            .iter()
            .find(|c| c.category_id.is_none())
            .unwrap();
        assert_eq!(uncategorized.name, "Uncategorized");
        assert_eq!(uncategorized.share_pct, 9.1);
        assert!(impact.suggestions.is_empty());
    }

    #[test]
    fn inactive_payments_are_ignored() {
        let mut paused = payment("Gym", 4000, Frequency::Monthly, None);
        paused.status = RecurringStatus::Paused;
        let impact = analyze(&[paused], &[], &BudgetConfig::default());
        assert_eq!(impact.total_monthly_minor, 0);
        assert!(impact.categories.is_empty());
        assert!(impact.suggestions.is_empty());
    }

    #[test]
    fn flags_duplicates_with_comparable_amounts() {
        let payments = vec![
            payment("Spotify Premium", 999, Frequency::Monthly, None),
            payment("SPOTIFY", 1099, Frequency::Monthly, None),
            payment("Spotify Family", 2999, Frequency::Monthly, None),
        ];
        let impact = analyze(
            &payments,
            &[],
            &BudgetConfig {
                category_share_pct: 100.0,
            },
        );
        let duplicates: Vec<_> = impact
            .suggestions
            .iter()
            .filter(|s| s.kind == SuggestionKind::Duplicate)
            .collect();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].potential_savings_minor, 999);
        assert_eq!(
            duplicates[0].payment_ids,
            vec![payments[0].id, payments[1].id]
        );
    }

    #[test]
    fn flags_category_over_budget_share() {
        let streaming = category("Streaming", Some(50.0));
        let payments = vec![
            payment("Netflix", 3000, Frequency::Monthly, Some(streaming.id)),
            payment("Rent insurance", 1000, Frequency::Monthly, None),
        ];
        let impact = analyze(
            &payments,
            &[streaming.clone()],
            &BudgetConfig {
                category_share_pct: 90.0,
            },
        );
        let overspend: Vec<_> = impact
            .suggestions
            .iter()
            .filter(|s| s.kind == SuggestionKind::CategoryOverspend)
            .collect();
        assert_eq!(overspend.len(), 1);
        assert_eq!(overspend[0].category_id, Some(streaming.id));
        // 30.00 of 40.00 is 75%; allowed 50% = 20.00.
        assert_eq!(overspend[0].potential_savings_minor, 1000);
    }

    #[test]
    fn pattern_similarity() {
        assert!(similar_patterns("netflix", "netflix"));
        assert!(similar_patterns("spotify", "spotify premium"));
        assert!(similar_patterns("hulu plus", "hulu pluss"));
        assert!(!similar_patterns("hbo", "hbo max tv"));
        assert!(!similar_patterns("gym", "gap"));
        assert!(!similar_patterns("", "netflix"));
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
    }

    #[test]
    fn projection_rolls_overdue_forward() {
        let mut weekly = payment("Veg box", 2000, Frequency::Weekly, None);
        weekly.next_due_date = date(2024, 12, 30);
        let mut monthly = payment("Phone", 3500, Frequency::Monthly, None);
        monthly.next_due_date = date(2025, 1, 20);
        let mut cancelled = payment("Old gym", 4000, Frequency::Monthly, None);
        cancelled.status = RecurringStatus::Cancelled;

        let projection = project(&[weekly, monthly, cancelled], date(2025, 1, 1), 30);
        assert_eq!(projection.to, date(2025, 1, 31));
        let dates: Vec<NaiveDate> = projection.payments.iter().map(|p| p.due_date).collect();
        assert_eq!(
            dates,
            vec![
                date(2025, 1, 6),
                date(2025, 1, 13),
                date(2025, 1, 20),
                date(2025, 1, 20),
                date(2025, 1, 27),
            ]
        );
        assert_eq!(projection.total_minor, 4 * 2000 + 3500);
    }
}
