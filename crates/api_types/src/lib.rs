use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Longest accepted name for accounts, categories, payments and goals.
pub const MAX_NAME_LEN: usize = 100;
/// Longest accepted transaction description.
pub const MAX_DESCRIPTION_LEN: usize = 255;
/// Largest page size for transaction listings.
pub const MAX_PAGE_LIMIT: u64 = 200;
/// Longest reminder window, in days.
pub const MAX_REMINDER_DAYS_AHEAD: u32 = 60;
/// Longest budget impact projection, in days.
pub const MAX_HORIZON_DAYS: u32 = 366;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
}

/// One invalid request field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Request bodies that can check their own shape before reaching the engine.
pub trait Validate {
    fn validate(&self) -> Result<(), Vec<FieldError>>;
}

/// Collects field errors so a request reports all of them at once.
#[derive(Debug, Default)]
struct Checks(Vec<FieldError>);

impl Checks {
    fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.0.push(FieldError {
                field: field.to_string(),
                message: message.to_string(),
            });
        }
        self
    }

    fn name(&mut self, value: &str, field: &str) -> &mut Self {
        let trimmed = value.trim();
        self.check(!trimmed.is_empty(), field, "must not be empty")
            .check(
                trimmed.chars().count() <= MAX_NAME_LEN,
                field,
                "must be at most 100 characters",
            )
    }

    fn finish(&mut self) -> Result<(), Vec<FieldError>> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.0))
        }
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in PATCH bodies. Use with `#[serde(default)]`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub mod error {
    use super::*;

    /// Body of every non-2xx response.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ErrorResponse {
        pub error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub details: Option<Vec<FieldError>>,
    }
}

pub mod account {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum AccountKind {
        Checking,
        Savings,
        Credit,
        Cash,
        Investment,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub name: String,
        pub kind: AccountKind,
        /// Required for credit accounts, rejected for the others.
        pub credit_limit_minor: Option<i64>,
        pub currency: Option<Currency>,
    }

    impl Validate for AccountNew {
        fn validate(&self) -> Result<(), Vec<FieldError>> {
            Checks::default()
                .name(&self.name, "name")
                .check(
                    self.credit_limit_minor.is_none_or(|limit| limit > 0),
                    "credit_limit_minor",
                    "must be greater than zero",
                )
                .finish()
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AccountUpdate {
        pub name: Option<String>,
        #[serde(default, deserialize_with = "nullable")]
        pub credit_limit_minor: Option<Option<i64>>,
        pub archived: Option<bool>,
    }

    impl Validate for AccountUpdate {
        fn validate(&self) -> Result<(), Vec<FieldError>> {
            let mut checks = Checks::default();
            if let Some(name) = &self.name {
                checks.name(name, "name");
            }
            checks
                .check(
                    self.credit_limit_minor
                        .flatten()
                        .is_none_or(|limit| limit > 0),
                    "credit_limit_minor",
                    "must be greater than zero",
                )
                .finish()
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AccountList {
        pub include_archived: Option<bool>,
    }

    impl Validate for AccountList {
        fn validate(&self) -> Result<(), Vec<FieldError>> {
            Ok(())
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: Uuid,
        pub name: String,
        pub kind: AccountKind,
        /// Sum of the account's transactions.
        pub balance_minor: i64,
        pub credit_limit_minor: Option<i64>,
        /// Share of the credit limit in use; credit accounts only.
        pub utilization_pct: Option<f64>,
        pub currency: Currency,
        pub archived: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountListResponse {
        pub accounts: Vec<AccountView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub account_id: Uuid,
        pub balance_minor: i64,
    }
}

pub mod category {
    use super::*;

    fn share_ok(pct: f64) -> bool {
        (0.0..=100.0).contains(&pct)
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        /// Maximum share (0-100) of recurring spend for this category.
        pub budget_share_pct: Option<f64>,
    }

    impl Validate for CategoryNew {
        fn validate(&self) -> Result<(), Vec<FieldError>> {
            Checks::default()
                .name(&self.name, "name")
                .check(
                    self.budget_share_pct.is_none_or(share_ok),
                    "budget_share_pct",
                    "must be between 0 and 100",
                )
                .finish()
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: Option<String>,
        #[serde(default, deserialize_with = "nullable")]
        pub budget_share_pct: Option<Option<f64>>,
    }

    impl Validate for CategoryUpdate {
        fn validate(&self) -> Result<(), Vec<FieldError>> {
            let mut checks = Checks::default();
            if let Some(name) = &self.name {
                checks.name(name, "name");
            }
            checks
                .check(
                    self.budget_share_pct.flatten().is_none_or(share_ok),
                    "budget_share_pct",
                    "must be between 0 and 100",
                )
                .finish()
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
        pub budget_share_pct: Option<f64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryListResponse {
        pub categories: Vec<CategoryView>,
    }
}

pub mod transaction {
    use super::*;

    fn description_checks(checks: &mut Checks, description: &str) {
        let trimmed = description.trim();
        checks
            .check(!trimmed.is_empty(), "description", "must not be empty")
            .check(
                trimmed.chars().count() <= MAX_DESCRIPTION_LEN,
                "description",
                "must be at most 255 characters",
            );
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub account_id: Uuid,
        /// Signed: negative for debits, positive for credits. Never zero.
        pub amount_minor: i64,
        pub description: String,
        pub transaction_date: NaiveDate,
        pub category_id: Option<Uuid>,
        pub recurring_payment_id: Option<Uuid>,
    }

    impl Validate for TransactionNew {
        fn validate(&self) -> Result<(), Vec<FieldError>> {
            let mut checks = Checks::default();
            checks.check(self.amount_minor != 0, "amount_minor", "must not be zero");
            description_checks(&mut checks, &self.description);
            checks.finish()
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        /// Moves the transaction to another account.
        pub account_id: Option<Uuid>,
        pub amount_minor: Option<i64>,
        pub description: Option<String>,
        pub transaction_date: Option<NaiveDate>,
        #[serde(default, deserialize_with = "nullable")]
        pub category_id: Option<Option<Uuid>>,
        #[serde(default, deserialize_with = "nullable")]
        pub recurring_payment_id: Option<Option<Uuid>>,
    }

    impl Validate for TransactionUpdate {
        fn validate(&self) -> Result<(), Vec<FieldError>> {
            let mut checks = Checks::default();
            checks.check(
                self.amount_minor != Some(0),
                "amount_minor",
                "must not be zero",
            );
            if let Some(description) = &self.description {
                description_checks(&mut checks, description);
            }
            checks.finish()
        }
    }

    /// Query string of `GET /api/transactions`. Date bounds are inclusive.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionList {
        pub account_id: Option<Uuid>,
        pub category_id: Option<Uuid>,
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `next_cursor`.
        ///
        /// Newest → older pagination.
        pub cursor: Option<String>,
    }

    impl Validate for TransactionList {
        fn validate(&self) -> Result<(), Vec<FieldError>> {
            let ordered = match (self.from, self.to) {
                (Some(from), Some(to)) => from <= to,
                _ => true,
            };
            Checks::default()
                .check(ordered, "from", "must not be after `to`")
                .check(
                    self.limit
                        .is_none_or(|limit| (1..=MAX_PAGE_LIMIT).contains(&limit)),
                    "limit",
                    "must be between 1 and 200",
                )
                .finish()
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub category_id: Option<Uuid>,
        pub amount_minor: i64,
        pub description: String,
        pub transaction_date: NaiveDate,
        pub recurring_payment_id: Option<Uuid>,
        pub transfer_id: Option<Uuid>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        /// Opaque cursor for fetching the next page (older items).
        pub next_cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        pub from_account_id: Uuid,
        pub to_account_id: Uuid,
        /// Must be > 0; the debit side gets the negated amount.
        pub amount_minor: i64,
        pub transaction_date: NaiveDate,
        pub description: Option<String>,
    }

    impl Validate for TransferNew {
        fn validate(&self) -> Result<(), Vec<FieldError>> {
            let mut checks = Checks::default();
            checks
                .check(self.amount_minor > 0, "amount_minor", "must be greater than zero")
                .check(
                    self.from_account_id != self.to_account_id,
                    "to_account_id",
                    "must differ from from_account_id",
                );
            if let Some(description) = &self.description {
                description_checks(&mut checks, description);
            }
            checks.finish()
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferView {
        pub transfer_id: Uuid,
        pub debit: TransactionView,
        pub credit: TransactionView,
    }
}

pub mod recurring {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Frequency {
        Weekly,
        Monthly,
        Quarterly,
        Yearly,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RecurringStatus {
        Active,
        Paused,
        Cancelled,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RecurringSource {
        Manual,
        Detected,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecurringPaymentNew {
        pub name: String,
        /// Magnitude of one charge, > 0.
        pub amount_minor: i64,
        pub frequency: Frequency,
        pub next_due_date: NaiveDate,
        pub account_id: Option<Uuid>,
        pub category_id: Option<Uuid>,
        /// Defaults to the normalized name.
        pub merchant_pattern: Option<String>,
    }

    impl Validate for RecurringPaymentNew {
        fn validate(&self) -> Result<(), Vec<FieldError>> {
            Checks::default()
                .name(&self.name, "name")
                .check(self.amount_minor > 0, "amount_minor", "must be greater than zero")
                .finish()
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RecurringPaymentUpdate {
        pub name: Option<String>,
        /// Blank resets it to the normalized name.
        pub merchant_pattern: Option<String>,
        pub amount_minor: Option<i64>,
        pub frequency: Option<Frequency>,
        pub next_due_date: Option<NaiveDate>,
        pub status: Option<RecurringStatus>,
        #[serde(default, deserialize_with = "nullable")]
        pub account_id: Option<Option<Uuid>>,
        #[serde(default, deserialize_with = "nullable")]
        pub category_id: Option<Option<Uuid>>,
    }

    impl Validate for RecurringPaymentUpdate {
        fn validate(&self) -> Result<(), Vec<FieldError>> {
            let mut checks = Checks::default();
            if let Some(name) = &self.name {
                checks.name(name, "name");
            }
            checks
                .check(
                    self.amount_minor.is_none_or(|amount| amount > 0),
                    "amount_minor",
                    "must be greater than zero",
                )
                .finish()
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RecurringPaymentList {
        pub status: Option<RecurringStatus>,
    }

    impl Validate for RecurringPaymentList {
        fn validate(&self) -> Result<(), Vec<FieldError>> {
            Ok(())
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecurringPaymentView {
        pub id: Uuid,
        pub account_id: Option<Uuid>,
        pub category_id: Option<Uuid>,
        pub name: String,
        pub merchant_pattern: String,
        pub amount_minor: i64,
        pub monthly_equivalent_minor: i64,
        pub frequency: Frequency,
        pub next_due_date: NaiveDate,
        pub last_payment_date: Option<NaiveDate>,
        pub confidence: f64,
        pub status: RecurringStatus,
        pub source: RecurringSource,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecurringPaymentListResponse {
        pub recurring_payments: Vec<RecurringPaymentView>,
    }

    /// Body of `POST /api/recurring-payments/detect`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct DetectRequest {
        pub account_id: Uuid,
        /// End of the detection window; defaults to today.
        pub as_of: Option<NaiveDate>,
        /// Start tracking what was found instead of only reporting it.
        #[serde(default)]
        pub track: bool,
    }

    impl Validate for DetectRequest {
        fn validate(&self) -> Result<(), Vec<FieldError>> {
            Ok(())
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DetectedPatternView {
        pub merchant_pattern: String,
        pub display_name: String,
        pub account_id: Uuid,
        pub category_id: Option<Uuid>,
        pub frequency: Frequency,
        pub typical_amount_minor: i64,
        pub occurrences: usize,
        pub first_date: NaiveDate,
        pub last_date: NaiveDate,
        pub next_due_date: NaiveDate,
        pub confidence: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DetectResponse {
        pub patterns: Vec<DetectedPatternView>,
        /// Payments created when `track` was set.
        pub tracked: Vec<RecurringPaymentView>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BudgetImpactQuery {
        /// Projection window in days, default 30, at most 366.
        pub horizon_days: Option<u32>,
    }

    impl Validate for BudgetImpactQuery {
        fn validate(&self) -> Result<(), Vec<FieldError>> {
            Checks::default()
                .check(
                    self.horizon_days
                        .is_none_or(|days| (1..=MAX_HORIZON_DAYS).contains(&days)),
                    "horizon_days",
                    "must be between 1 and 366",
                )
                .finish()
        }
    }
}

pub mod budget {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SuggestionKind {
        Duplicate,
        CategoryOverspend,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryImpactView {
        /// `None` groups the uncategorized payments.
        pub category_id: Option<Uuid>,
        pub name: String,
        pub monthly_minor: i64,
        pub yearly_minor: i64,
        pub share_pct: f64,
        pub budget_share_pct: f64,
        pub payment_count: usize,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SuggestionView {
        pub kind: SuggestionKind,
        pub message: String,
        pub payment_ids: Vec<Uuid>,
        pub category_id: Option<Uuid>,
        pub potential_savings_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProjectedPaymentView {
        pub payment_id: Uuid,
        pub name: String,
        pub due_date: NaiveDate,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProjectionView {
        pub from: NaiveDate,
        pub to: NaiveDate,
        pub total_minor: i64,
        pub payments: Vec<ProjectedPaymentView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetImpactResponse {
        pub total_monthly_minor: i64,
        pub total_yearly_minor: i64,
        pub categories: Vec<CategoryImpactView>,
        pub suggestions: Vec<SuggestionView>,
        pub projection: ProjectionView,
    }
}

pub mod goal {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum GoalPriority {
        Low,
        Medium,
        High,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum GoalStatus {
        Active,
        Paused,
        Completed,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalNew {
        pub name: String,
        pub target_minor: i64,
        pub target_date: Option<NaiveDate>,
        pub priority: Option<GoalPriority>,
    }

    impl Validate for GoalNew {
        fn validate(&self) -> Result<(), Vec<FieldError>> {
            Checks::default()
                .name(&self.name, "name")
                .check(self.target_minor > 0, "target_minor", "must be greater than zero")
                .finish()
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct GoalUpdate {
        pub name: Option<String>,
        pub target_minor: Option<i64>,
        #[serde(default, deserialize_with = "nullable")]
        pub target_date: Option<Option<NaiveDate>>,
        pub priority: Option<GoalPriority>,
        /// `true` pauses, `false` resumes.
        pub paused: Option<bool>,
    }

    impl Validate for GoalUpdate {
        fn validate(&self) -> Result<(), Vec<FieldError>> {
            let mut checks = Checks::default();
            if let Some(name) = &self.name {
                checks.name(name, "name");
            }
            checks
                .check(
                    self.target_minor.is_none_or(|target| target > 0),
                    "target_minor",
                    "must be greater than zero",
                )
                .finish()
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Contribution {
        pub amount_minor: i64,
    }

    impl Validate for Contribution {
        fn validate(&self) -> Result<(), Vec<FieldError>> {
            Checks::default()
                .check(self.amount_minor > 0, "amount_minor", "must be greater than zero")
                .finish()
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalView {
        pub id: Uuid,
        pub name: String,
        pub target_minor: i64,
        pub current_minor: i64,
        pub remaining_minor: i64,
        pub progress_percentage: f64,
        /// Monthly saving needed to reach the target date, if one is set.
        pub monthly_contribution_needed_minor: Option<i64>,
        pub target_date: Option<NaiveDate>,
        pub priority: GoalPriority,
        pub status: GoalStatus,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalListResponse {
        pub goals: Vec<GoalView>,
    }
}

pub mod notification {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum NotificationKind {
        CreditUtilization,
        PaymentReminder,
        GoalCompleted,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct NotificationList {
        pub unread_only: Option<bool>,
    }

    impl Validate for NotificationList {
        fn validate(&self) -> Result<(), Vec<FieldError>> {
            Ok(())
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NotificationView {
        pub id: Uuid,
        pub kind: NotificationKind,
        pub title: String,
        pub message: String,
        pub read: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NotificationListResponse {
        pub notifications: Vec<NotificationView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReadAllResponse {
        pub updated: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NotificationCheckResponse {
        pub credit_alerts: Vec<NotificationView>,
        pub payment_reminders: Vec<NotificationView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PreferencesView {
        pub credit_alerts: bool,
        pub payment_reminders: bool,
        pub goal_alerts: bool,
        pub utilization_threshold_pct: f64,
        pub reminder_days_ahead: u32,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PreferencesUpdate {
        pub credit_alerts: Option<bool>,
        pub payment_reminders: Option<bool>,
        pub goal_alerts: Option<bool>,
        pub utilization_threshold_pct: Option<f64>,
        pub reminder_days_ahead: Option<u32>,
    }

    impl Validate for PreferencesUpdate {
        fn validate(&self) -> Result<(), Vec<FieldError>> {
            Checks::default()
                .check(
                    self.utilization_threshold_pct
                        .is_none_or(|pct| pct > 0.0 && pct <= 100.0),
                    "utilization_threshold_pct",
                    "must be greater than 0 and at most 100",
                )
                .check(
                    self.reminder_days_ahead
                        .is_none_or(|days| days <= MAX_REMINDER_DAYS_AHEAD),
                    "reminder_days_ahead",
                    "must be at most 60",
                )
                .finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(result: Result<(), Vec<FieldError>>) -> Vec<String> {
        result
            .unwrap_err()
            .into_iter()
            .map(|e| e.field)
            .collect()
    }

    #[test]
    fn patch_distinguishes_missing_from_null() {
        let missing: account::AccountUpdate = serde_json::from_str(r#"{"name":"Visa"}"#).unwrap();
        assert_eq!(missing.credit_limit_minor, None);

        let cleared: account::AccountUpdate =
            serde_json::from_str(r#"{"credit_limit_minor":null}"#).unwrap();
        assert_eq!(cleared.credit_limit_minor, Some(None));

        let set: account::AccountUpdate =
            serde_json::from_str(r#"{"credit_limit_minor":5000}"#).unwrap();
        assert_eq!(set.credit_limit_minor, Some(Some(5000)));
    }

    #[test]
    fn transaction_reports_every_bad_field() {
        let body: transaction::TransactionNew = serde_json::from_str(
            r#"{
                "account_id": "6f1c1b4e-8f5e-4a59-9a39-3f0d2b8f7c11",
                "amount_minor": 0,
                "description": "   ",
                "transaction_date": "2025-03-01"
            }"#,
        )
        .unwrap();
        assert_eq!(fields(body.validate()), vec!["amount_minor", "description"]);
    }

    #[test]
    fn transfer_needs_two_accounts() {
        let id = Uuid::new_v4();
        let body = transaction::TransferNew {
            from_account_id: id,
            to_account_id: id,
            amount_minor: 100,
            transaction_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            description: None,
        };
        assert_eq!(fields(body.validate()), vec!["to_account_id"]);
    }

    #[test]
    fn list_rejects_inverted_range_and_huge_pages() {
        let query = transaction::TransactionList {
            from: NaiveDate::from_ymd_opt(2025, 2, 1),
            to: NaiveDate::from_ymd_opt(2025, 1, 1),
            limit: Some(1000),
            ..Default::default()
        };
        assert_eq!(fields(query.validate()), vec!["from", "limit"]);
    }

    #[test]
    fn names_are_bounded() {
        let body = category::CategoryNew {
            name: "x".repeat(101),
            budget_share_pct: Some(120.0),
        };
        assert_eq!(fields(body.validate()), vec!["name", "budget_share_pct"]);

        let ok = category::CategoryNew {
            name: "Streaming".to_string(),
            budget_share_pct: Some(25.0),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn preferences_bounds() {
        let body = notification::PreferencesUpdate {
            utilization_threshold_pct: Some(100.5),
            reminder_days_ahead: Some(60),
            ..Default::default()
        };
        assert_eq!(fields(body.validate()), vec!["utilization_threshold_pct"]);
    }

    #[test]
    fn budget_horizon_is_bounded() {
        for days in [0, 367] {
            let query = recurring::BudgetImpactQuery {
                horizon_days: Some(days),
            };
            assert_eq!(fields(query.validate()), vec!["horizon_days"]);
        }
        assert!(recurring::BudgetImpactQuery::default().validate().is_ok());
        let year = recurring::BudgetImpactQuery {
            horizon_days: Some(366),
        };
        assert!(year.validate().is_ok());
    }

    #[test]
    fn enums_use_snake_case() {
        let kind: account::AccountKind = serde_json::from_str(r#""credit""#).unwrap();
        assert_eq!(kind, account::AccountKind::Credit);
        let currency: Currency = serde_json::from_str(r#""EUR""#).unwrap();
        assert_eq!(currency, Currency::Eur);
        assert_eq!(
            serde_json::to_string(&budget::SuggestionKind::CategoryOverspend).unwrap(),
            r#""category_overspend""#
        );
    }
}
