//! Command structs for engine operations.
//!
//! These types group parameters for write operations (create/update of
//! accounts, transactions, recurring payments, goals), keeping call sites
//! readable and avoiding long argument lists.
//!
//! Update commands use `Option<T>` for "leave unchanged" and
//! `Option<Option<T>>` for nullable fields, where `Some(None)` clears the
//! value.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{AccountKind, Currency, Frequency, GoalPriority, RecurringStatus};

/// Create an account.
#[derive(Clone, Debug)]
pub struct CreateAccountCmd {
    pub name: String,
    pub kind: AccountKind,
    pub credit_limit_minor: Option<i64>,
    pub currency: Currency,
}

impl CreateAccountCmd {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: AccountKind) -> Self {
        Self {
            name: name.into(),
            kind,
            credit_limit_minor: None,
            currency: Currency::default(),
        }
    }

    #[must_use]
    pub fn credit_limit(mut self, credit_limit_minor: i64) -> Self {
        self.credit_limit_minor = Some(credit_limit_minor);
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct UpdateAccountCmd {
    pub name: Option<String>,
    pub credit_limit_minor: Option<Option<i64>>,
    pub archived: Option<bool>,
}

#[derive(Clone, Debug)]
pub struct CreateCategoryCmd {
    pub name: String,
    pub budget_share_pct: Option<f64>,
}

impl CreateCategoryCmd {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            budget_share_pct: None,
        }
    }

    #[must_use]
    pub fn budget_share(mut self, pct: f64) -> Self {
        self.budget_share_pct = Some(pct);
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct UpdateCategoryCmd {
    pub name: Option<String>,
    pub budget_share_pct: Option<Option<f64>>,
}

/// Create a transaction on one account.
///
/// `amount_minor` is signed: negative for money leaving the account.
#[derive(Clone, Debug)]
pub struct CreateTransactionCmd {
    pub account_id: Uuid,
    pub amount_minor: i64,
    pub description: String,
    pub transaction_date: NaiveDate,
    pub category_id: Option<Uuid>,
    pub recurring_payment_id: Option<Uuid>,
}

impl CreateTransactionCmd {
    #[must_use]
    pub fn new(
        account_id: Uuid,
        amount_minor: i64,
        description: impl Into<String>,
        transaction_date: NaiveDate,
    ) -> Self {
        Self {
            account_id,
            amount_minor,
            description: description.into(),
            transaction_date,
            category_id: None,
            recurring_payment_id: None,
        }
    }

    #[must_use]
    pub fn category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn recurring_payment(mut self, recurring_payment_id: Uuid) -> Self {
        self.recurring_payment_id = Some(recurring_payment_id);
        self
    }
}

/// Update an existing transaction.
///
/// Setting `account_id` moves the transaction to another account; both
/// accounts are reconciled.
#[derive(Clone, Debug, Default)]
pub struct UpdateTransactionCmd {
    pub account_id: Option<Uuid>,
    pub amount_minor: Option<i64>,
    pub description: Option<String>,
    pub transaction_date: Option<NaiveDate>,
    pub category_id: Option<Option<Uuid>>,
    pub recurring_payment_id: Option<Option<Uuid>>,
}

/// Move money between two accounts of the same user.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    /// Magnitude of the transfer, must be positive.
    pub amount_minor: i64,
    pub description: Option<String>,
    pub transaction_date: NaiveDate,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount_minor: i64,
        transaction_date: NaiveDate,
    ) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount_minor,
            description: None,
            transaction_date,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct CreateRecurringPaymentCmd {
    pub name: String,
    /// Defaults to the normalized `name`.
    pub merchant_pattern: Option<String>,
    pub amount_minor: i64,
    pub frequency: Frequency,
    pub next_due_date: NaiveDate,
    pub account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

impl CreateRecurringPaymentCmd {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        amount_minor: i64,
        frequency: Frequency,
        next_due_date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            merchant_pattern: None,
            amount_minor,
            frequency,
            next_due_date,
            account_id: None,
            category_id: None,
        }
    }

    #[must_use]
    pub fn account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn merchant_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.merchant_pattern = Some(pattern.into());
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct UpdateRecurringPaymentCmd {
    pub name: Option<String>,
    /// Normalized before storing; blank falls back to the payment's name.
    pub merchant_pattern: Option<String>,
    pub amount_minor: Option<i64>,
    pub frequency: Option<Frequency>,
    pub next_due_date: Option<NaiveDate>,
    pub status: Option<RecurringStatus>,
    pub account_id: Option<Option<Uuid>>,
    pub category_id: Option<Option<Uuid>>,
}

#[derive(Clone, Debug)]
pub struct CreateGoalCmd {
    pub name: String,
    pub target_minor: i64,
    pub target_date: Option<NaiveDate>,
    pub priority: GoalPriority,
}

impl CreateGoalCmd {
    #[must_use]
    pub fn new(name: impl Into<String>, target_minor: i64) -> Self {
        Self {
            name: name.into(),
            target_minor,
            target_date: None,
            priority: GoalPriority::Medium,
        }
    }

    #[must_use]
    pub fn target_date(mut self, date: NaiveDate) -> Self {
        self.target_date = Some(date);
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: GoalPriority) -> Self {
        self.priority = priority;
        self
    }
}

/// `paused` toggles between active and paused; completed goals ignore it.
#[derive(Clone, Debug, Default)]
pub struct UpdateGoalCmd {
    pub name: Option<String>,
    pub target_minor: Option<i64>,
    pub target_date: Option<Option<NaiveDate>>,
    pub priority: Option<GoalPriority>,
    pub paused: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct UpdatePreferencesCmd {
    pub credit_alerts: Option<bool>,
    pub payment_reminders: Option<bool>,
    pub goal_alerts: Option<bool>,
    pub utilization_threshold_pct: Option<f64>,
    pub reminder_days_ahead: Option<u32>,
}
