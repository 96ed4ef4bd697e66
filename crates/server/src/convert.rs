//! Mapping between engine values and API views.

use api_types::{
    Currency,
    account::{AccountKind, AccountView},
    budget::{
        BudgetImpactResponse, CategoryImpactView, ProjectedPaymentView, ProjectionView,
        SuggestionKind, SuggestionView,
    },
    category::CategoryView,
    goal::{GoalPriority, GoalStatus, GoalView},
    notification::{NotificationKind, NotificationView, PreferencesView},
    recurring::{
        DetectedPatternView, Frequency, RecurringPaymentView, RecurringSource, RecurringStatus,
    },
    transaction::TransactionView,
};
use chrono::NaiveDate;

pub fn currency(currency: engine::Currency) -> Currency {
    match currency {
        engine::Currency::Usd => Currency::Usd,
        engine::Currency::Eur => Currency::Eur,
        engine::Currency::Gbp => Currency::Gbp,
    }
}

pub fn currency_in(currency: Currency) -> engine::Currency {
    match currency {
        Currency::Usd => engine::Currency::Usd,
        Currency::Eur => engine::Currency::Eur,
        Currency::Gbp => engine::Currency::Gbp,
    }
}

pub fn account_kind(kind: engine::AccountKind) -> AccountKind {
    match kind {
        engine::AccountKind::Checking => AccountKind::Checking,
        engine::AccountKind::Savings => AccountKind::Savings,
        engine::AccountKind::Credit => AccountKind::Credit,
        engine::AccountKind::Cash => AccountKind::Cash,
        engine::AccountKind::Investment => AccountKind::Investment,
    }
}

pub fn account_kind_in(kind: AccountKind) -> engine::AccountKind {
    match kind {
        AccountKind::Checking => engine::AccountKind::Checking,
        AccountKind::Savings => engine::AccountKind::Savings,
        AccountKind::Credit => engine::AccountKind::Credit,
        AccountKind::Cash => engine::AccountKind::Cash,
        AccountKind::Investment => engine::AccountKind::Investment,
    }
}

pub fn frequency(frequency: engine::Frequency) -> Frequency {
    match frequency {
        engine::Frequency::Weekly => Frequency::Weekly,
        engine::Frequency::Monthly => Frequency::Monthly,
        engine::Frequency::Quarterly => Frequency::Quarterly,
        engine::Frequency::Yearly => Frequency::Yearly,
    }
}

pub fn frequency_in(frequency: Frequency) -> engine::Frequency {
    match frequency {
        Frequency::Weekly => engine::Frequency::Weekly,
        Frequency::Monthly => engine::Frequency::Monthly,
        Frequency::Quarterly => engine::Frequency::Quarterly,
        Frequency::Yearly => engine::Frequency::Yearly,
    }
}

pub fn recurring_status(status: engine::RecurringStatus) -> RecurringStatus {
    match status {
        engine::RecurringStatus::Active => RecurringStatus::Active,
        engine::RecurringStatus::Paused => RecurringStatus::Paused,
        engine::RecurringStatus::Cancelled => RecurringStatus::Cancelled,
    }
}

pub fn recurring_status_in(status: RecurringStatus) -> engine::RecurringStatus {
    match status {
        RecurringStatus::Active => engine::RecurringStatus::Active,
        RecurringStatus::Paused => engine::RecurringStatus::Paused,
        RecurringStatus::Cancelled => engine::RecurringStatus::Cancelled,
    }
}

pub fn goal_priority_in(priority: GoalPriority) -> engine::GoalPriority {
    match priority {
        GoalPriority::Low => engine::GoalPriority::Low,
        GoalPriority::Medium => engine::GoalPriority::Medium,
        GoalPriority::High => engine::GoalPriority::High,
    }
}

pub fn account(account: engine::Account) -> AccountView {
    AccountView {
        id: account.id,
        utilization_pct: account.utilization_pct(),
        name: account.name,
        kind: account_kind(account.kind),
        balance_minor: account.balance_minor,
        credit_limit_minor: account.credit_limit_minor,
        currency: currency(account.currency),
        archived: account.archived,
        created_at: account.created_at,
    }
}

pub fn category(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
        budget_share_pct: category.budget_share_pct,
    }
}

pub fn transaction(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        account_id: tx.account_id,
        category_id: tx.category_id,
        amount_minor: tx.amount_minor,
        description: tx.description,
        transaction_date: tx.transaction_date,
        recurring_payment_id: tx.recurring_payment_id,
        transfer_id: tx.transfer_id,
        created_at: tx.created_at,
    }
}

pub fn recurring_payment(payment: engine::RecurringPayment) -> RecurringPaymentView {
    RecurringPaymentView {
        id: payment.id,
        account_id: payment.account_id,
        category_id: payment.category_id,
        monthly_equivalent_minor: engine::budget::monthly_equivalent(
            payment.amount_minor,
            payment.frequency,
        )
        .minor(),
        name: payment.name,
        merchant_pattern: payment.merchant_pattern,
        amount_minor: payment.amount_minor,
        frequency: frequency(payment.frequency),
        next_due_date: payment.next_due_date,
        last_payment_date: payment.last_payment_date,
        confidence: payment.confidence,
        status: recurring_status(payment.status),
        source: match payment.source {
            engine::RecurringSource::Manual => RecurringSource::Manual,
            engine::RecurringSource::Detected => RecurringSource::Detected,
        },
        created_at: payment.created_at,
    }
}

pub fn detected_pattern(pattern: engine::DetectedPattern) -> DetectedPatternView {
    DetectedPatternView {
        merchant_pattern: pattern.merchant_pattern,
        display_name: pattern.display_name,
        account_id: pattern.account_id,
        category_id: pattern.category_id,
        frequency: frequency(pattern.frequency),
        typical_amount_minor: pattern.typical_amount_minor,
        occurrences: pattern.occurrences,
        first_date: pattern.first_date,
        last_date: pattern.last_date,
        next_due_date: pattern.next_due_date,
        confidence: pattern.confidence,
    }
}

pub fn budget_report(report: engine::BudgetReport) -> BudgetImpactResponse {
    let engine::BudgetReport { impact, projection } = report;
    BudgetImpactResponse {
        total_monthly_minor: impact.total_monthly_minor,
        total_yearly_minor: impact.total_yearly_minor,
        categories: impact
            .categories
            .into_iter()
            .map(|c| CategoryImpactView {
                category_id: c.category_id,
                name: c.name,
                monthly_minor: c.monthly_minor,
                yearly_minor: c.yearly_minor,
                share_pct: c.share_pct,
                budget_share_pct: c.budget_share_pct,
                payment_count: c.payment_count,
            })
            .collect(),
        suggestions: impact
            .suggestions
            .into_iter()
            .map(|s| SuggestionView {
                kind: match s.kind {
                    engine::SuggestionKind::Duplicate => SuggestionKind::Duplicate,
                    engine::SuggestionKind::CategoryOverspend => SuggestionKind::CategoryOverspend,
                },
                message: s.message,
                payment_ids: s.payment_ids,
                category_id: s.category_id,
                potential_savings_minor: s.potential_savings_minor,
            })
            .collect(),
        projection: ProjectionView {
            from: projection.from,
            to: projection.to,
            total_minor: projection.total_minor,
            payments: projection
                .payments
                .into_iter()
                .map(|p| ProjectedPaymentView {
                    payment_id: p.payment_id,
                    name: p.name,
                    due_date: p.due_date,
                    amount_minor: p.amount_minor,
                })
                .collect(),
        },
    }
}

pub fn goal(goal: engine::SavingsGoal, today: NaiveDate) -> GoalView {
    GoalView {
        id: goal.id,
        remaining_minor: goal.remaining().minor(),
        progress_percentage: goal.progress_percentage(),
        monthly_contribution_needed_minor: goal
            .monthly_contribution_needed(today)
            .map(|m| m.minor()),
        name: goal.name,
        target_minor: goal.target_minor,
        current_minor: goal.current_minor,
        target_date: goal.target_date,
        priority: match goal.priority {
            engine::GoalPriority::Low => GoalPriority::Low,
            engine::GoalPriority::Medium => GoalPriority::Medium,
            engine::GoalPriority::High => GoalPriority::High,
        },
        status: match goal.status {
            engine::GoalStatus::Active => GoalStatus::Active,
            engine::GoalStatus::Paused => GoalStatus::Paused,
            engine::GoalStatus::Completed => GoalStatus::Completed,
        },
        created_at: goal.created_at,
    }
}

pub fn notification(notification: engine::Notification) -> NotificationView {
    NotificationView {
        id: notification.id,
        kind: match notification.kind {
            engine::NotificationKind::CreditUtilization => NotificationKind::CreditUtilization,
            engine::NotificationKind::PaymentReminder => NotificationKind::PaymentReminder,
            engine::NotificationKind::GoalCompleted => NotificationKind::GoalCompleted,
        },
        title: notification.title,
        message: notification.message,
        read: notification.read,
        created_at: notification.created_at,
    }
}

pub fn preferences(prefs: engine::NotificationPreferences) -> PreferencesView {
    PreferencesView {
        credit_alerts: prefs.credit_alerts,
        payment_reminders: prefs.payment_reminders,
        goal_alerts: prefs.goal_alerts,
        utilization_threshold_pct: prefs.utilization_threshold_pct,
        reminder_days_ahead: prefs.reminder_days_ahead,
    }
}
