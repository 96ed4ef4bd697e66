pub use accounts::{Account, AccountKind};
pub use budget::{
    BudgetConfig, BudgetImpact, BudgetReport, CategoryImpact, ProjectedPayment,
    SpendingProjection, Suggestion, SuggestionKind,
};
pub use categories::Category;
pub use commands::{
    CreateAccountCmd, CreateCategoryCmd, CreateGoalCmd, CreateRecurringPaymentCmd,
    CreateTransactionCmd, TransferCmd, UpdateAccountCmd, UpdateCategoryCmd, UpdateGoalCmd,
    UpdatePreferencesCmd, UpdateRecurringPaymentCmd, UpdateTransactionCmd,
};
pub use currency::Currency;
pub use error::{EngineError, FieldError};
pub use money::Money;
pub use notifications::{Notification, NotificationKind, NotificationPreferences};
pub use notifier::{LogNotifier, Notifier};
pub use ops::{
    AlertDefaults, Engine, EngineBuilder, EngineConfig, NotificationCheck, TransactionListFilter,
    TransferResult,
};
pub use recurring::{DetectedPattern, DetectionConfig};
pub use recurring_payments::{Frequency, RecurringPayment, RecurringSource, RecurringStatus};
pub use savings_goals::{GoalPriority, GoalStatus, SavingsGoal};
pub use transactions::Transaction;
pub use users::User;

pub mod budget;
mod commands;
mod currency;
mod error;
mod money;
mod notifier;
mod ops;
pub mod recurring;
pub mod utilization;
mod util;

mod accounts;
mod categories;
mod notifications;
mod recurring_payments;
mod savings_goals;
mod sessions;
mod transactions;
mod users;

type ResultEngine<T> = Result<T, EngineError>;
