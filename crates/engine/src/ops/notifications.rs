//! Notification storage, preferences and the checks that raise alerts.
//!
//! Notifications are written inside the caller's DB transaction and handed to
//! the [`Notifier`](crate::Notifier) only after the commit.

use chrono::{Days, NaiveDate};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Account, EngineError, Money, Notification, NotificationKind, NotificationPreferences,
    RecurringPayment, RecurringStatus, ResultEngine, UpdatePreferencesCmd, accounts,
    notifications::{self, preferences},
    recurring_payments, utilization,
    util::Violations,
};

use super::{Engine, with_tx};

const MAX_REMINDER_DAYS_AHEAD: u32 = 60;

/// Alerts raised by [`Engine::run_notification_checks`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationCheck {
    pub credit_alerts: Vec<Notification>,
    pub payment_reminders: Vec<Notification>,
}

impl Engine {
    pub(super) fn default_preferences(&self) -> NotificationPreferences {
        NotificationPreferences {
            credit_alerts: true,
            payment_reminders: true,
            goal_alerts: true,
            utilization_threshold_pct: self.config.alerts.utilization_threshold_pct,
            reminder_days_ahead: self.config.alerts.reminder_days_ahead,
        }
    }

    pub(super) async fn load_preferences(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<NotificationPreferences> {
        Ok(preferences::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .map(NotificationPreferences::from)
            .unwrap_or_else(|| self.default_preferences()))
    }

    /// Stores `notification` unless an unread one with the same dedupe key
    /// already exists. Returns the stored notification.
    pub(super) async fn insert_notification(
        &self,
        db: &DatabaseTransaction,
        notification: Notification,
    ) -> ResultEngine<Option<Notification>> {
        if let Some(key) = notification.dedupe_key.as_deref() {
            let pending = notifications::Entity::find()
                .filter(notifications::Column::UserId.eq(notification.user_id))
                .filter(notifications::Column::DedupeKey.eq(key))
                .filter(notifications::Column::Read.eq(false))
                .one(db)
                .await?;
            if pending.is_some() {
                tracing::debug!(dedupe_key = key, "notification already pending");
                return Ok(None);
            }
        }
        notifications::ActiveModel::from(&notification)
            .insert(db)
            .await?;
        Ok(Some(notification))
    }

    pub(super) fn deliver(&self, notifications: &[Notification]) {
        for notification in notifications {
            self.notifier.deliver(notification);
        }
    }

    /// Lists notifications, newest first.
    pub async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> ResultEngine<Vec<Notification>> {
        let mut query = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .order_by_desc(notifications::Column::CreatedAt)
            .order_by_desc(notifications::Column::Id);
        if unread_only {
            query = query.filter(notifications::Column::Read.eq(false));
        }
        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Notification::try_from)
            .collect()
    }

    pub async fn mark_notification_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<Notification> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_notification(&db_tx, notification_id, user_id)
                .await?;
            let mut notification = Notification::try_from(model)?;
            if !notification.read {
                notifications::ActiveModel {
                    id: ActiveValue::Set(notification_id),
                    read: ActiveValue::Set(true),
                    ..Default::default()
                }
                .update(&db_tx)
                .await?;
                notification.read = true;
            }
            Ok(notification)
        })
    }

    /// Marks every unread notification as read. Returns how many changed.
    pub async fn mark_all_notifications_read(&self, user_id: Uuid) -> ResultEngine<u64> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::Read, Expr::value(true))
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::Read.eq(false))
            .exec(&self.database)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete_notification(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_notification(&db_tx, notification_id, user_id)
                .await?;
            notifications::Entity::delete_by_id(notification_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Stored preferences, or the configured defaults.
    pub async fn notification_preferences(
        &self,
        user_id: Uuid,
    ) -> ResultEngine<NotificationPreferences> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            self.load_preferences(&db_tx, user_id).await
        })
    }

    pub async fn update_notification_preferences(
        &self,
        user_id: Uuid,
        cmd: UpdatePreferencesCmd,
    ) -> ResultEngine<NotificationPreferences> {
        let mut v = Violations::default();
        v.check(
            cmd.utilization_threshold_pct
                .is_none_or(|pct| pct > 0.0 && pct <= 100.0),
            "utilization_threshold_pct",
            "must be greater than 0 and at most 100",
        );
        v.check(
            cmd.reminder_days_ahead
                .is_none_or(|days| days <= MAX_REMINDER_DAYS_AHEAD),
            "reminder_days_ahead",
            "must be at most 60",
        );
        v.finish()?;

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let exists = preferences::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .is_some();
            let mut prefs = self.load_preferences(&db_tx, user_id).await?;

            if let Some(value) = cmd.credit_alerts {
                prefs.credit_alerts = value;
            }
            if let Some(value) = cmd.payment_reminders {
                prefs.payment_reminders = value;
            }
            if let Some(value) = cmd.goal_alerts {
                prefs.goal_alerts = value;
            }
            if let Some(value) = cmd.utilization_threshold_pct {
                prefs.utilization_threshold_pct = value;
            }
            if let Some(value) = cmd.reminder_days_ahead {
                prefs.reminder_days_ahead = value;
            }

            let model = preferences::ActiveModel {
                user_id: ActiveValue::Set(user_id),
                credit_alerts: ActiveValue::Set(prefs.credit_alerts),
                payment_reminders: ActiveValue::Set(prefs.payment_reminders),
                goal_alerts: ActiveValue::Set(prefs.goal_alerts),
                utilization_threshold_pct: ActiveValue::Set(prefs.utilization_threshold_pct),
                reminder_days_ahead: ActiveValue::Set(prefs.reminder_days_ahead as i32),
            };
            if exists {
                model.update(&db_tx).await?;
            } else {
                model.insert(&db_tx).await?;
            }
            Ok(prefs)
        })
    }

    async fn credit_alerts_in(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
        prefs: &NotificationPreferences,
    ) -> ResultEngine<Vec<Notification>> {
        if !prefs.credit_alerts {
            return Ok(Vec::new());
        }
        let accounts: Vec<Account> = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .filter(accounts::Column::Kind.eq(crate::AccountKind::Credit.as_str()))
            .filter(accounts::Column::Archived.eq(false))
            .order_by_asc(accounts::Column::Name)
            .all(db)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect::<ResultEngine<_>>()?;

        let mut created = Vec::new();
        for account in accounts {
            let Some(limit) = account.credit_limit_minor else {
                continue;
            };
            if !utilization::exceeds_threshold(
                account.balance_minor,
                limit,
                prefs.utilization_threshold_pct,
            ) {
                continue;
            }
            let pct = utilization::utilization_pct(account.balance_minor, limit);
            let notification = Notification::new(
                user_id,
                NotificationKind::CreditUtilization,
                format!("High credit utilization on {}", account.name),
                format!(
                    "{} is at {pct:.1}% of its credit limit, above your {:.1}% threshold.",
                    account.name, prefs.utilization_threshold_pct
                ),
            )
            .dedupe_key(format!("credit_utilization:{}", account.id));
            if let Some(stored) = self.insert_notification(db, notification).await? {
                tracing::info!(account_id = %account.id, utilization_pct = pct, "credit utilization alert");
                created.push(stored);
            }
        }
        Ok(created)
    }

    async fn payment_reminders_in(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
        today: NaiveDate,
        prefs: &NotificationPreferences,
    ) -> ResultEngine<Vec<Notification>> {
        if !prefs.payment_reminders {
            return Ok(Vec::new());
        }
        let until = today
            .checked_add_days(Days::new(u64::from(prefs.reminder_days_ahead)))
            .ok_or_else(|| EngineError::field("today", "date out of range"))?;
        let payments: Vec<RecurringPayment> = recurring_payments::Entity::find()
            .filter(recurring_payments::Column::UserId.eq(user_id))
            .filter(recurring_payments::Column::Status.eq(RecurringStatus::Active.as_str()))
            .filter(recurring_payments::Column::NextDueDate.gte(today))
            .filter(recurring_payments::Column::NextDueDate.lte(until))
            .order_by_asc(recurring_payments::Column::NextDueDate)
            .all(db)
            .await?
            .into_iter()
            .map(RecurringPayment::try_from)
            .collect::<ResultEngine<_>>()?;

        let mut created = Vec::new();
        for payment in payments {
            let days_left = (payment.next_due_date - today).num_days();
            let when = match days_left {
                0 => "today".to_string(),
                1 => "tomorrow".to_string(),
                n => format!("in {n} days"),
            };
            let notification = Notification::new(
                user_id,
                NotificationKind::PaymentReminder,
                format!("{} is due {when}", payment.name),
                format!(
                    "{} of {} is due on {}.",
                    payment.name,
                    Money::new(payment.amount_minor),
                    payment.next_due_date
                ),
            )
            .dedupe_key(format!(
                "payment_reminder:{}:{}",
                payment.id, payment.next_due_date
            ));
            if let Some(stored) = self.insert_notification(db, notification).await? {
                created.push(stored);
            }
        }
        Ok(created)
    }

    /// Raises one alert per credit account at or above the user's
    /// utilization threshold. Accounts with a pending unread alert are
    /// skipped.
    pub async fn check_credit_utilization(&self, user_id: Uuid) -> ResultEngine<Vec<Notification>> {
        let created = with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let prefs = self.load_preferences(&db_tx, user_id).await?;
            self.credit_alerts_in(&db_tx, user_id, &prefs).await
        })?;
        self.deliver(&created);
        Ok(created)
    }

    /// Reminds the user of active recurring payments due within their
    /// reminder window, once per payment and due date.
    pub async fn send_payment_reminders(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> ResultEngine<Vec<Notification>> {
        let created = with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let prefs = self.load_preferences(&db_tx, user_id).await?;
            self.payment_reminders_in(&db_tx, user_id, today, &prefs)
                .await
        })?;
        self.deliver(&created);
        Ok(created)
    }

    /// Runs every periodic check in one DB transaction.
    pub async fn run_notification_checks(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> ResultEngine<NotificationCheck> {
        let check = with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let prefs = self.load_preferences(&db_tx, user_id).await?;
            let credit_alerts = self.credit_alerts_in(&db_tx, user_id, &prefs).await?;
            let payment_reminders = self
                .payment_reminders_in(&db_tx, user_id, today, &prefs)
                .await?;
            Ok::<_, EngineError>(NotificationCheck {
                credit_alerts,
                payment_reminders,
            })
        })?;
        self.deliver(&check.credit_alerts);
        self.deliver(&check.payment_reminders);
        Ok(check)
    }
}
