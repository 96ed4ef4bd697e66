use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    CreateRecurringPaymentCmd, DetectedPattern, EngineError, RecurringPayment, RecurringSource,
    RecurringStatus, ResultEngine, Transaction, UpdateRecurringPaymentCmd,
    recurring::{detect_patterns, normalize_merchant},
    recurring_payments, transactions,
    util::normalize_required_name,
};

use super::{Engine, with_tx};

fn validate_amount(amount_minor: i64) -> ResultEngine<()> {
    if amount_minor <= 0 {
        return Err(EngineError::field(
            "amount_minor",
            "must be greater than zero",
        ));
    }
    Ok(())
}

fn merchant_pattern_for(name: &str, explicit: Option<&str>) -> String {
    let pattern = explicit.map(normalize_merchant).unwrap_or_default();
    if pattern.is_empty() {
        normalize_merchant(name)
    } else {
        pattern
    }
}

impl Engine {
    pub async fn create_recurring_payment(
        &self,
        user_id: Uuid,
        cmd: CreateRecurringPaymentCmd,
    ) -> ResultEngine<RecurringPayment> {
        let name = normalize_required_name(&cmd.name, "name")?;
        validate_amount(cmd.amount_minor)?;

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            if let Some(account_id) = cmd.account_id {
                self.require_account(&db_tx, account_id, user_id).await?;
            }
            if let Some(category_id) = cmd.category_id {
                self.require_category(&db_tx, category_id, user_id).await?;
            }

            let payment = RecurringPayment {
                id: Uuid::new_v4(),
                user_id,
                account_id: cmd.account_id,
                category_id: cmd.category_id,
                merchant_pattern: merchant_pattern_for(&name, cmd.merchant_pattern.as_deref()),
                name,
                amount_minor: cmd.amount_minor,
                frequency: cmd.frequency,
                next_due_date: cmd.next_due_date,
                last_payment_date: None,
                confidence: 1.0,
                status: RecurringStatus::Active,
                source: RecurringSource::Manual,
                created_at: Utc::now(),
            };
            recurring_payments::ActiveModel::from(&payment)
                .insert(&db_tx)
                .await?;
            Ok(payment)
        })
    }

    /// Lists recurring payments by next due date, optionally by status.
    pub async fn list_recurring_payments(
        &self,
        user_id: Uuid,
        status: Option<RecurringStatus>,
    ) -> ResultEngine<Vec<RecurringPayment>> {
        let mut query = recurring_payments::Entity::find()
            .filter(recurring_payments::Column::UserId.eq(user_id))
            .order_by_asc(recurring_payments::Column::NextDueDate)
            .order_by_asc(recurring_payments::Column::Name);
        if let Some(status) = status {
            query = query.filter(recurring_payments::Column::Status.eq(status.as_str()));
        }
        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(RecurringPayment::try_from)
            .collect()
    }

    pub async fn recurring_payment(
        &self,
        recurring_payment_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<RecurringPayment> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_recurring_payment(&db_tx, recurring_payment_id, user_id)
                .await?;
            RecurringPayment::try_from(model)
        })
    }

    pub async fn update_recurring_payment(
        &self,
        recurring_payment_id: Uuid,
        user_id: Uuid,
        cmd: UpdateRecurringPaymentCmd,
    ) -> ResultEngine<RecurringPayment> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_recurring_payment(&db_tx, recurring_payment_id, user_id)
                .await?;
            let mut payment = RecurringPayment::try_from(model)?;

            if let Some(name) = cmd.name.as_deref() {
                payment.name = normalize_required_name(name, "name")?;
            }
            if let Some(pattern) = cmd.merchant_pattern.as_deref() {
                payment.merchant_pattern = merchant_pattern_for(&payment.name, Some(pattern));
            }
            if let Some(amount_minor) = cmd.amount_minor {
                validate_amount(amount_minor)?;
                payment.amount_minor = amount_minor;
            }
            if let Some(frequency) = cmd.frequency {
                payment.frequency = frequency;
            }
            if let Some(date) = cmd.next_due_date {
                payment.next_due_date = date;
            }
            if let Some(status) = cmd.status {
                payment.status = status;
            }
            if let Some(account_id) = cmd.account_id {
                if let Some(id) = account_id {
                    self.require_account(&db_tx, id, user_id).await?;
                }
                payment.account_id = account_id;
            }
            if let Some(category_id) = cmd.category_id {
                if let Some(id) = category_id {
                    self.require_category(&db_tx, id, user_id).await?;
                }
                payment.category_id = category_id;
            }

            recurring_payments::ActiveModel::from(&payment)
                .update(&db_tx)
                .await?;
            Ok(payment)
        })
    }

    /// Deletes a recurring payment; its linked transactions are kept.
    pub async fn delete_recurring_payment(
        &self,
        recurring_payment_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_recurring_payment(&db_tx, recurring_payment_id, user_id)
                .await?;
            transactions::Entity::update_many()
                .col_expr(
                    transactions::Column::RecurringPaymentId,
                    Expr::value(Option::<Uuid>::None),
                )
                .filter(transactions::Column::RecurringPaymentId.eq(recurring_payment_id))
                .exec(&db_tx)
                .await?;
            recurring_payments::Entity::delete_by_id(recurring_payment_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Runs detection over the history of one account and drops the patterns
    /// the user already tracks, whatever their status.
    async fn detect_untracked(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        user_id: Uuid,
        as_of: NaiveDate,
    ) -> ResultEngine<Vec<DetectedPattern>> {
        self.require_account(db, account_id, user_id).await?;

        let history: Vec<Transaction> = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id))
            .order_by_asc(transactions::Column::TransactionDate)
            .all(db)
            .await?
            .into_iter()
            .map(Transaction::from)
            .collect();

        let tracked: HashSet<String> = recurring_payments::Entity::find()
            .filter(recurring_payments::Column::UserId.eq(user_id))
            .all(db)
            .await?
            .into_iter()
            .map(|m| m.merchant_pattern)
            .collect();

        let patterns: Vec<DetectedPattern> =
            detect_patterns(&history, as_of, &self.config.detection)
                .into_iter()
                .filter(|p| !tracked.contains(&p.merchant_pattern))
                .collect();

        tracing::debug!(
            account_id = %account_id,
            history = history.len(),
            detected = patterns.len(),
            "recurring detection finished"
        );
        Ok(patterns)
    }

    /// Detects recurring payments in an account's history without saving
    /// anything.
    pub async fn detect_recurring_payments(
        &self,
        account_id: Uuid,
        user_id: Uuid,
        as_of: NaiveDate,
    ) -> ResultEngine<Vec<DetectedPattern>> {
        with_tx!(self, |db_tx| {
            self.detect_untracked(&db_tx, account_id, user_id, as_of)
                .await
        })
    }

    /// Detects recurring payments and starts tracking each of them.
    ///
    /// The matched transactions are linked to the new payment.
    pub async fn track_detected_payments(
        &self,
        account_id: Uuid,
        user_id: Uuid,
        as_of: NaiveDate,
    ) -> ResultEngine<Vec<RecurringPayment>> {
        with_tx!(self, |db_tx| {
            let patterns = self
                .detect_untracked(&db_tx, account_id, user_id, as_of)
                .await?;

            let mut created = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let payment = RecurringPayment {
                    id: Uuid::new_v4(),
                    user_id,
                    account_id: Some(pattern.account_id),
                    category_id: pattern.category_id,
                    name: pattern.display_name.clone(),
                    merchant_pattern: pattern.merchant_pattern.clone(),
                    amount_minor: pattern.typical_amount_minor,
                    frequency: pattern.frequency,
                    next_due_date: pattern.next_due_date,
                    last_payment_date: Some(pattern.last_date),
                    confidence: pattern.confidence,
                    status: RecurringStatus::Active,
                    source: RecurringSource::Detected,
                    created_at: Utc::now(),
                };
                recurring_payments::ActiveModel::from(&payment)
                    .insert(&db_tx)
                    .await?;
                transactions::Entity::update_many()
                    .col_expr(
                        transactions::Column::RecurringPaymentId,
                        Expr::value(Some(payment.id)),
                    )
                    .filter(transactions::Column::Id.is_in(pattern.transaction_ids.clone()))
                    .exec(&db_tx)
                    .await?;
                tracing::info!(
                    recurring_payment_id = %payment.id,
                    pattern = %payment.merchant_pattern,
                    confidence = payment.confidence,
                    "detected recurring payment tracked"
                );
                created.push(payment);
            }
            Ok(created)
        })
    }
}
