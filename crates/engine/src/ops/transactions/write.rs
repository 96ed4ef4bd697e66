use std::collections::BTreeSet;

use chrono::NaiveDate;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    CreateTransactionCmd, Currency, EngineError, Frequency, ResultEngine, Transaction,
    UpdateTransactionCmd, recurring::predict_next_payment_date, recurring_payments,
    transactions,
    util::{Violations, normalize_description},
};

use super::super::{Engine, with_tx};

impl Engine {
    pub async fn create_transaction(
        &self,
        user_id: Uuid,
        cmd: CreateTransactionCmd,
    ) -> ResultEngine<Transaction> {
        let description = normalize_description(&cmd.description)?;
        let mut tx = Transaction::new(
            cmd.account_id,
            cmd.amount_minor,
            description,
            cmd.transaction_date,
        )?;
        tx.category_id = cmd.category_id;
        tx.recurring_payment_id = cmd.recurring_payment_id;

        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, tx.account_id, user_id).await?;
            let linked = self
                .require_optional_refs(&db_tx, user_id, tx.category_id, tx.recurring_payment_id)
                .await?;

            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            if let Some(payment) = linked {
                self.advance_recurring_payment(&db_tx, payment, tx.transaction_date)
                    .await?;
            }
            self.reconcile_account(&db_tx, tx.account_id).await?;

            tracing::debug!(transaction_id = %tx.id, account_id = %tx.account_id, "transaction created");
            Ok(tx)
        })
    }

    /// Updates a transaction, possibly moving it to another account.
    ///
    /// Both sides of a transfer keep the same amount and accounts; changing
    /// the date of one side moves the other one too.
    pub async fn update_transaction(
        &self,
        transaction_id: Uuid,
        user_id: Uuid,
        cmd: UpdateTransactionCmd,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, transaction_id, user_id)
                .await?;
            let mut tx = Transaction::from(model);
            let old_account_id = tx.account_id;

            if tx.is_transfer() {
                let mut v = Violations::default();
                v.check(
                    cmd.amount_minor.is_none_or(|a| a == tx.amount_minor),
                    "amount_minor",
                    "cannot change the amount of a transfer",
                );
                v.check(
                    cmd.account_id.is_none_or(|a| a == tx.account_id),
                    "account_id",
                    "cannot move a transfer to another account",
                );
                v.finish()?;
            }

            if let Some(account_id) = cmd.account_id
                && account_id != tx.account_id
            {
                let old = self.require_account(&db_tx, old_account_id, user_id).await?;
                let new = self.require_account(&db_tx, account_id, user_id).await?;
                let (old_currency, new_currency) = (
                    Currency::try_from(old.currency.as_str())?,
                    Currency::try_from(new.currency.as_str())?,
                );
                if old_currency != new_currency {
                    return Err(EngineError::CurrencyMismatch(format!(
                        "account currency is {new_currency}, got {old_currency}"
                    )));
                }
                tx.account_id = account_id;
            }
            if let Some(amount_minor) = cmd.amount_minor {
                if amount_minor == 0 {
                    return Err(EngineError::field("amount_minor", "must not be zero"));
                }
                tx.amount_minor = amount_minor;
            }
            if let Some(description) = cmd.description.as_deref() {
                tx.description = normalize_description(description)?;
            }
            if let Some(date) = cmd.transaction_date {
                tx.transaction_date = date;
            }
            if let Some(category_id) = cmd.category_id {
                if let Some(id) = category_id {
                    self.require_category(&db_tx, id, user_id).await?;
                }
                tx.category_id = category_id;
            }
            let mut linked = None;
            if let Some(recurring_payment_id) = cmd.recurring_payment_id {
                if let Some(id) = recurring_payment_id {
                    linked = Some(self.require_recurring_payment(&db_tx, id, user_id).await?);
                }
                tx.recurring_payment_id = recurring_payment_id;
            }

            transactions::ActiveModel::from(&tx).update(&db_tx).await?;

            if let (Some(transfer_id), Some(date)) = (tx.transfer_id, cmd.transaction_date) {
                transactions::Entity::update_many()
                    .col_expr(transactions::Column::TransactionDate, Expr::value(date))
                    .filter(transactions::Column::TransferId.eq(transfer_id))
                    .exec(&db_tx)
                    .await?;
            }
            if let Some(payment) = linked {
                self.advance_recurring_payment(&db_tx, payment, tx.transaction_date)
                    .await?;
            }

            self.reconcile_account(&db_tx, tx.account_id).await?;
            if old_account_id != tx.account_id {
                self.reconcile_account(&db_tx, old_account_id).await?;
            }
            Ok(tx)
        })
    }

    /// Deletes a transaction. Deleting one side of a transfer deletes both.
    pub async fn delete_transaction(&self, transaction_id: Uuid, user_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, transaction_id, user_id)
                .await?;

            let mut touched: BTreeSet<Uuid> = BTreeSet::from([model.account_id]);
            if let Some(transfer_id) = model.transfer_id {
                let sides = transactions::Entity::find()
                    .filter(transactions::Column::TransferId.eq(transfer_id))
                    .all(&db_tx)
                    .await?;
                touched.extend(sides.iter().map(|m| m.account_id));
                transactions::Entity::delete_many()
                    .filter(transactions::Column::TransferId.eq(transfer_id))
                    .exec(&db_tx)
                    .await?;
            } else {
                transactions::Entity::delete_by_id(transaction_id)
                    .exec(&db_tx)
                    .await?;
            }

            for account_id in touched {
                self.reconcile_account(&db_tx, account_id).await?;
            }
            Ok(())
        })
    }

    /// Records a payment of `payment` made on `paid_on`.
    ///
    /// The due date only moves forward, so linking an old transaction never
    /// rewinds it.
    pub(in crate::ops) async fn advance_recurring_payment(
        &self,
        db: &DatabaseTransaction,
        payment: recurring_payments::Model,
        paid_on: NaiveDate,
    ) -> ResultEngine<()> {
        let frequency = Frequency::try_from(payment.frequency.as_str())?;
        let predicted = predict_next_payment_date(paid_on, frequency);
        let next_due_date = payment.next_due_date.max(predicted);
        let last_payment_date = payment
            .last_payment_date
            .map_or(paid_on, |last| last.max(paid_on));

        recurring_payments::ActiveModel {
            id: ActiveValue::Set(payment.id),
            next_due_date: ActiveValue::Set(next_due_date),
            last_payment_date: ActiveValue::Set(Some(last_payment_date)),
            ..Default::default()
        }
        .update(db)
        .await?;

        tracing::debug!(
            recurring_payment_id = %payment.id,
            next_due_date = %next_due_date,
            "recurring payment advanced"
        );
        Ok(())
    }
}
