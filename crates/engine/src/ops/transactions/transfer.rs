use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{TransactionTrait, prelude::*};

use crate::{
    EngineError, ResultEngine, Transaction, TransferCmd, transactions,
    util::{Violations, normalize_description},
};

use super::super::{Engine, with_tx};

/// The two rows written by a transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResult {
    pub transfer_id: Uuid,
    /// Negative side, on the source account.
    pub debit: Transaction,
    /// Positive side, on the destination account.
    pub credit: Transaction,
}

impl Engine {
    /// Moves money between two accounts of the same user and currency.
    pub async fn transfer(&self, user_id: Uuid, cmd: TransferCmd) -> ResultEngine<TransferResult> {
        let mut v = Violations::default();
        v.check(
            cmd.amount_minor > 0,
            "amount_minor",
            "must be greater than zero",
        );
        v.check(
            cmd.from_account_id != cmd.to_account_id,
            "to_account_id",
            "must differ from from_account_id",
        );
        v.finish()?;
        let description = match cmd.description.as_deref() {
            Some(description) => normalize_description(description)?,
            None => "Transfer".to_string(),
        };

        with_tx!(self, |db_tx| {
            let from = self
                .require_account(&db_tx, cmd.from_account_id, user_id)
                .await?;
            let to = self
                .require_account(&db_tx, cmd.to_account_id, user_id)
                .await?;
            if from.currency != to.currency {
                return Err(EngineError::CurrencyMismatch(format!(
                    "cannot transfer from {} to {}",
                    from.currency, to.currency
                )));
            }

            let transfer_id = Uuid::new_v4();
            let mut debit = Transaction::new(
                from.id,
                -cmd.amount_minor,
                description.clone(),
                cmd.transaction_date,
            )?;
            debit.transfer_id = Some(transfer_id);
            let mut credit =
                Transaction::new(to.id, cmd.amount_minor, description, cmd.transaction_date)?;
            credit.transfer_id = Some(transfer_id);

            transactions::ActiveModel::from(&debit)
                .insert(&db_tx)
                .await?;
            transactions::ActiveModel::from(&credit)
                .insert(&db_tx)
                .await?;
            self.reconcile_account(&db_tx, from.id).await?;
            self.reconcile_account(&db_tx, to.id).await?;

            tracing::info!(
                transfer_id = %transfer_id,
                from_account_id = %from.id,
                to_account_id = %to.id,
                "transfer recorded"
            );
            Ok(TransferResult {
                transfer_id,
                debit,
                credit,
            })
        })
    }
}
