//! Balance reconciliation.
//!
//! An account's stored balance is a cache of the sum of its transactions. It
//! is recomputed from the full ledger inside the same DB transaction as every
//! write that touches the account, never patched with a delta.

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{Money, ResultEngine, accounts, transactions};

use super::{Engine, with_tx};

impl Engine {
    /// Recomputes and stores the balance of one account.
    ///
    /// Fails with `KeyNotFound` (and writes nothing) when the account does not
    /// exist or belongs to another user.
    pub async fn recompute_account_balance(
        &self,
        account_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<Money> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account_id, user_id).await?;
            self.reconcile_account(&db_tx, account_id).await
        })
    }

    /// Recomputes every account of a user. Returns `(account_id, balance)`
    /// pairs ordered by account name.
    pub async fn reconcile_all(&self, user_id: Uuid) -> ResultEngine<Vec<(Uuid, Money)>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let account_ids: Vec<Uuid> = accounts::Entity::find()
                .select_only()
                .column(accounts::Column::Id)
                .filter(accounts::Column::UserId.eq(user_id))
                .order_by_asc(accounts::Column::Name)
                .into_tuple()
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(account_ids.len());
            for account_id in account_ids {
                let balance = self.reconcile_account(&db_tx, account_id).await?;
                out.push((account_id, balance));
            }
            tracing::info!(user_id = %user_id, accounts = out.len(), "balances reconciled");
            Ok(out)
        })
    }

    /// Sums the ledger of `account_id` and stores the result.
    ///
    /// Callers are responsible for the ownership check.
    pub(super) async fn reconcile_account(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<Money> {
        let amounts: Vec<i64> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::AmountMinor)
            .filter(transactions::Column::AccountId.eq(account_id))
            .into_tuple()
            .all(db)
            .await?;
        let balance = Money::checked_sum(amounts.into_iter().map(Money::new))?;

        accounts::ActiveModel {
            id: ActiveValue::Set(account_id),
            balance_minor: ActiveValue::Set(balance.minor()),
            ..Default::default()
        }
        .update(db)
        .await?;

        tracing::debug!(account_id = %account_id, balance = %balance, "account reconciled");
        Ok(balance)
    }
}
