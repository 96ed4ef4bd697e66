use std::collections::BTreeSet;

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Account, CreateAccountCmd, EngineError, ResultEngine, UpdateAccountCmd,
    accounts::{self, validate_credit_limit},
    recurring_payments, transactions,
    util::{fold_text, normalize_required_name},
};

use super::{Engine, with_tx};

impl Engine {
    /// Fails with `ExistingKey` when another account of the user already
    /// has the same name, ignoring case and accents.
    async fn ensure_account_name_free(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let norm = fold_text(name);
        let taken = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .all(db)
            .await?
            .into_iter()
            .any(|m| Some(m.id) != except && fold_text(&m.name) == norm);
        if taken {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }

    pub async fn create_account(
        &self,
        user_id: Uuid,
        cmd: CreateAccountCmd,
    ) -> ResultEngine<Account> {
        let name = normalize_required_name(&cmd.name, "name")?;
        validate_credit_limit(cmd.kind, cmd.credit_limit_minor)?;

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            self.ensure_account_name_free(&db_tx, user_id, &name, None)
                .await?;

            let account = Account::new(
                user_id,
                name,
                cmd.kind,
                cmd.credit_limit_minor,
                cmd.currency,
            );
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;
            tracing::info!(account_id = %account.id, kind = account.kind.as_str(), "account created");
            Ok(account)
        })
    }

    /// Lists the user's accounts by name; archived ones only on request.
    pub async fn list_accounts(
        &self,
        user_id: Uuid,
        include_archived: bool,
    ) -> ResultEngine<Vec<Account>> {
        let mut query = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .order_by_asc(accounts::Column::Name);
        if !include_archived {
            query = query.filter(accounts::Column::Archived.eq(false));
        }
        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    pub async fn account(&self, account_id: Uuid, user_id: Uuid) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id, user_id).await?;
            Account::try_from(model)
        })
    }

    pub async fn update_account(
        &self,
        account_id: Uuid,
        user_id: Uuid,
        cmd: UpdateAccountCmd,
    ) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id, user_id).await?;
            let mut account = Account::try_from(model)?;

            if let Some(name) = cmd.name.as_deref() {
                let name = normalize_required_name(name, "name")?;
                self.ensure_account_name_free(&db_tx, user_id, &name, Some(account_id))
                    .await?;
                account.name = name;
            }
            if let Some(limit) = cmd.credit_limit_minor {
                validate_credit_limit(account.kind, limit)?;
                account.credit_limit_minor = limit;
            }
            if let Some(archived) = cmd.archived {
                account.archived = archived;
            }

            accounts::ActiveModel {
                id: ActiveValue::Set(account.id),
                name: ActiveValue::Set(account.name.clone()),
                credit_limit_minor: ActiveValue::Set(account.credit_limit_minor),
                archived: ActiveValue::Set(account.archived),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            Ok(account)
        })
    }

    /// Deletes an account with its transactions.
    ///
    /// Transfers lose their other side as well, and the accounts on the other
    /// side are reconciled. Recurring payments billed to the account are kept
    /// but detached.
    pub async fn delete_account(&self, account_id: Uuid, user_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account_id, user_id).await?;

            let transfer_ids: Vec<Uuid> = transactions::Entity::find()
                .filter(transactions::Column::AccountId.eq(account_id))
                .filter(transactions::Column::TransferId.is_not_null())
                .all(&db_tx)
                .await?
                .into_iter()
                .filter_map(|m| m.transfer_id)
                .collect();

            let mut touched: BTreeSet<Uuid> = BTreeSet::new();
            if !transfer_ids.is_empty() {
                let counterparts = transactions::Entity::find()
                    .filter(transactions::Column::TransferId.is_in(transfer_ids.clone()))
                    .filter(transactions::Column::AccountId.ne(account_id))
                    .all(&db_tx)
                    .await?;
                touched.extend(counterparts.iter().map(|m| m.account_id));
                transactions::Entity::delete_many()
                    .filter(transactions::Column::TransferId.is_in(transfer_ids))
                    .exec(&db_tx)
                    .await?;
            }

            transactions::Entity::delete_many()
                .filter(transactions::Column::AccountId.eq(account_id))
                .exec(&db_tx)
                .await?;

            recurring_payments::Entity::update_many()
                .col_expr(
                    recurring_payments::Column::AccountId,
                    Expr::value(Option::<Uuid>::None),
                )
                .filter(recurring_payments::Column::AccountId.eq(account_id))
                .exec(&db_tx)
                .await?;

            accounts::Entity::delete_by_id(account_id)
                .exec(&db_tx)
                .await?;

            for other in touched {
                self.reconcile_account(&db_tx, other).await?;
            }
            tracing::info!(account_id = %account_id, "account deleted");
            Ok(())
        })
    }
}
