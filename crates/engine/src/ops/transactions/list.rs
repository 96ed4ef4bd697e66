use base64::Engine as _;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{Condition, QueryFilter, QueryOrder, QuerySelect, Select, TransactionTrait, prelude::*};

use crate::{EngineError, ResultEngine, Transaction, accounts, transactions};

use super::super::{Engine, with_tx};

/// Filters for listing transactions.
///
/// `from` and `to` are both inclusive.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl TransactionListFilter {
    fn validate(&self) -> ResultEngine<()> {
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from > to
        {
            return Err(EngineError::field("from", "must not be after to"));
        }
        Ok(())
    }

    fn apply(&self, mut query: Select<transactions::Entity>) -> Select<transactions::Entity> {
        if let Some(account_id) = self.account_id {
            query = query.filter(transactions::Column::AccountId.eq(account_id));
        }
        if let Some(category_id) = self.category_id {
            query = query.filter(transactions::Column::CategoryId.eq(category_id));
        }
        if let Some(from) = self.from {
            query = query.filter(transactions::Column::TransactionDate.gte(from));
        }
        if let Some(to) = self.to {
            query = query.filter(transactions::Column::TransactionDate.lte(to));
        }
        query
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TransactionsCursor {
    transaction_date: NaiveDate,
    transaction_id: Uuid,
}

impl TransactionsCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))
    }
}

impl Engine {
    fn user_transactions(&self, user_id: Uuid) -> Select<transactions::Entity> {
        transactions::Entity::find()
            .inner_join(accounts::Entity)
            .filter(accounts::Column::UserId.eq(user_id))
            .order_by_desc(transactions::Column::TransactionDate)
            .order_by_desc(transactions::Column::Id)
    }

    /// Lists the user's transactions with cursor-based pagination.
    ///
    /// Pagination is newest → older by `(transaction_date DESC, id DESC)`.
    pub async fn list_transactions_page(
        &self,
        user_id: Uuid,
        limit: u64,
        cursor: Option<&str>,
        filter: &TransactionListFilter,
    ) -> ResultEngine<(Vec<Transaction>, Option<String>)> {
        filter.validate()?;
        with_tx!(self, |db_tx| {
            if let Some(account_id) = filter.account_id {
                self.require_account(&db_tx, account_id, user_id).await?;
            }

            let limit_plus_one = limit.saturating_add(1);
            let mut query = filter
                .apply(self.user_transactions(user_id))
                .limit(limit_plus_one);

            if let Some(cursor) = cursor {
                let cursor = TransactionsCursor::decode(cursor)?;
                query = query.filter(
                    Condition::any()
                        .add(transactions::Column::TransactionDate.lt(cursor.transaction_date))
                        .add(
                            Condition::all()
                                .add(
                                    transactions::Column::TransactionDate
                                        .eq(cursor.transaction_date),
                                )
                                .add(transactions::Column::Id.lt(cursor.transaction_id)),
                        ),
                );
            }

            let rows = query.all(&db_tx).await?;
            let has_more = rows.len() > limit as usize;
            let out: Vec<Transaction> = rows
                .into_iter()
                .take(limit as usize)
                .map(Transaction::from)
                .collect();

            let next_cursor = if has_more {
                out.last()
                    .map(|tx| TransactionsCursor {
                        transaction_date: tx.transaction_date,
                        transaction_id: tx.id,
                    })
                    .map(|c| c.encode())
                    .transpose()?
            } else {
                None
            };

            Ok((out, next_cursor))
        })
    }

    /// Lists every transaction matching `filter`, newest first.
    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        filter.validate()?;
        with_tx!(self, |db_tx| {
            if let Some(account_id) = filter.account_id {
                self.require_account(&db_tx, account_id, user_id).await?;
            }
            let rows = filter
                .apply(self.user_transactions(user_id))
                .all(&db_tx)
                .await?;
            Ok(rows.into_iter().map(Transaction::from).collect())
        })
    }
}
