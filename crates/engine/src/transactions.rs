//! Transaction primitives.
//!
//! A `Transaction` is a signed movement of money on one account. Debits are
//! stored with a negative amount, credits with a positive one, so an
//! account's balance is always the plain sum of its transactions.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub category_id: Option<Uuid>,
    pub amount_minor: i64,
    pub description: String,
    pub transaction_date: NaiveDate,
    pub recurring_payment_id: Option<Uuid>,
    /// Shared by the two sides of a transfer between accounts.
    pub transfer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        account_id: Uuid,
        amount_minor: i64,
        description: String,
        transaction_date: NaiveDate,
    ) -> ResultEngine<Self> {
        if amount_minor == 0 {
            return Err(EngineError::field("amount_minor", "must not be zero"));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            account_id,
            category_id: None,
            amount_minor,
            description,
            transaction_date,
            recurring_payment_id: None,
            transfer_id: None,
            created_at: Utc::now(),
        })
    }

    pub fn is_debit(&self) -> bool {
        self.amount_minor < 0
    }

    pub fn is_transfer(&self) -> bool {
        self.transfer_id.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub category_id: Option<Uuid>,
    pub amount_minor: i64,
    pub description: String,
    pub transaction_date: Date,
    pub recurring_payment_id: Option<Uuid>,
    pub transfer_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Account,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id),
            account_id: ActiveValue::Set(tx.account_id),
            category_id: ActiveValue::Set(tx.category_id),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            description: ActiveValue::Set(tx.description.clone()),
            transaction_date: ActiveValue::Set(tx.transaction_date),
            recurring_payment_id: ActiveValue::Set(tx.recurring_payment_id),
            transfer_id: ActiveValue::Set(tx.transfer_id),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl From<Model> for Transaction {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            category_id: model.category_id,
            amount_minor: model.amount_minor,
            description: model.description,
            transaction_date: model.transaction_date,
            recurring_payment_id: model.recurring_payment_id,
            transfer_id: model.transfer_id,
            created_at: model.created_at,
        }
    }
}
