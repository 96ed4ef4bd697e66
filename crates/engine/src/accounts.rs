//! The module contains `Account` struct and its implementation.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine, utilization};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Checking,
    Savings,
    Credit,
    Cash,
    Investment,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Savings => "savings",
            Self::Credit => "credit",
            Self::Cash => "cash",
            Self::Investment => "investment",
        }
    }
}

impl TryFrom<&str> for AccountKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "checking" => Ok(Self::Checking),
            "savings" => Ok(Self::Savings),
            "credit" => Ok(Self::Credit),
            "cash" => Ok(Self::Cash),
            "investment" => Ok(Self::Investment),
            other => Err(EngineError::field(
                "kind",
                format!("invalid account kind: {other}"),
            )),
        }
    }
}

/// An account.
///
/// An account is a bank account, a credit card, a cash envelope or anything
/// else holding money. Its `balance_minor` is derived from the transaction
/// ledger and is never the source of truth.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub kind: AccountKind,
    pub balance_minor: i64,
    /// Only set for credit accounts.
    pub credit_limit_minor: Option<i64>,
    pub currency: Currency,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        user_id: Uuid,
        name: String,
        kind: AccountKind,
        credit_limit_minor: Option<i64>,
        currency: Currency,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            kind,
            balance_minor: 0,
            credit_limit_minor,
            currency,
            archived: false,
            created_at: Utc::now(),
        }
    }

    pub fn is_credit(&self) -> bool {
        self.kind == AccountKind::Credit
    }

    /// Percentage of the credit limit in use, `None` for non-credit accounts.
    pub fn utilization_pct(&self) -> Option<f64> {
        if !self.is_credit() {
            return None;
        }
        self.credit_limit_minor
            .map(|limit| utilization::utilization_pct(self.balance_minor, limit))
    }
}

/// Validates the kind/credit-limit combination.
pub(crate) fn validate_credit_limit(
    kind: AccountKind,
    credit_limit_minor: Option<i64>,
) -> ResultEngine<()> {
    match (kind, credit_limit_minor) {
        (AccountKind::Credit, Some(limit)) if limit <= 0 => Err(EngineError::field(
            "credit_limit_minor",
            "must be greater than zero",
        )),
        (AccountKind::Credit, _) => Ok(()),
        (_, Some(_)) => Err(EngineError::field(
            "credit_limit_minor",
            "only credit accounts have a credit limit",
        )),
        (_, None) => Ok(()),
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub kind: String,
    pub balance_minor: i64,
    pub credit_limit_minor: Option<i64>,
    pub currency: String,
    pub archived: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(value: &Account) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id),
            name: ActiveValue::Set(value.name.clone()),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            balance_minor: ActiveValue::Set(value.balance_minor),
            credit_limit_minor: ActiveValue::Set(value.credit_limit_minor),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            archived: ActiveValue::Set(value.archived),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            kind: AccountKind::try_from(model.kind.as_str())?,
            balance_minor: model.balance_minor,
            credit_limit_minor: model.credit_limit_minor,
            currency: Currency::try_from(model.currency.as_str())?,
            archived: model.archived,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credit_card(balance_minor: i64) -> Account {
        let mut account = Account::new(
            Uuid::new_v4(),
            "Visa".to_string(),
            AccountKind::Credit,
            Some(100_000),
            Currency::Usd,
        );
        account.balance_minor = balance_minor;
        account
    }

    #[test]
    fn utilization_only_for_credit_accounts() {
        assert_eq!(credit_card(-25_000).utilization_pct(), Some(25.0));
        let checking = Account::new(
            Uuid::new_v4(),
            "Main".to_string(),
            AccountKind::Checking,
            None,
            Currency::Usd,
        );
        assert_eq!(checking.utilization_pct(), None);
    }

    #[test]
    fn credit_limit_rules() {
        assert!(validate_credit_limit(AccountKind::Credit, Some(500)).is_ok());
        assert!(validate_credit_limit(AccountKind::Credit, None).is_ok());
        assert!(validate_credit_limit(AccountKind::Credit, Some(0)).is_err());
        assert!(validate_credit_limit(AccountKind::Checking, Some(500)).is_err());
        assert!(validate_credit_limit(AccountKind::Savings, None).is_ok());
    }

    #[test]
    fn kind_round_trips_through_storage_string() {
        for kind in [
            AccountKind::Checking,
            AccountKind::Savings,
            AccountKind::Credit,
            AccountKind::Cash,
            AccountKind::Investment,
        ] {
            assert_eq!(AccountKind::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(AccountKind::try_from("loan").is_err());
    }
}
