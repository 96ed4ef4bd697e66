//! Recurring payments: subscriptions, bills and other charges that repeat on
//! a fixed cadence.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Quarterly,
        Frequency::Yearly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    /// Canonical length of one period in days.
    pub fn nominal_days(self) -> f64 {
        match self {
            Self::Weekly => 7.0,
            Self::Monthly => 30.0,
            Self::Quarterly => 91.0,
            Self::Yearly => 365.0,
        }
    }

    /// Accepted distance in days between an observed interval and
    /// `nominal_days`.
    pub fn tolerance_days(self) -> f64 {
        match self {
            Self::Weekly => 3.0,
            Self::Monthly => 5.0,
            Self::Quarterly => 15.0,
            Self::Yearly => 30.0,
        }
    }

    /// `(num, den)` such that `amount * num / den` is the monthly equivalent.
    pub(crate) fn monthly_ratio(self) -> (i64, i64) {
        match self {
            Self::Weekly => (52, 12),
            Self::Monthly => (1, 1),
            Self::Quarterly => (1, 3),
            Self::Yearly => (1, 12),
        }
    }
}

impl TryFrom<&str> for Frequency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" => Ok(Self::Yearly),
            other => Err(EngineError::field(
                "frequency",
                format!("invalid frequency: {other}"),
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurringStatus {
    Active,
    Paused,
    Cancelled,
}

impl RecurringStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<&str> for RecurringStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::field(
                "status",
                format!("invalid status: {other}"),
            )),
        }
    }
}

/// Where a recurring payment came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurringSource {
    Manual,
    Detected,
}

impl RecurringSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Detected => "detected",
        }
    }
}

impl TryFrom<&str> for RecurringSource {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "manual" => Ok(Self::Manual),
            "detected" => Ok(Self::Detected),
            other => Err(EngineError::field(
                "source",
                format!("invalid source: {other}"),
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecurringPayment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub merchant_pattern: String,
    /// Magnitude of one payment, always positive.
    pub amount_minor: i64,
    pub frequency: Frequency,
    pub next_due_date: NaiveDate,
    pub last_payment_date: Option<NaiveDate>,
    pub confidence: f64,
    pub status: RecurringStatus,
    pub source: RecurringSource,
    pub created_at: DateTime<Utc>,
}

impl RecurringPayment {
    pub fn is_active(&self) -> bool {
        self.status == RecurringStatus::Active
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recurring_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub merchant_pattern: String,
    pub amount_minor: i64,
    pub frequency: String,
    pub next_due_date: Date,
    pub last_payment_date: Option<Date>,
    pub confidence: f64,
    pub status: String,
    pub source: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&RecurringPayment> for ActiveModel {
    fn from(value: &RecurringPayment) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id),
            account_id: ActiveValue::Set(value.account_id),
            category_id: ActiveValue::Set(value.category_id),
            name: ActiveValue::Set(value.name.clone()),
            merchant_pattern: ActiveValue::Set(value.merchant_pattern.clone()),
            amount_minor: ActiveValue::Set(value.amount_minor),
            frequency: ActiveValue::Set(value.frequency.as_str().to_string()),
            next_due_date: ActiveValue::Set(value.next_due_date),
            last_payment_date: ActiveValue::Set(value.last_payment_date),
            confidence: ActiveValue::Set(value.confidence),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            source: ActiveValue::Set(value.source.as_str().to_string()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for RecurringPayment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            account_id: model.account_id,
            category_id: model.category_id,
            name: model.name,
            merchant_pattern: model.merchant_pattern,
            amount_minor: model.amount_minor,
            frequency: Frequency::try_from(model.frequency.as_str())?,
            next_due_date: model.next_due_date,
            last_payment_date: model.last_payment_date,
            confidence: model.confidence,
            status: RecurringStatus::try_from(model.status.as_str())?,
            source: RecurringSource::try_from(model.source.as_str())?,
            created_at: model.created_at,
        })
    }
}
