//! Savings goals.
//!
//! A goal accumulates contributions until `current_minor` reaches
//! `target_minor`, at which point it is completed. Status is derived from the
//! amounts every time the goal is saved, so it can never disagree with them.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalPriority {
    Low,
    Medium,
    High,
}

impl GoalPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl TryFrom<&str> for GoalPriority {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(EngineError::field(
                "priority",
                format!("invalid priority: {other}"),
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Paused,
    Completed,
}

impl GoalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }
}

impl TryFrom<&str> for GoalStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            other => Err(EngineError::field(
                "status",
                format!("invalid status: {other}"),
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub target_minor: i64,
    pub current_minor: i64,
    pub target_date: Option<NaiveDate>,
    pub priority: GoalPriority,
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
}

impl SavingsGoal {
    pub fn new(
        user_id: Uuid,
        name: String,
        target_minor: i64,
        target_date: Option<NaiveDate>,
        priority: GoalPriority,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            target_minor,
            current_minor: 0,
            target_date,
            priority,
            status: GoalStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn is_reached(&self) -> bool {
        self.current_minor >= self.target_minor
    }

    /// Progress towards the target, truncated to one decimal so it shows
    /// 100.0 only once the goal is reached. Not capped at 100.
    pub fn progress_percentage(&self) -> f64 {
        if self.target_minor <= 0 {
            return 100.0;
        }
        let tenths =
            (i128::from(self.current_minor) * 1000).div_euclid(i128::from(self.target_minor));
        tenths as f64 / 10.0
    }

    pub fn remaining(&self) -> Money {
        Money::new((self.target_minor - self.current_minor).max(0))
    }

    /// Amount to set aside each month to hit the target date.
    ///
    /// Counts whole months left (at least one); `None` without a target date.
    pub fn monthly_contribution_needed(&self, today: NaiveDate) -> Option<Money> {
        let target_date = self.target_date?;
        if self.is_reached() {
            return Some(Money::ZERO);
        }
        let months = (target_date.year() - today.year()) * 12 + target_date.month() as i32
            - today.month() as i32;
        let months = i64::from(months.max(1));
        Some(self.remaining().scale(1, months))
    }

    /// Re-derives the status from the amounts.
    ///
    /// A reached goal is completed; an unreached one keeps `Paused` if it was
    /// paused and is otherwise active.
    pub fn refresh_status(&mut self) {
        self.status = if self.is_reached() {
            GoalStatus::Completed
        } else if self.status == GoalStatus::Paused {
            GoalStatus::Paused
        } else {
            GoalStatus::Active
        };
    }

    /// Adds a contribution. Returns `true` when this contribution completed
    /// the goal.
    pub fn contribute(&mut self, amount_minor: i64) -> Result<bool, EngineError> {
        if amount_minor <= 0 {
            return Err(EngineError::field("amount_minor", "must be greater than zero"));
        }
        let was_completed = self.status == GoalStatus::Completed;
        self.current_minor = self
            .current_minor
            .checked_add(amount_minor)
            .ok_or_else(|| EngineError::InvalidAmount("amount overflow".to_string()))?;
        self.refresh_status();
        Ok(!was_completed && self.status == GoalStatus::Completed)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "savings_goals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub target_minor: i64,
    pub current_minor: i64,
    pub target_date: Option<Date>,
    pub priority: String,
    pub status: String,
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

impl From<&SavingsGoal> for ActiveModel {
    fn from(value: &SavingsGoal) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id),
            name: ActiveValue::Set(value.name.clone()),
            target_minor: ActiveValue::Set(value.target_minor),
            current_minor: ActiveValue::Set(value.current_minor),
            target_date: ActiveValue::Set(value.target_date),
            priority: ActiveValue::Set(value.priority.as_str().to_string()),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for SavingsGoal {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            target_minor: model.target_minor,
            current_minor: model.current_minor,
            target_date: model.target_date,
            priority: GoalPriority::try_from(model.priority.as_str())?,
            status: GoalStatus::try_from(model.status.as_str())?,
            created_at: model.created_at,
        })
    }
}
