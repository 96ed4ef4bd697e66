//! In-app notifications and per-user notification preferences.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    CreditUtilization,
    PaymentReminder,
    GoalCompleted,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreditUtilization => "credit_utilization",
            Self::PaymentReminder => "payment_reminder",
            Self::GoalCompleted => "goal_completed",
        }
    }
}

impl TryFrom<&str> for NotificationKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "credit_utilization" => Ok(Self::CreditUtilization),
            "payment_reminder" => Ok(Self::PaymentReminder),
            "goal_completed" => Ok(Self::GoalCompleted),
            other => Err(EngineError::field(
                "kind",
                format!("invalid notification kind: {other}"),
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Identifies the condition that raised the notification, so the same
    /// condition is not reported twice while unread.
    pub dedupe_key: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
            dedupe_key: None,
            read: false,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn dedupe_key(mut self, key: impl Into<String>) -> Self {
        self.dedupe_key = Some(key.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub dedupe_key: Option<String>,
    pub read: bool,
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

impl From<&Notification> for ActiveModel {
    fn from(value: &Notification) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            title: ActiveValue::Set(value.title.clone()),
            message: ActiveValue::Set(value.message.clone()),
            dedupe_key: ActiveValue::Set(value.dedupe_key.clone()),
            read: ActiveValue::Set(value.read),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Notification {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            kind: NotificationKind::try_from(model.kind.as_str())?,
            title: model.title,
            message: model.message,
            dedupe_key: model.dedupe_key,
            read: model.read,
            created_at: model.created_at,
        })
    }
}

/// Which notifications a user wants and their thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub credit_alerts: bool,
    pub payment_reminders: bool,
    pub goal_alerts: bool,
    pub utilization_threshold_pct: f64,
    pub reminder_days_ahead: u32,
}

pub mod preferences {
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    use super::NotificationPreferences;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "notification_preferences")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub user_id: Uuid,
        pub credit_alerts: bool,
        pub payment_reminders: bool,
        pub goal_alerts: bool,
        pub utilization_threshold_pct: f64,
        pub reminder_days_ahead: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for NotificationPreferences {
        fn from(model: Model) -> Self {
            Self {
                credit_alerts: model.credit_alerts,
                payment_reminders: model.payment_reminders,
                goal_alerts: model.goal_alerts,
                utilization_threshold_pct: model.utilization_threshold_pct,
                reminder_days_ahead: model.reminder_days_ahead.max(0) as u32,
            }
        }
    }
}
