use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    CreateGoalCmd, EngineError, GoalStatus, Money, Notification, NotificationKind, ResultEngine,
    SavingsGoal, UpdateGoalCmd, savings_goals, util::normalize_required_name,
};

use super::{Engine, with_tx};

fn validate_target(target_minor: i64) -> ResultEngine<()> {
    if target_minor <= 0 {
        return Err(EngineError::field(
            "target_minor",
            "must be greater than zero",
        ));
    }
    Ok(())
}

impl Engine {
    pub async fn create_goal(&self, user_id: Uuid, cmd: CreateGoalCmd) -> ResultEngine<SavingsGoal> {
        let name = normalize_required_name(&cmd.name, "name")?;
        validate_target(cmd.target_minor)?;

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let goal = SavingsGoal::new(
                user_id,
                name,
                cmd.target_minor,
                cmd.target_date,
                cmd.priority,
            );
            savings_goals::ActiveModel::from(&goal)
                .insert(&db_tx)
                .await?;
            Ok(goal)
        })
    }

    /// Lists goals, highest priority first.
    pub async fn list_goals(&self, user_id: Uuid) -> ResultEngine<Vec<SavingsGoal>> {
        let mut goals = savings_goals::Entity::find()
            .filter(savings_goals::Column::UserId.eq(user_id))
            .order_by_asc(savings_goals::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(SavingsGoal::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        goals.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(goals)
    }

    pub async fn goal(&self, goal_id: Uuid, user_id: Uuid) -> ResultEngine<SavingsGoal> {
        with_tx!(self, |db_tx| {
            let model = self.require_goal(&db_tx, goal_id, user_id).await?;
            SavingsGoal::try_from(model)
        })
    }

    /// Updates a goal. The saved amount only changes through
    /// [`Engine::contribute`].
    pub async fn update_goal(
        &self,
        goal_id: Uuid,
        user_id: Uuid,
        cmd: UpdateGoalCmd,
    ) -> ResultEngine<SavingsGoal> {
        with_tx!(self, |db_tx| {
            let model = self.require_goal(&db_tx, goal_id, user_id).await?;
            let mut goal = SavingsGoal::try_from(model)?;

            if let Some(name) = cmd.name.as_deref() {
                goal.name = normalize_required_name(name, "name")?;
            }
            if let Some(target_minor) = cmd.target_minor {
                validate_target(target_minor)?;
                goal.target_minor = target_minor;
            }
            if let Some(target_date) = cmd.target_date {
                goal.target_date = target_date;
            }
            if let Some(priority) = cmd.priority {
                goal.priority = priority;
            }
            if let Some(paused) = cmd.paused {
                goal.status = if paused {
                    GoalStatus::Paused
                } else {
                    GoalStatus::Active
                };
            }
            goal.refresh_status();

            savings_goals::ActiveModel::from(&goal)
                .update(&db_tx)
                .await?;
            Ok(goal)
        })
    }

    pub async fn delete_goal(&self, goal_id: Uuid, user_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_goal(&db_tx, goal_id, user_id).await?;
            savings_goals::Entity::delete_by_id(goal_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Adds money to a goal.
    ///
    /// Emits a `goal_completed` notification when this contribution reaches
    /// the target and the user wants goal alerts.
    pub async fn contribute(
        &self,
        goal_id: Uuid,
        user_id: Uuid,
        amount_minor: i64,
    ) -> ResultEngine<SavingsGoal> {
        let (goal, notification) = with_tx!(self, |db_tx| {
            let model = self.require_goal(&db_tx, goal_id, user_id).await?;
            let mut goal = SavingsGoal::try_from(model)?;
            let completed = goal.contribute(amount_minor)?;

            savings_goals::ActiveModel::from(&goal)
                .update(&db_tx)
                .await?;

            let mut notification = None;
            if completed {
                tracing::info!(goal_id = %goal.id, "savings goal completed");
                let prefs = self.load_preferences(&db_tx, user_id).await?;
                if prefs.goal_alerts {
                    let candidate = Notification::new(
                        user_id,
                        NotificationKind::GoalCompleted,
                        format!("Goal reached: {}", goal.name),
                        format!(
                            "You saved {} for {}.",
                            Money::new(goal.current_minor),
                            goal.name
                        ),
                    )
                    .dedupe_key(format!("goal_completed:{}", goal.id));
                    notification = self.insert_notification(&db_tx, candidate).await?;
                }
            }
            Ok::<_, EngineError>((goal, notification))
        })?;

        if let Some(notification) = notification {
            self.deliver(&[notification]);
        }
        Ok(goal)
    }
}
