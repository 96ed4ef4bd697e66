//! Savings goals API endpoints.

use api_types::goal::{Contribution, GoalListResponse, GoalNew, GoalUpdate, GoalView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{CreateGoalCmd, GoalPriority, UpdateGoalCmd, User};
use uuid::Uuid;

use crate::{ServerError, convert, extract::ValidJson, server::ServerState};

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<GoalListResponse>, ServerError> {
    let today = Utc::now().date_naive();
    let goals = state
        .engine
        .list_goals(user.id)
        .await?
        .into_iter()
        .map(|goal| convert::goal(goal, today))
        .collect();
    Ok(Json(GoalListResponse { goals }))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidJson(payload): ValidJson<GoalNew>,
) -> Result<(StatusCode, Json<GoalView>), ServerError> {
    let goal = state
        .engine
        .create_goal(
            user.id,
            CreateGoalCmd {
                name: payload.name,
                target_minor: payload.target_minor,
                target_date: payload.target_date,
                priority: payload
                    .priority
                    .map_or(GoalPriority::Medium, convert::goal_priority_in),
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(convert::goal(goal, Utc::now().date_naive())),
    ))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<GoalView>, ServerError> {
    let goal = state.engine.goal(goal_id, user.id).await?;
    Ok(Json(convert::goal(goal, Utc::now().date_naive())))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
    ValidJson(payload): ValidJson<GoalUpdate>,
) -> Result<Json<GoalView>, ServerError> {
    let goal = state
        .engine
        .update_goal(
            goal_id,
            user.id,
            UpdateGoalCmd {
                name: payload.name,
                target_minor: payload.target_minor,
                target_date: payload.target_date,
                priority: payload.priority.map(convert::goal_priority_in),
                paused: payload.paused,
            },
        )
        .await?;
    Ok(Json(convert::goal(goal, Utc::now().date_naive())))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_goal(goal_id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn contribute(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
    ValidJson(payload): ValidJson<Contribution>,
) -> Result<Json<GoalView>, ServerError> {
    let goal = state
        .engine
        .contribute(goal_id, user.id, payload.amount_minor)
        .await?;
    Ok(Json(convert::goal(goal, Utc::now().date_naive())))
}
