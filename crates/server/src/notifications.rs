//! Notifications API endpoints and alert preferences.

use api_types::notification::{
    NotificationCheckResponse, NotificationList, NotificationListResponse, NotificationView,
    PreferencesUpdate, PreferencesView, ReadAllResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{UpdatePreferencesCmd, User};
use uuid::Uuid;

use crate::{
    ServerError, convert,
    extract::{ValidJson, ValidQuery},
    server::ServerState,
};

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidQuery(query): ValidQuery<NotificationList>,
) -> Result<Json<NotificationListResponse>, ServerError> {
    let notifications = state
        .engine
        .list_notifications(user.id, query.unread_only.unwrap_or(false))
        .await?
        .into_iter()
        .map(convert::notification)
        .collect();
    Ok(Json(NotificationListResponse { notifications }))
}

pub async fn read(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<NotificationView>, ServerError> {
    let notification = state
        .engine
        .mark_notification_read(notification_id, user.id)
        .await?;
    Ok(Json(convert::notification(notification)))
}

pub async fn read_all(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<ReadAllResponse>, ServerError> {
    let updated = state.engine.mark_all_notifications_read(user.id).await?;
    Ok(Json(ReadAllResponse { updated }))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(notification_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_notification(notification_id, user.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Runs the credit utilization and payment reminder checks now and returns
/// the notifications they raised.
pub async fn check(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<NotificationCheckResponse>, ServerError> {
    let check = state
        .engine
        .run_notification_checks(user.id, Utc::now().date_naive())
        .await?;
    Ok(Json(NotificationCheckResponse {
        credit_alerts: check
            .credit_alerts
            .into_iter()
            .map(convert::notification)
            .collect(),
        payment_reminders: check
            .payment_reminders
            .into_iter()
            .map(convert::notification)
            .collect(),
    }))
}

pub async fn preferences(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<PreferencesView>, ServerError> {
    let prefs = state.engine.notification_preferences(user.id).await?;
    Ok(Json(convert::preferences(prefs)))
}

pub async fn update_preferences(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidJson(payload): ValidJson<PreferencesUpdate>,
) -> Result<Json<PreferencesView>, ServerError> {
    let prefs = state
        .engine
        .update_notification_preferences(
            user.id,
            UpdatePreferencesCmd {
                credit_alerts: payload.credit_alerts,
                payment_reminders: payload.payment_reminders,
                goal_alerts: payload.goal_alerts,
                utilization_threshold_pct: payload.utilization_threshold_pct,
                reminder_days_ahead: payload.reminder_days_ahead,
            },
        )
        .await?;
    Ok(Json(convert::preferences(prefs)))
}
