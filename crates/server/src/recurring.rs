//! Recurring payments API endpoints: tracking, detection and budget impact.

use api_types::{
    budget::BudgetImpactResponse,
    recurring::{
        BudgetImpactQuery, DetectRequest, DetectResponse, RecurringPaymentList,
        RecurringPaymentListResponse, RecurringPaymentNew, RecurringPaymentUpdate,
        RecurringPaymentView,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{CreateRecurringPaymentCmd, UpdateRecurringPaymentCmd, User};
use uuid::Uuid;

use crate::{
    ServerError, convert,
    extract::{ValidJson, ValidQuery},
    server::ServerState,
};

const DEFAULT_HORIZON_DAYS: u32 = 30;

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidQuery(query): ValidQuery<RecurringPaymentList>,
) -> Result<Json<RecurringPaymentListResponse>, ServerError> {
    let recurring_payments = state
        .engine
        .list_recurring_payments(user.id, query.status.map(convert::recurring_status_in))
        .await?
        .into_iter()
        .map(convert::recurring_payment)
        .collect();
    Ok(Json(RecurringPaymentListResponse { recurring_payments }))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidJson(payload): ValidJson<RecurringPaymentNew>,
) -> Result<(StatusCode, Json<RecurringPaymentView>), ServerError> {
    let payment = state
        .engine
        .create_recurring_payment(
            user.id,
            CreateRecurringPaymentCmd {
                name: payload.name,
                merchant_pattern: payload.merchant_pattern,
                amount_minor: payload.amount_minor,
                frequency: convert::frequency_in(payload.frequency),
                next_due_date: payload.next_due_date,
                account_id: payload.account_id,
                category_id: payload.category_id,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(convert::recurring_payment(payment))))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(recurring_payment_id): Path<Uuid>,
) -> Result<Json<RecurringPaymentView>, ServerError> {
    let payment = state
        .engine
        .recurring_payment(recurring_payment_id, user.id)
        .await?;
    Ok(Json(convert::recurring_payment(payment)))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(recurring_payment_id): Path<Uuid>,
    ValidJson(payload): ValidJson<RecurringPaymentUpdate>,
) -> Result<Json<RecurringPaymentView>, ServerError> {
    let payment = state
        .engine
        .update_recurring_payment(
            recurring_payment_id,
            user.id,
            UpdateRecurringPaymentCmd {
                name: payload.name,
                merchant_pattern: payload.merchant_pattern,
                amount_minor: payload.amount_minor,
                frequency: payload.frequency.map(convert::frequency_in),
                next_due_date: payload.next_due_date,
                status: payload.status.map(convert::recurring_status_in),
                account_id: payload.account_id,
                category_id: payload.category_id,
            },
        )
        .await?;
    Ok(Json(convert::recurring_payment(payment)))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(recurring_payment_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_recurring_payment(recurring_payment_id, user.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Scans an account's history for recurring charges not tracked yet.
pub async fn detect(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidJson(payload): ValidJson<DetectRequest>,
) -> Result<Json<DetectResponse>, ServerError> {
    let as_of = payload.as_of.unwrap_or_else(|| Utc::now().date_naive());

    let patterns = state
        .engine
        .detect_recurring_payments(payload.account_id, user.id, as_of)
        .await?
        .into_iter()
        .map(convert::detected_pattern)
        .collect();

    let tracked = if payload.track {
        state
            .engine
            .track_detected_payments(payload.account_id, user.id, as_of)
            .await?
            .into_iter()
            .map(convert::recurring_payment)
            .collect()
    } else {
        Vec::new()
    };

    Ok(Json(DetectResponse { patterns, tracked }))
}

pub async fn budget_impact(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidQuery(query): ValidQuery<BudgetImpactQuery>,
) -> Result<Json<BudgetImpactResponse>, ServerError> {
    let report = state
        .engine
        .budget_impact(
            user.id,
            Utc::now().date_naive(),
            query.horizon_days.unwrap_or(DEFAULT_HORIZON_DAYS),
        )
        .await?;
    Ok(Json(convert::budget_report(report)))
}
