//! Categories API endpoints.

use api_types::category::{CategoryListResponse, CategoryNew, CategoryUpdate, CategoryView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{CreateCategoryCmd, UpdateCategoryCmd, User};
use uuid::Uuid;

use crate::{ServerError, convert, extract::ValidJson, server::ServerState};

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<CategoryListResponse>, ServerError> {
    let categories = state
        .engine
        .list_categories(user.id)
        .await?
        .into_iter()
        .map(convert::category)
        .collect();
    Ok(Json(CategoryListResponse { categories }))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidJson(payload): ValidJson<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let category = state
        .engine
        .create_category(
            user.id,
            CreateCategoryCmd {
                name: payload.name,
                budget_share_pct: payload.budget_share_pct,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(convert::category(category))))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
    ValidJson(payload): ValidJson<CategoryUpdate>,
) -> Result<Json<CategoryView>, ServerError> {
    if payload.name.is_none() && payload.budget_share_pct.is_none() {
        return Err(ServerError::BadRequest(
            "provide at least one of name or budget_share_pct".to_string(),
        ));
    }

    let category = state
        .engine
        .update_category(
            category_id,
            user.id,
            UpdateCategoryCmd {
                name: payload.name,
                budget_share_pct: payload.budget_share_pct,
            },
        )
        .await?;
    Ok(Json(convert::category(category)))
}

/// Deletes a category; its transactions and recurring payments become
/// uncategorized.
pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_category(category_id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
