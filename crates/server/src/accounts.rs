//! Accounts API endpoints.

use api_types::account::{
    AccountList, AccountListResponse, AccountNew, AccountUpdate, AccountView, BalanceView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{CreateAccountCmd, UpdateAccountCmd, User};
use uuid::Uuid;

use crate::{
    ServerError, convert,
    extract::{ValidJson, ValidQuery},
    server::ServerState,
};

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidQuery(query): ValidQuery<AccountList>,
) -> Result<Json<AccountListResponse>, ServerError> {
    let accounts = state
        .engine
        .list_accounts(user.id, query.include_archived.unwrap_or(false))
        .await?
        .into_iter()
        .map(convert::account)
        .collect();
    Ok(Json(AccountListResponse { accounts }))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidJson(payload): ValidJson<AccountNew>,
) -> Result<(StatusCode, Json<AccountView>), ServerError> {
    let mut cmd = CreateAccountCmd::new(payload.name, convert::account_kind_in(payload.kind));
    if let Some(limit) = payload.credit_limit_minor {
        cmd = cmd.credit_limit(limit);
    }
    if let Some(currency) = payload.currency {
        cmd = cmd.currency(convert::currency_in(currency));
    }
    let account = state.engine.create_account(user.id, cmd).await?;
    Ok((StatusCode::CREATED, Json(convert::account(account))))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state.engine.account(account_id, user.id).await?;
    Ok(Json(convert::account(account)))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
    ValidJson(payload): ValidJson<AccountUpdate>,
) -> Result<Json<AccountView>, ServerError> {
    if payload.name.is_none() && payload.credit_limit_minor.is_none() && payload.archived.is_none()
    {
        return Err(ServerError::BadRequest(
            "provide at least one of name, credit_limit_minor or archived".to_string(),
        ));
    }
    let account = state
        .engine
        .update_account(
            account_id,
            user.id,
            UpdateAccountCmd {
                name: payload.name,
                credit_limit_minor: payload.credit_limit_minor,
                archived: payload.archived,
            },
        )
        .await?;
    Ok(Json(convert::account(account)))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_account(account_id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Recomputes the stored balance from the ledger.
pub async fn reconcile(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<BalanceView>, ServerError> {
    let balance = state
        .engine
        .recompute_account_balance(account_id, user.id)
        .await?;
    Ok(Json(BalanceView {
        account_id,
        balance_minor: balance.minor(),
    }))
}
