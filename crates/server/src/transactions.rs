//! Transactions API endpoints

use api_types::transaction::{
    TransactionList, TransactionListResponse, TransactionNew, TransactionUpdate, TransactionView,
    TransferNew, TransferView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use csv::Writer;
use engine::{
    CreateTransactionCmd, TransactionListFilter, TransferCmd, UpdateTransactionCmd, User,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    ServerError, convert,
    extract::{ValidJson, ValidQuery},
    server::ServerState,
};

const DEFAULT_PAGE_LIMIT: u64 = 50;

fn filter_from(query: &TransactionList) -> TransactionListFilter {
    TransactionListFilter {
        account_id: query.account_id,
        category_id: query.category_id,
        from: query.from,
        to: query.to,
    }
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidQuery(query): ValidQuery<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    let (txs, next_cursor) = state
        .engine
        .list_transactions_page(user.id, limit, query.cursor.as_deref(), &filter_from(&query))
        .await?;

    Ok(Json(TransactionListResponse {
        transactions: txs.into_iter().map(convert::transaction).collect(),
        next_cursor,
    }))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidJson(payload): ValidJson<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let tx = state
        .engine
        .create_transaction(
            user.id,
            CreateTransactionCmd {
                account_id: payload.account_id,
                amount_minor: payload.amount_minor,
                description: payload.description,
                transaction_date: payload.transaction_date,
                category_id: payload.category_id,
                recurring_payment_id: payload.recurring_payment_id,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(convert::transaction(tx))))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
    ValidJson(payload): ValidJson<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state
        .engine
        .update_transaction(
            transaction_id,
            user.id,
            UpdateTransactionCmd {
                account_id: payload.account_id,
                amount_minor: payload.amount_minor,
                description: payload.description,
                transaction_date: payload.transaction_date,
                category_id: payload.category_id,
                recurring_payment_id: payload.recurring_payment_id,
            },
        )
        .await?;
    Ok(Json(convert::transaction(tx)))
}

/// Deletes a transaction. Deleting one side of a transfer deletes both.
pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_transaction(transaction_id, user.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn transfer(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidJson(payload): ValidJson<TransferNew>,
) -> Result<(StatusCode, Json<TransferView>), ServerError> {
    let result = state
        .engine
        .transfer(
            user.id,
            TransferCmd {
                from_account_id: payload.from_account_id,
                to_account_id: payload.to_account_id,
                amount_minor: payload.amount_minor,
                description: payload.description,
                transaction_date: payload.transaction_date,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(TransferView {
            transfer_id: result.transfer_id,
            debit: convert::transaction(result.debit),
            credit: convert::transaction(result.credit),
        }),
    ))
}

#[derive(Serialize)]
struct ExportRow {
    id: String,
    transaction_date: String,
    account_id: String,
    amount_minor: i64,
    description: String,
    category_id: Option<String>,
    transfer_id: Option<String>,
}

/// Exports every transaction matching the filters as CSV. Paging
/// parameters are ignored.
pub async fn export(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ValidQuery(query): ValidQuery<TransactionList>,
) -> Result<Response, ServerError> {
    let txs = state
        .engine
        .list_transactions(user.id, &filter_from(&query))
        .await?;

    let mut writer = Writer::from_writer(vec![]);
    for tx in txs {
        if let Err(err) = writer.serialize(ExportRow {
            id: tx.id.to_string(),
            transaction_date: tx.transaction_date.to_string(),
            account_id: tx.account_id.to_string(),
            amount_minor: tx.amount_minor,
            description: tx.description,
            category_id: tx.category_id.map(|id| id.to_string()),
            transfer_id: tx.transfer_id.map(|id| id.to_string()),
        }) {
            return Err(ServerError::Internal(format!(
                "failed to serialize export row: {err}"
            )));
        }
    }

    let data = writer
        .into_inner()
        .map_err(|err| ServerError::Internal(format!("failed to finalize export: {err}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"transactions.csv\"",
            ),
        ],
        data,
    )
        .into_response())
}
