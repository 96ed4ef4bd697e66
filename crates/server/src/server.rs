use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    http::StatusCode,
    response::Response,
    routing::{delete, get, patch, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use chrono::Utc;

use std::sync::Arc;

use crate::{
    ServerError, accounts, categories, goals, notifications, recurring, transactions,
};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Resolves the bearer session token to a user and stores it in the request
/// extensions. Anything else is rejected before a handler runs.
async fn auth(
    State(state): State<ServerState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return Err(ServerError::Unauthorized);
    };
    if bearer.token().is_empty() {
        return Err(ServerError::Unauthorized);
    }

    let Some(user) = state
        .engine
        .user_for_session(bearer.token(), Utc::now())
        .await?
    else {
        tracing::debug!("rejected unknown or expired session");
        return Err(ServerError::Unauthorized);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Revokes the session used for this request.
async fn logout(
    State(state): State<ServerState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
) -> Result<StatusCode, ServerError> {
    state.engine.revoke_session(bearer.token()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Builds the API router. Every route requires a session.
pub fn router(engine: Arc<Engine>) -> Router {
    let state = ServerState { engine };
    Router::new()
        .route("/api/session", delete(logout))
        .route("/api/accounts", get(accounts::list).post(accounts::create))
        .route(
            "/api/accounts/{id}",
            get(accounts::get)
                .patch(accounts::update)
                .delete(accounts::delete),
        )
        .route("/api/accounts/{id}/reconcile", post(accounts::reconcile))
        .route(
            "/api/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/api/categories/{id}",
            patch(categories::update).delete(categories::delete),
        )
        .route(
            "/api/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route("/api/transactions/export", get(transactions::export))
        .route(
            "/api/transactions/{id}",
            patch(transactions::update).delete(transactions::delete),
        )
        .route("/api/transfers", post(transactions::transfer))
        .route(
            "/api/recurring-payments",
            get(recurring::list).post(recurring::create),
        )
        .route("/api/recurring-payments/detect", post(recurring::detect))
        .route(
            "/api/recurring-payments/budget-impact",
            get(recurring::budget_impact),
        )
        .route(
            "/api/recurring-payments/{id}",
            get(recurring::get)
                .patch(recurring::update)
                .delete(recurring::delete),
        )
        .route("/api/savings-goals", get(goals::list).post(goals::create))
        .route(
            "/api/savings-goals/{id}",
            get(goals::get).patch(goals::update).delete(goals::delete),
        )
        .route(
            "/api/savings-goals/{id}/contributions",
            post(goals::contribute),
        )
        .route("/api/notifications", get(notifications::list))
        .route(
            "/api/notifications/preferences",
            get(notifications::preferences).put(notifications::update_preferences),
        )
        .route("/api/notifications/read-all", post(notifications::read_all))
        .route("/api/notifications/check", post(notifications::check))
        .route("/api/notifications/{id}/read", post(notifications::read))
        .route(
            "/api/notifications/{id}",
            delete(notifications::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(Arc::new(engine))).await
}
