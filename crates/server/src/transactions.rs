//! Transactions API endpoints.

use api_types::transaction::{
    TransactionCreate, TransactionListParams, TransactionListResponse, TransactionUpdate,
    TransactionView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{ServerError, api_kind, engine_kind, server::ServerState, user};

fn map_transaction(tx: engine::Transaction, category_name: Option<String>) -> TransactionView {
    TransactionView {
        id: tx.id,
        category_id: tx.category_id,
        category_name,
        kind: api_kind(tx.kind),
        amount_minor: tx.amount_minor,
        description: tx.description,
        occurred_at: tx.occurred_at,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(params): Query<TransactionListParams>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let transactions = state
        .engine
        .list_transactions(
            user.id,
            engine::TransactionListFilter {
                from: params.from,
                to: params.to,
                kind: params.kind.map(engine_kind),
            },
        )
        .await?
        .into_iter()
        .map(|(tx, category_name)| map_transaction(tx, category_name))
        .collect();

    Ok(Json(TransactionListResponse { transactions }))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionCreate>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let occurred_at = payload.occurred_at.unwrap_or_else(Utc::now);
    let transaction = state
        .engine
        .create_transaction(
            user.id,
            payload.category_id,
            engine_kind(payload.kind),
            payload.amount_minor,
            &payload.description,
            occurred_at,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(map_transaction(transaction, None)),
    ))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let transaction = state.engine.transaction(user.id, transaction_id).await?;
    Ok(Json(map_transaction(transaction, None)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let transaction = state
        .engine
        .update_transaction(
            user.id,
            transaction_id,
            engine::TransactionUpdate {
                category_id: payload.category_id,
                kind: payload.kind.map(engine_kind),
                amount_minor: payload.amount_minor,
                description: payload.description,
                occurred_at: payload.occurred_at,
            },
        )
        .await?;

    Ok(Json(map_transaction(transaction, None)))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_transaction(user.id, transaction_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
