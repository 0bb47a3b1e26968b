//! Categories API endpoints.

use api_types::category::{
    CategoryCreate, CategoryDeleted, CategoryListResponse, CategoryUpdate, CategoryView,
    CategoryVisibility,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, api_kind, engine_kind, server::ServerState, user};

fn map_category(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
        kind: api_kind(category.kind),
        is_default: category.is_default,
        sort_order: category.sort_order,
        is_visible: category.is_visible,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<CategoryListResponse>, ServerError> {
    let categories = state
        .engine
        .list_categories(user.id)
        .await?
        .into_iter()
        .map(map_category)
        .collect();

    Ok(Json(CategoryListResponse { categories }))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CategoryCreate>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let category = state
        .engine
        .create_category(
            user.id,
            &payload.name,
            engine_kind(payload.kind),
            payload.sort_order,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(map_category(category))))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<CategoryView>, ServerError> {
    if payload.name.is_none() && payload.kind.is_none() && payload.sort_order.is_none() {
        return Err(ServerError::Generic(
            "provide at least one of name, kind or sort_order".to_string(),
        ));
    }

    let category = state
        .engine
        .update_category(
            user.id,
            category_id,
            engine::CategoryUpdate {
                name: payload.name,
                kind: payload.kind.map(engine_kind),
                sort_order: payload.sort_order,
            },
        )
        .await?;

    Ok(Json(map_category(category)))
}

pub async fn set_visibility(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<CategoryVisibility>,
) -> Result<Json<CategoryView>, ServerError> {
    let category = state
        .engine
        .set_category_visibility(user.id, category_id, payload.is_visible)
        .await?;

    Ok(Json(map_category(category)))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
) -> Result<Json<CategoryDeleted>, ServerError> {
    let reassigned_count = state.engine.delete_category(user.id, category_id).await?;

    Ok(Json(CategoryDeleted {
        message: "category deleted".to_string(),
        reassigned_count,
    }))
}
