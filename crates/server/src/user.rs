//! Users entity and the authentication endpoints.
//!
//! The entity mirrors the columns the auth layer needs; account creation
//! itself goes through the engine so registration and default-category
//! seeding stay atomic.

use api_types::user::{AuthResponse, LoginUser, RegisterUser};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use sea_orm::{QueryFilter, entity::prelude::*};

use crate::{ServerError, auth, server::ServerState};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Creates an account, seeds its default categories and returns a token.
pub async fn register(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(payload): Json<RegisterUser>,
) -> Result<(StatusCode, Json<AuthResponse>), ServerError> {
    auth::require_admin_code(&state.auth, &headers)?;

    if payload.password.chars().count() < 6 {
        return Err(ServerError::Generic(
            "password must be at least 6 characters".to_string(),
        ));
    }

    let password_hash = auth::hash_password(&payload.password)?;
    let user = state
        .engine
        .register_user(&payload.email, &password_hash)
        .await?;
    let token = auth::issue_token(user.id, &state.auth)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            id: user.id,
            email: user.email,
            token,
        }),
    ))
}

/// Verifies credentials and returns a fresh token.
///
/// Unknown emails and wrong passwords produce the same response, so the
/// endpoint does not leak which accounts exist.
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginUser>,
) -> Result<Json<AuthResponse>, ServerError> {
    let email = payload.email.trim().to_lowercase();

    let user = Entity::find()
        .filter(Column::Email.eq(email))
        .one(&state.db)
        .await
        .map_err(|err| {
            tracing::error!("database error: {err}");
            ServerError::Unauthorized
        })?
        .ok_or(ServerError::Unauthorized)?;

    if !auth::verify_password(&payload.password, &user.password_hash) {
        return Err(ServerError::Unauthorized);
    }

    let token = auth::issue_token(user.id, &state.auth)?;
    Ok(Json(AuthResponse {
        id: user.id,
        email: user.email,
        token,
    }))
}
