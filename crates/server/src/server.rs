use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use std::sync::Arc;

use crate::{auth, categories, transactions, user};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
    pub auth: Arc<auth::AuthConfig>,
}

/// Resolves the bearer token to a user row and stores it in the request
/// extensions for the handlers.
async fn auth_middleware(
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(Authorization(bearer))) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let user_id = auth::verify_token(bearer.token(), &state.auth)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let user = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[derive(Serialize)]
struct Liveness {
    message: &'static str,
}

async fn liveness() -> Json<Liveness> {
    Json(Liveness {
        message: "Finanza API running",
    })
}

fn router(state: ServerState) -> Router {
    // The auth routes come after `route_layer`, which only wraps the routes
    // registered before it: everything else requires a bearer token.
    let api = Router::new()
        .route(
            "/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/categories/{id}",
            axum::routing::put(categories::update).delete(categories::delete),
        )
        .route("/categories/{id}/visibility", patch(categories::set_visibility))
        .route(
            "/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route(
            "/transactions/{id}",
            get(transactions::get)
                .put(transactions::update)
                .delete(transactions::delete),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .route("/auth/register", post(user::register))
        .route("/auth/login", post(user::login));

    Router::new()
        .route("/", get(liveness))
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection, auth: auth::AuthConfig) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3001").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, auth, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    auth: auth::AuthConfig,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
        auth: Arc::new(auth),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    auth: auth::AuthConfig,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, auth, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
