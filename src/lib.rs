pub mod auth;
pub mod config;
pub mod db;
pub mod index;
pub mod permissions;
pub mod profiles;
pub mod res;
pub mod rooms;
pub mod session;

mod appresult;

pub use appresult::{AppError, AppResult};

use axum::{Router, extract::FromRef, routing::get};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{MemoryStore, SessionManagerLayer};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
}

/// The whole site, ready to serve.
pub fn app(app_state: AppState, session_layer: SessionManagerLayer<MemoryStore>) -> Router {
    Router::new()
        .route("/style.css", get(res::stylesheet))
        .merge(index::router())
        .merge(auth::router())
        .nest("/rooms", rooms::router())
        .nest("/messages", rooms::message_router())
        .nest("/users", profiles::router())
        .fallback(|| async { AppError::NotFound("page") })
        .with_state(app_state)
        .layer(session_layer)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
