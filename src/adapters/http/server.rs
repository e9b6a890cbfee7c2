//! REST API server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/` | Welcome message |
//! | `GET`    | `/health` | Health check (returns version) |
//! | `GET`    | `/users?skip=&limit=` | Profile summaries |
//! | `POST`   | `/users` | Create a profile (400 if the key exists) |
//! | `GET`    | `/users/{user_id}` | Full profile |
//! | `PUT`    | `/users/{user_id}` | Partial update |
//! | `DELETE` | `/users/{user_id}` | Delete (204) |
//! | `POST`   | `/api/chat` | Forward a prompt to the LLM |
//! | `GET`    | `/api/chat/models` | Common model identifiers |

use crate::adapters::http::handlers;
use crate::usecases::{ChatService, ProfileService};
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub profiles: Arc<ProfileService>,
    pub chat: Arc<ChatService>,
}

impl AppState {
    pub fn new(profiles: Arc<ProfileService>, chat: Arc<ChatService>) -> Self {
        Self { profiles, chat }
    }
}

/// All routes, no middleware. Tests drive this directly.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::handle_root))
        .route("/health", get(handlers::handle_health))
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/users/{user_id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/api/chat", post(handlers::handle_chat))
        .route("/api/chat/models", get(handlers::list_models))
        .with_state(state)
}

/// CORS for the frontend origin. An unparsable origin falls back to any origin.
fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin.parse::<HeaderValue>() {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            warn!(origin, "invalid CORS origin; allowing any origin");
            layer.allow_origin(Any)
        }
    }
}

/// Bind and serve until the process is terminated.
pub async fn run_server(state: AppState, bind_addr: &str, cors_origin: &str) -> anyhow::Result<()> {
    let app = build_router(state)
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, cors_origin, "API server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
