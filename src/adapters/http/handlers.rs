//! Route handlers and the JSON error contract.
//!
//! Errors are returned as `{ "detail": "..." }` with the status taken from the
//! `DomainError` kind: not found → 404, conflict/validation → 400, gateway unavailable
//! → 503, everything else → 500.

use crate::adapters::http::server::AppState;
use crate::domain::{DomainError, Profile, ProfileDraft, ProfileSummary, ProfileUpdate};
use crate::usecases::profile_service::DEFAULT_PAGE_LIMIT;
use crate::usecases::{ChatInput, ChatReply};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

/// Error type that converts into an HTTP response.
pub struct AppError {
    status: StatusCode,
    detail: String,
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        let status = match &e {
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Conflict(_) | DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::GatewayUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if !e.is_client_error() {
            error!(status = %status, error = %e, "request failed");
        }
        Self {
            status,
            detail: e.to_string(),
        }
    }
}

/// Unparsable or incomplete JSON bodies keep axum's status but use the `detail` shape.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

// ============ GET / and GET /health ============

#[derive(Serialize)]
pub struct MessageResponse {
    message: String,
}

pub async fn handle_root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Welcome to the Social OS API. Database is initialized.".to_string(),
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ /users ============

#[derive(Deserialize)]
pub struct Pagination {
    #[serde(default)]
    skip: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

/// Body of `POST /users`. Accepts snake_case and camelCase keys.
#[derive(Deserialize)]
pub struct CreateUserBody {
    #[serde(alias = "userId")]
    user_id: String,
    name: String,
    #[serde(default)]
    bio: Option<String>,
    #[serde(default, alias = "wikiContent")]
    wiki_content: Option<String>,
}

impl From<CreateUserBody> for ProfileDraft {
    fn from(b: CreateUserBody) -> Self {
        ProfileDraft {
            user_id: b.user_id,
            name: b.name,
            bio: b.bio,
            wiki_content: b.wiki_content,
        }
    }
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<ProfileSummary>>, AppError> {
    Ok(Json(state.profiles.list(page.skip, page.limit).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Profile>, AppError> {
    Ok(Json(state.profiles.get(&user_id).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<CreateUserBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Profile>), AppError> {
    let Json(body) = body?;
    let profile = state.profiles.create(&body.into()).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    update: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<Profile>, AppError> {
    let Json(update) = update?;
    Ok(Json(state.profiles.update(&user_id, &update).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.profiles.delete(&user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============ /api/chat ============

pub async fn handle_chat(
    State(state): State<AppState>,
    input: Result<Json<ChatInput>, JsonRejection>,
) -> Result<Json<ChatReply>, AppError> {
    let Json(input) = input?;
    Ok(Json(state.chat.complete(input).await?))
}

#[derive(Serialize)]
pub struct ModelInfo {
    id: &'static str,
    name: &'static str,
    description: &'static str,
}

#[derive(Serialize)]
pub struct ModelList {
    models: Vec<ModelInfo>,
}

/// Commonly used provider models. Not exhaustive.
pub async fn list_models() -> Json<ModelList> {
    let models = vec![
        ModelInfo {
            id: "anthropic/claude-3.5-sonnet",
            name: "Claude 3.5 Sonnet",
            description: "Most intelligent model, best for complex tasks",
        },
        ModelInfo {
            id: "anthropic/claude-3-haiku",
            name: "Claude 3 Haiku",
            description: "Fast and cost-effective for simpler tasks",
        },
        ModelInfo {
            id: "openai/gpt-4-turbo",
            name: "GPT-4 Turbo",
            description: "OpenAI's most capable model",
        },
        ModelInfo {
            id: "openai/gpt-3.5-turbo",
            name: "GPT-3.5 Turbo",
            description: "Fast and cost-effective OpenAI model",
        },
        ModelInfo {
            id: "meta-llama/llama-3.1-70b-instruct",
            name: "Llama 3.1 70B",
            description: "Open-source model from Meta",
        },
    ];
    Json(ModelList { models })
}
