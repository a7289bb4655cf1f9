use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, FromRequest, Path, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::{
    chat::ChatStore,
    config::Config,
    domain::{ChatMessage, DomainError, MessageDraft, Poll, PollDraft, VoteDraft},
    polls::PollStore,
    state::StoreError,
};

mod static_files;


#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub polls: Arc<Mutex<PollStore>>,
    pub chat: Arc<Mutex<ChatStore>>,
}

#[derive(Debug)]
pub struct ApiError {
    code: &'static str,
    message: String,
    status: StatusCode,
}

impl ApiError {
    fn new(code: &'static str, status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new("invalid_request", StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal", StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<DomainError> for ApiError {
    fn from(value: DomainError) -> Self {
        // Duplicate votes keep the 400 status existing clients expect.
        let status = match value {
            DomainError::PollNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        };
        debug!(code = value.code(), error = ?value, "request rejected");
        Self::new(value.code(), status, value.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Domain(domain) => domain.into(),
            StoreError::Io(_) | StoreError::SerdeJson(_) | StoreError::InvalidDocument { .. } => {
                error!(error = %value, "document storage failed");
                ApiError::internal(value.to_string())
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}

pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    axum::Json<T>: FromRequest<S>,
    <axum::Json<T> as FromRequest<S>>::Rejection: std::fmt::Display,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = axum::Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::invalid_request(e.to_string()))?;
        Ok(Self(value))
    }
}

#[derive(Serialize)]
struct VoteResponse {
    message: &'static str,
    poll: Poll,
}

pub fn build_router(
    config: Config,
    polls: Arc<Mutex<PollStore>>,
    chat: Arc<Mutex<ChatStore>>,
) -> Router {
    let app_state = AppState {
        config: Arc::new(config),
        polls,
        chat,
    };

    Router::new()
        .route("/health", get(health))
        .route("/polls", get(list_polls).post(create_poll))
        .route("/polls/:id/vote", post(cast_vote))
        .route("/chat", get(list_messages).post(post_message))
        .fallback(static_files::serve)
        .layer(Extension(app_state))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": crate::version::VERSION,
    }))
}

async fn list_polls(Extension(state): Extension<AppState>) -> Result<Json<Vec<Poll>>, ApiError> {
    let store = state.polls.lock().await;
    Ok(Json(store.list_polls()?))
}

async fn create_poll(
    Extension(state): Extension<AppState>,
    ApiJson(draft): ApiJson<PollDraft>,
) -> Result<(StatusCode, Json<Poll>), ApiError> {
    let mut store = state.polls.lock().await;
    let poll = store.create_poll(draft)?;
    Ok((StatusCode::CREATED, Json(poll)))
}

async fn cast_vote(
    Extension(state): Extension<AppState>,
    Path(poll_id): Path<String>,
    ApiJson(draft): ApiJson<VoteDraft>,
) -> Result<Json<VoteResponse>, ApiError> {
    // The lock spans lookup, duplicate check and increment.
    let mut store = state.polls.lock().await;
    let poll = store.cast_vote(&poll_id, draft)?;
    Ok(Json(VoteResponse {
        message: "Vote registered.",
        poll,
    }))
}

async fn list_messages(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    let store = state.chat.lock().await;
    Ok(Json(store.list_messages()?))
}

async fn post_message(
    Extension(state): Extension<AppState>,
    ApiJson(draft): ApiJson<MessageDraft>,
) -> Result<(StatusCode, Json<ChatMessage>), ApiError> {
    let mut store = state.chat.lock().await;
    let message = store.post_message(draft)?;
    Ok((StatusCode::CREATED, Json(message)))
}
