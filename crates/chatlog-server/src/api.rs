use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, Path, Query, State,
    },
    http::Method,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use chatlog_service::{SeedCounts, ServiceError, Services};
use chatlog_shared::forms::{UserForm, UserSubmission};
use chatlog_shared::{Call, Chat, ChatPatch, NewMessage, Profile, ProfilePatch};

use crate::config::ServerConfig;
use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/chats", get(list_chats).post(upsert_chat))
        .route("/chats/:id", get(get_chat))
        .route("/messages", post(append_message))
        .route("/calls", get(list_calls))
        .route("/profile", get(get_profile).put(update_profile))
        .route("/seed", get(seed_usage).post(seed))
        .route("/forms/user", post(submit_user_form))
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

#[derive(Serialize)]
struct Envelope<T> {
    success: bool,
    data: T,
}

fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(Envelope {
        success: true,
        data,
    }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    storage: &'static str,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ChatListQuery {
    q: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct AppendMessageRequest {
    chat_id: String,
    message: NewMessage,
}

#[derive(Serialize)]
struct MessageResponse {
    success: bool,
    message: &'static str,
}

#[derive(Serialize)]
struct SeedResponse {
    success: bool,
    message: &'static str,
    data: SeedCounts,
}

async fn health_check(State(state): State<AppState>) -> ApiResult<HealthResponse> {
    let store = &state.services.store;
    store
        .health_check()
        .await
        .map_err(ServiceError::StorageUnavailable)?;

    ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage: store.name(),
    })
}

async fn list_chats(
    State(state): State<AppState>,
    query: Result<Query<ChatListQuery>, QueryRejection>,
) -> ApiResult<Vec<Chat>> {
    let Query(query) = query?;
    let chats = state.services.chats.list_chats(query.q.as_deref()).await?;
    ok(chats)
}

async fn get_chat(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Chat> {
    ok(state.services.chats.get_chat(&id).await?)
}

async fn upsert_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatPatch>, JsonRejection>,
) -> ApiResult<Chat> {
    let Json(patch) = payload?;
    ok(state.services.chat_repo.upsert(patch).await?)
}

async fn append_message(
    State(state): State<AppState>,
    payload: Result<Json<AppendMessageRequest>, JsonRejection>,
) -> ApiResult<Chat> {
    let Json(request) = payload?;
    let chat = state
        .services
        .messages
        .append(&request.chat_id, request.message)
        .await?;
    ok(chat)
}

async fn list_calls(State(state): State<AppState>) -> ApiResult<Vec<Call>> {
    ok(state.services.calls.find_all().await?)
}

async fn get_profile(State(state): State<AppState>) -> ApiResult<Profile> {
    ok(state.services.profile.get_or_create().await?)
}

async fn update_profile(
    State(state): State<AppState>,
    payload: Result<Json<ProfilePatch>, JsonRejection>,
) -> ApiResult<Profile> {
    let Json(patch) = payload?;
    ok(state.services.profile.update(patch).await?)
}

async fn seed_usage() -> Json<MessageResponse> {
    Json(MessageResponse {
        success: true,
        message: "Send a POST request to /seed to reset the database with demo data",
    })
}

async fn seed(State(state): State<AppState>) -> Result<Json<SeedResponse>, ApiError> {
    let counts = state.services.seeder.seed().await?;
    Ok(Json(SeedResponse {
        success: true,
        message: "Database seeded successfully",
        data: counts,
    }))
}

async fn submit_user_form(
    payload: Result<Json<UserForm>, JsonRejection>,
) -> ApiResult<UserSubmission> {
    let Json(form) = payload?;
    ok(form.validate()?)
}

/// Start the HTTP server on the given address.
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "HTTP API server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
