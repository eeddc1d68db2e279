use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{delete, get, post},
};
use db::models::repository::{ConnectedRepository, CreateConnectedRepository};
use serde::{Deserialize, Serialize};
use services::services::github_api::parse_repo_url;
use tracing::info;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::CurrentUser};

#[derive(Debug, Deserialize, TS)]
pub struct ConnectRequest {
    pub url: String,
}

#[derive(Debug, Deserialize, TS)]
pub struct RepoChatRequest {
    pub repository_id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize, TS)]
pub struct RepoChatResponse {
    pub message: String,
}

/// POST /api/repo/connect
/// Resolve the URL against the live GitHub API and persist the metadata.
pub async fn connect(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    axum::Json(payload): axum::Json<ConnectRequest>,
) -> Result<ResponseJson<ApiResponse<ConnectedRepository>>, ApiError> {
    let repo_ref = parse_repo_url(&payload.url)?;
    let metadata = state.github().get_repository(&repo_ref).await?;

    let repository = ConnectedRepository::create(
        &state.db().pool,
        Uuid::new_v4(),
        user.id,
        &CreateConnectedRepository {
            name: metadata.name,
            full_name: metadata.full_name,
            description: metadata.description,
            url: metadata.html_url,
            language: metadata.language,
            stars: metadata.stargazers_count,
            forks: metadata.forks_count,
        },
    )
    .await?;

    info!(
        user_id = %user.id,
        repository = %repository.full_name,
        "Connected repository"
    );

    Ok(ResponseJson(ApiResponse::success(repository)))
}

pub async fn list_repositories(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ResponseJson<ApiResponse<Vec<ConnectedRepository>>>, ApiError> {
    let repositories = ConnectedRepository::list_for_user(&state.db().pool, user.id).await?;
    Ok(ResponseJson(ApiResponse::success(repositories)))
}

pub async fn disconnect(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(repository_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let deleted = ConnectedRepository::delete(&state.db().pool, repository_id, user.id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("repository"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

/// POST /api/repo/chat
/// Q&A over a stored repository; the prompt context comes from the row we
/// persisted, never from the client.
pub async fn repo_chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    axum::Json(payload): axum::Json<RepoChatRequest>,
) -> Result<ResponseJson<ApiResponse<RepoChatResponse>>, ApiError> {
    let repository =
        ConnectedRepository::find_by_id_and_user(&state.db().pool, payload.repository_id, user.id)
            .await?
            .ok_or(ApiError::NotFound("repository"))?;

    let message = state
        .assistant()
        .repo_chat(&repository, &payload.message)
        .await?;

    Ok(ResponseJson(ApiResponse::success(RepoChatResponse {
        message,
    })))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/api/repo",
        Router::new()
            .route("/", get(list_repositories))
            .route("/connect", post(connect))
            .route("/chat", post(repo_chat))
            .route("/{repository_id}", delete(disconnect)),
    )
}
