use axum::{Router, extract::State, response::Json as ResponseJson, routing::post};
use db::models::project::Project;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::CurrentUser};

#[derive(Debug, Deserialize, TS)]
pub struct ChatRequest {
    pub project_id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize, TS)]
pub struct ChatResponse {
    pub message: String,
}

/// POST /api/chat
/// Project assistant: one prompt in, the model's text out verbatim.
pub async fn chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    axum::Json(payload): axum::Json<ChatRequest>,
) -> Result<ResponseJson<ApiResponse<ChatResponse>>, ApiError> {
    let project = Project::find_by_id_and_user(&state.db().pool, payload.project_id, user.id)
        .await?
        .ok_or(ApiError::NotFound("project"))?;

    let message = state
        .assistant()
        .project_chat(&project, &payload.message)
        .await?;

    Ok(ResponseJson(ApiResponse::success(ChatResponse { message })))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/chat", post(chat))
}
