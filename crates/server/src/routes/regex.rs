use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::regex_pattern::{CreateSavedRegexPattern, SavedRegexPattern};
use serde::{Deserialize, Serialize};
use services::services::{
    assistant::RegexSuggestion,
    regex_lab::{self, RegexFlags, RegexTestReport},
};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::CurrentUser};

#[derive(Debug, Deserialize, TS)]
pub struct GenerateRequest {
    pub description: String,
}

#[derive(Debug, Deserialize, TS)]
pub struct ExplainRequest {
    pub pattern: String,
}

#[derive(Debug, Serialize, TS)]
pub struct ExplainResponse {
    pub explanation: String,
}

#[derive(Debug, Deserialize, TS)]
pub struct TestRequest {
    pub pattern: String,
    pub text: String,
    #[serde(default)]
    pub flags: RegexFlags,
}

/// POST /api/regex/generate
pub async fn generate(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    axum::Json(payload): axum::Json<GenerateRequest>,
) -> Result<ResponseJson<ApiResponse<RegexSuggestion>>, ApiError> {
    let suggestion = state
        .assistant()
        .generate_regex(&payload.description)
        .await?;
    Ok(ResponseJson(ApiResponse::success(suggestion)))
}

/// POST /api/regex/explain
pub async fn explain(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    axum::Json(payload): axum::Json<ExplainRequest>,
) -> Result<ResponseJson<ApiResponse<ExplainResponse>>, ApiError> {
    let explanation = state.assistant().explain_regex(&payload.pattern).await?;
    Ok(ResponseJson(ApiResponse::success(ExplainResponse {
        explanation,
    })))
}

/// POST /api/regex/test
/// Pure evaluation on the native engine; no LLM involved.
pub async fn test(
    CurrentUser(_user): CurrentUser,
    axum::Json(payload): axum::Json<TestRequest>,
) -> ResponseJson<ApiResponse<RegexTestReport>> {
    let report = regex_lab::test_pattern(&payload.pattern, &payload.text, &payload.flags);
    ResponseJson(ApiResponse::success(report))
}

pub async fn list_patterns(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ResponseJson<ApiResponse<Vec<SavedRegexPattern>>>, ApiError> {
    let patterns = SavedRegexPattern::list_for_user(&state.db().pool, user.id).await?;
    Ok(ResponseJson(ApiResponse::success(patterns)))
}

pub async fn save_pattern(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    axum::Json(payload): axum::Json<CreateSavedRegexPattern>,
) -> Result<ResponseJson<ApiResponse<SavedRegexPattern>>, ApiError> {
    let saved =
        SavedRegexPattern::create(&state.db().pool, Uuid::new_v4(), user.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(saved)))
}

pub async fn delete_pattern(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(pattern_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let deleted = SavedRegexPattern::delete(&state.db().pool, pattern_id, user.id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("pattern"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/api/regex",
        Router::new()
            .route("/generate", post(generate))
            .route("/explain", post(explain))
            .route("/test", post(test))
            .route("/patterns", get(list_patterns).post(save_pattern))
            .route("/patterns/{pattern_id}", axum::routing::delete(delete_pattern)),
    )
}
