//! Onboarding flow: reachable only while the caller's setup is incomplete
//! (the gatekeeper funnels everyone else away).

use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::project::{CreateProject, Project};
use serde::Serialize;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::CurrentUser};

#[derive(Debug, Serialize, TS)]
pub struct OnboardingStatus {
    pub complete: bool,
}

pub async fn status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ResponseJson<ApiResponse<OnboardingStatus>>, ApiError> {
    let complete = Project::count_for_user(&state.db().pool, user.id).await? > 0;
    Ok(ResponseJson(ApiResponse::success(OnboardingStatus {
        complete,
    })))
}

/// Create the caller's first project. The new row is the durable evidence
/// the gatekeeper checks, so the very next request sees the account as
/// fully onboarded.
pub async fn complete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    axum::Json(payload): axum::Json<CreateProject>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("project name must not be empty".to_string()));
    }

    let project = Project::create(&state.db().pool, Uuid::new_v4(), user.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/api/onboarding",
        Router::new()
            .route("/status", get(status))
            .route("/complete", post(complete)),
    )
}
