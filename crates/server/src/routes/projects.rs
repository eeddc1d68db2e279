use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::project::{CreateProject, Project, UpdateProject};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::CurrentUser};

pub async fn list_projects(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ResponseJson<ApiResponse<Vec<Project>>>, ApiError> {
    let projects = Project::list_for_user(&state.db().pool, user.id).await?;
    Ok(ResponseJson(ApiResponse::success(projects)))
}

pub async fn create_project(
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

pub async fn get_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    let project = Project::find_by_id_and_user(&state.db().pool, project_id, user.id)
        .await?
        .ok_or(ApiError::NotFound("project"))?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

pub async fn update_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateProject>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    let project = Project::update(&state.db().pool, project_id, user.id, &payload)
        .await?
        .ok_or(ApiError::NotFound("project"))?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

pub async fn delete_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let deleted = Project::delete(&state.db().pool, project_id, user.id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("project"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/api/projects",
        Router::new()
            .route("/", get(list_projects).post(create_project))
            .route(
                "/{project_id}",
                get(get_project).put(update_project).delete(delete_project),
            ),
    )
}
