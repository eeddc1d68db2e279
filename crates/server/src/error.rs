use axum::{
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
};
use services::services::{
    auth::AuthError, github_api::GitHubApiError, groq_api::GroqApiError,
};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    GroqApi(#[from] GroqApiError),
    #[error(transparent)]
    GitHubApi(#[from] GitHubApiError),
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0} not found")]
    NotFound(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(_) => StatusCode::BAD_GATEWAY,
            ApiError::GroqApi(GroqApiError::MissingApiKey | GroqApiError::InvalidApiKey) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::GroqApi(_) => StatusCode::BAD_GATEWAY,
            ApiError::GitHubApi(GitHubApiError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::GitHubApi(GitHubApiError::InvalidRepoUrl(_)) => StatusCode::BAD_REQUEST,
            ApiError::GitHubApi(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        (
            status,
            ResponseJson(ApiResponse::<()>::error(self.to_string())),
        )
            .into_response()
    }
}
