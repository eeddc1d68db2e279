//! Auth surface: credential exchange with the identity provider and the
//! session cookies that carry its tokens.

use axum::{
    Router,
    extract::{Query, State},
    response::{Json as ResponseJson, Redirect},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use db::models::project::Project;
use serde::{Deserialize, Serialize};
use services::services::{
    auth::{AuthSession, AuthUser, REFRESH_COOKIE, SESSION_COOKIE},
    gatekeeper::{DASHBOARD_PATH, LOGIN_PATH, ONBOARDING_PATH},
};
use tracing::warn;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::CurrentUser};

#[derive(Debug, Deserialize, TS)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
}

/// Identity status for the frontend. `onboarding_complete` comes from the
/// durable record, not the provider's user metadata.
#[derive(Debug, Serialize, TS)]
pub struct UserStatus {
    pub id: Uuid,
    pub email: Option<String>,
    pub onboarding_complete: bool,
}

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn with_session_cookies(jar: CookieJar, session: &AuthSession) -> CookieJar {
    jar.add(session_cookie(SESSION_COOKIE, session.access_token.clone()))
        .add(session_cookie(REFRESH_COOKIE, session.refresh_token.clone()))
}

fn without_session_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(session_cookie(SESSION_COOKIE, String::new()))
        .remove(session_cookie(REFRESH_COOKIE, String::new()))
}

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    axum::Json(payload): axum::Json<Credentials>,
) -> Result<(CookieJar, ResponseJson<ApiResponse<AuthUser>>), ApiError> {
    let session = state
        .auth()
        .sign_up(&payload.email, &payload.password)
        .await?;
    let jar = with_session_cookies(jar, &session);
    Ok((jar, ResponseJson(ApiResponse::success(session.user))))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    axum::Json(payload): axum::Json<Credentials>,
) -> Result<(CookieJar, ResponseJson<ApiResponse<AuthUser>>), ApiError> {
    let session = state
        .auth()
        .sign_in_with_password(&payload.email, &payload.password)
        .await?;
    let jar = with_session_cookies(jar, &session);
    Ok((jar, ResponseJson(ApiResponse::success(session.user))))
}

/// Clears the session cookies; provider-side revocation is best effort.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, ResponseJson<ApiResponse<()>>) {
    if let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) {
        if let Err(e) = state.auth().sign_out(&token).await {
            warn!(error = %e, "Provider sign-out failed, clearing cookies anyway");
        }
    }
    let jar = without_session_cookies(jar);
    (jar, ResponseJson(ApiResponse::success(())))
}

/// Provider callback: exchange the code for a session, then land on
/// onboarding or the dashboard according to the durable record.
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect), ApiError> {
    let Some(code) = params.code else {
        return Ok((jar, Redirect::temporary(LOGIN_PATH)));
    };

    let session = state.auth().exchange_code(&code).await?;

    let complete = match Project::count_for_user(&state.db().pool, session.user.id).await {
        Ok(count) => count > 0,
        Err(e) => {
            warn!(
                user_id = %session.user.id,
                error = %e,
                "Onboarding lookup failed during callback, landing on onboarding"
            );
            false
        }
    };

    let jar = with_session_cookies(jar, &session);
    let target = if complete {
        DASHBOARD_PATH
    } else {
        ONBOARDING_PATH
    };
    Ok((jar, Redirect::temporary(target)))
}

/// Lives at /api/user, outside the AuthOnly prefix: it requires an
/// identity, so it is Protected like any other identity-bearing API route.
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ResponseJson<ApiResponse<UserStatus>>, ApiError> {
    let onboarding_complete = Project::count_for_user(&state.db().pool, user.id).await? > 0;

    Ok(ResponseJson(ApiResponse::success(UserStatus {
        id: user.id,
        email: user.email,
        onboarding_complete,
    })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/user", get(get_user))
        .route("/auth/callback", get(callback))
}
