//! The gatekeeper layer: every request is classified and either passed
//! through or redirected before it reaches a handler.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use services::services::{
    auth::{AuthUser, find_session_token},
    gatekeeper::{GateDecision, RouteClass, classify_path, evaluate},
};

use crate::{AppState, error::ApiError};

pub async fn gatekeeper(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let route = classify_path(req.uri().path());

    // Public routes are allowed in every state; no provider round-trip.
    if route == RouteClass::Public {
        return next.run(req).await;
    }

    let token = find_session_token(jar.iter().map(|c| (c.name(), c.value())));
    let auth_state = state.gatekeeper().resolve_state(token).await;

    match evaluate(&auth_state, route) {
        GateDecision::Allow => {
            if let Some(user) = auth_state.user() {
                req.extensions_mut().insert(user.clone());
            }
            next.run(req).await
        }
        GateDecision::Redirect(target) => Redirect::temporary(target).into_response(),
    }
}

/// The identity the gatekeeper resolved for this request. Rejects with 401
/// when no identity was attached (only possible on routes the gatekeeper
/// lets through unauthenticated).
pub struct CurrentUser(pub AuthUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or(ApiError::Unauthorized)
    }
}
