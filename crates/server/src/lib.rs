pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use db::DBService;
use services::services::{
    assistant::AssistantService, auth::AuthClient, gatekeeper::Gatekeeper,
    github_api::GitHubApiClient,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Everything the routes need, constructed once at startup and cloned per
/// request. Clients are injected here so tests can substitute fakes.
#[derive(Clone)]
pub struct AppState {
    db: DBService,
    gatekeeper: Arc<Gatekeeper>,
    auth: Arc<AuthClient>,
    assistant: Arc<AssistantService>,
    github: Arc<GitHubApiClient>,
}

impl AppState {
    pub fn new(
        db: DBService,
        gatekeeper: Arc<Gatekeeper>,
        auth: Arc<AuthClient>,
        assistant: Arc<AssistantService>,
        github: Arc<GitHubApiClient>,
    ) -> Self {
        Self {
            db,
            gatekeeper,
            auth,
            assistant,
            github,
        }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn gatekeeper(&self) -> &Gatekeeper {
        &self.gatekeeper
    }

    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    pub fn assistant(&self) -> &AssistantService {
        &self.assistant
    }

    pub fn github(&self) -> &GitHubApiClient {
        &self.github
    }
}

/// Assemble the full application router. The gatekeeper layer wraps every
/// route, including the frontend fallback.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::auth::router())
        .merge(routes::projects::router())
        .merge(routes::onboarding::router())
        .merge(routes::assistant::router())
        .merge(routes::regex::router())
        .merge(routes::repo::router())
        .fallback(routes::frontend::serve)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::gatekeeper,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
