//! End-to-end gatekeeper behavior through the real router, with the
//! identity provider and completion store swapped for fakes.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use db::DBService;
use server::{AppState, app_router};
use sqlx::sqlite::SqlitePoolOptions;
use services::services::{
    assistant::AssistantService,
    auth::{AuthClient, AuthError, AuthUser, IdentityProvider},
    gatekeeper::{CompletionStore, Gatekeeper},
    github_api::GitHubApiClient,
    groq_api::GroqApiClient,
};
use tower::ServiceExt;
use uuid::Uuid;

struct FakeProvider {
    user: Option<AuthUser>,
    delay: Option<Duration>,
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn get_user(&self, _access_token: &str) -> Result<Option<AuthUser>, AuthError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.user.clone())
    }
}

struct FakeCompletion {
    complete: bool,
}

#[async_trait]
impl CompletionStore for FakeCompletion {
    async fn onboarding_complete(&self, _user_id: Uuid) -> Result<bool, sqlx::Error> {
        Ok(self.complete)
    }
}

fn fake_user() -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        email: Some("dev@example.com".to_string()),
        user_metadata: serde_json::Value::Null,
    }
}

// One connection keeps the in-memory database (and its migrated schema)
// alive and shared for the whole test.
async fn test_db() -> DBService {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("../db/migrations").run(&pool).await.unwrap();
    DBService { pool }
}

async fn app(provider: FakeProvider, completion: FakeCompletion) -> Router {
    let db = test_db().await;
    let gatekeeper = Arc::new(Gatekeeper::with_timeout(
        Arc::new(provider),
        Arc::new(completion),
        Duration::from_millis(50),
    ));
    // Real clients pointed at unroutable endpoints; these tests never call
    // out.
    let auth = Arc::new(AuthClient::new("http://127.0.0.1:9", "anon".to_string()).unwrap());
    let assistant = Arc::new(AssistantService::new(
        GroqApiClient::new("test-key".to_string(), None).unwrap(),
    ));
    let github = Arc::new(GitHubApiClient::new(None).unwrap());

    app_router(AppState::new(db, gatekeeper, auth, assistant, github))
}

async fn get(app: &Router, path: &str, cookie: Option<&str>) -> axum::response::Response {
    let mut builder = Request::builder().uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect must carry a Location header")
        .to_str()
        .unwrap()
}

const SESSION: &str = "sb-access-token=tok";

#[tokio::test]
async fn dashboard_without_credentials_redirects_to_login() {
    let app = app(
        FakeProvider { user: None, delay: None },
        FakeCompletion { complete: false },
    )
    .await;

    let response = get(&app, "/dashboard", None).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn login_page_while_onboarding_incomplete_redirects_to_onboarding() {
    let app = app(
        FakeProvider { user: Some(fake_user()), delay: None },
        FakeCompletion { complete: false },
    )
    .await;

    let response = get(&app, "/auth/login", Some(SESSION)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/onboarding");
}

#[tokio::test]
async fn onboarding_page_after_completion_redirects_to_dashboard() {
    let app = app(
        FakeProvider { user: Some(fake_user()), delay: None },
        FakeCompletion { complete: true },
    )
    .await;

    let response = get(&app, "/onboarding", Some(SESSION)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn dashboard_with_completed_onboarding_is_allowed() {
    let app = app(
        FakeProvider { user: Some(fake_user()), delay: None },
        FakeCompletion { complete: true },
    )
    .await;

    let response = get(&app, "/dashboard", Some(SESSION)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn landing_page_without_credentials_is_allowed() {
    let app = app(
        FakeProvider { user: None, delay: None },
        FakeCompletion { complete: false },
    )
    .await;

    let response = get(&app, "/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn provider_timeout_fails_closed_to_login() {
    let app = app(
        FakeProvider {
            user: Some(fake_user()),
            delay: Some(Duration::from_millis(200)),
        },
        FakeCompletion { complete: true },
    )
    .await;

    let response = get(&app, "/dashboard", Some(SESSION)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn protected_api_route_redirects_unauthenticated() {
    let app = app(
        FakeProvider { user: None, delay: None },
        FakeCompletion { complete: false },
    )
    .await;

    let response = get(&app, "/api/projects", None).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn incomplete_account_reaches_onboarding_api() {
    let app = app(
        FakeProvider { user: Some(fake_user()), delay: None },
        FakeCompletion { complete: false },
    )
    .await;

    let response = get(&app, "/api/onboarding/status", Some(SESSION)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn user_status_reaches_handler_with_identity_attached() {
    let app = app(
        FakeProvider { user: Some(fake_user()), delay: None },
        FakeCompletion { complete: true },
    )
    .await;

    let response = get(&app, "/api/user", Some(SESSION)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_probe_is_public() {
    let app = app(
        FakeProvider { user: None, delay: None },
        FakeCompletion { complete: false },
    )
    .await;

    let response = get(&app, "/api/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
