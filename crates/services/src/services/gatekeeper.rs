//! Request gatekeeper: decides, for every inbound request, whether to let
//! it through or redirect it to the login, onboarding, or dashboard entry.
//!
//! The decision is re-derived fresh on every request, nothing is cached,
//! so a logout or account change takes effect on the next request. Any
//! provider failure resolves to the most restrictive applicable state.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use db::models::project::Project;
use sqlx::SqlitePool;
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use super::auth::{AuthUser, IdentityProvider};

/// Where unauthenticated requests are sent.
pub const LOGIN_PATH: &str = "/auth/login";
/// Where authenticated-but-incomplete requests are sent.
pub const ONBOARDING_PATH: &str = "/onboarding";
/// Where fully onboarded requests are sent when they hit auth/onboarding routes.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Access tier of a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    AuthOnly,
    OnboardingOnly,
    Protected,
}

// Exact-match public paths. "/" is the landing page; the health probe and
// sign-out must be reachable from every state (sign-out only clears
// credentials).
const PUBLIC_PATHS: &[&str] = &["/", "/favicon.ico", "/api/health", "/api/auth/logout"];

// Prefix table. Longest-prefix semantics are not needed: the prefixes are
// non-overlapping apart from /api/auth/logout, which is matched exactly
// above before this table is consulted. Frontend bundle assets are public:
// the login page cannot load its own scripts otherwise.
const PREFIX_TABLE: &[(&str, RouteClass)] = &[
    ("/assets", RouteClass::Public),
    ("/auth", RouteClass::AuthOnly),
    ("/api/auth", RouteClass::AuthOnly),
    ("/onboarding", RouteClass::OnboardingOnly),
    ("/api/onboarding", RouteClass::OnboardingOnly),
];

/// Classify a request path. Unclassified paths are Protected, never Public.
pub fn classify_path(path: &str) -> RouteClass {
    if PUBLIC_PATHS.contains(&path) {
        return RouteClass::Public;
    }
    for (prefix, class) in PREFIX_TABLE {
        if path == *prefix || (path.starts_with(prefix) && path.as_bytes()[prefix.len()] == b'/') {
            return *class;
        }
    }
    RouteClass::Protected
}

/// Authentication state of the requester, resolved per request.
#[derive(Debug, Clone)]
pub enum AuthState {
    Unauthenticated,
    AuthenticatedIncomplete(AuthUser),
    AuthenticatedComplete(AuthUser),
}

impl AuthState {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Self::Unauthenticated => None,
            Self::AuthenticatedIncomplete(user) | Self::AuthenticatedComplete(user) => Some(user),
        }
    }
}

/// Outcome of evaluating the policy for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(&'static str),
}

/// The redirect policy: pure function over (state, route class).
///
/// Guarantees: unauthenticated requesters never reach Protected or
/// OnboardingOnly routes; authenticated-but-incomplete requesters are
/// funneled to onboarding before any Protected route. Public routes are
/// allowed in every state.
pub fn evaluate(state: &AuthState, route: RouteClass) -> GateDecision {
    use AuthState::*;
    use RouteClass::*;

    match (state, route) {
        (_, Public) => GateDecision::Allow,

        (Unauthenticated, AuthOnly) => GateDecision::Allow,
        (Unauthenticated, OnboardingOnly | Protected) => GateDecision::Redirect(LOGIN_PATH),

        (AuthenticatedIncomplete(_), OnboardingOnly) => GateDecision::Allow,
        (AuthenticatedIncomplete(_), AuthOnly | Protected) => {
            GateDecision::Redirect(ONBOARDING_PATH)
        }

        (AuthenticatedComplete(_), Protected) => GateDecision::Allow,
        (AuthenticatedComplete(_), AuthOnly | OnboardingOnly) => {
            GateDecision::Redirect(DASHBOARD_PATH)
        }
    }
}

/// Durable onboarding-completion evidence for an identity.
#[async_trait]
pub trait CompletionStore: Send + Sync {
    async fn onboarding_complete(&self, user_id: Uuid) -> Result<bool, sqlx::Error>;
}

/// Completion evidence = at least one project owned by the identity.
/// The provider's user-metadata flag is deliberately not consulted: a
/// client-writable flag must never override the durable record.
pub struct ProjectCompletionStore {
    pool: SqlitePool,
}

impl ProjectCompletionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompletionStore for ProjectCompletionStore {
    async fn onboarding_complete(&self, user_id: Uuid) -> Result<bool, sqlx::Error> {
        Ok(Project::count_for_user(&self.pool, user_id).await? > 0)
    }
}

/// Per-request gatekeeper over injected provider/record-store clients.
pub struct Gatekeeper {
    provider: Arc<dyn IdentityProvider>,
    completion: Arc<dyn CompletionStore>,
    lookup_timeout: Duration,
}

impl Gatekeeper {
    const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

    pub fn new(provider: Arc<dyn IdentityProvider>, completion: Arc<dyn CompletionStore>) -> Self {
        Self::with_timeout(provider, completion, Self::DEFAULT_LOOKUP_TIMEOUT)
    }

    pub fn with_timeout(
        provider: Arc<dyn IdentityProvider>,
        completion: Arc<dyn CompletionStore>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            completion,
            lookup_timeout,
        }
    }

    /// Resolve the requester's state from the session token, if any.
    ///
    /// Fail-closed throughout: a provider error or timeout yields
    /// Unauthenticated; a completion-lookup failure on a confirmed
    /// identity yields AuthenticatedIncomplete.
    pub async fn resolve_state(&self, session_token: Option<&str>) -> AuthState {
        let Some(token) = session_token else {
            return AuthState::Unauthenticated;
        };

        let user = match timeout(self.lookup_timeout, self.provider.get_user(token)).await {
            Ok(Ok(Some(user))) => user,
            Ok(Ok(None)) => return AuthState::Unauthenticated,
            Ok(Err(e)) => {
                warn!(error = %e, "Identity provider lookup failed, treating as unauthenticated");
                return AuthState::Unauthenticated;
            }
            Err(_) => {
                warn!("Identity provider lookup timed out, treating as unauthenticated");
                return AuthState::Unauthenticated;
            }
        };

        match timeout(self.lookup_timeout, self.completion.onboarding_complete(user.id)).await {
            Ok(Ok(true)) => AuthState::AuthenticatedComplete(user),
            Ok(Ok(false)) => AuthState::AuthenticatedIncomplete(user),
            Ok(Err(e)) => {
                warn!(
                    user_id = %user.id,
                    error = %e,
                    "Onboarding lookup failed, treating as incomplete"
                );
                AuthState::AuthenticatedIncomplete(user)
            }
            Err(_) => {
                warn!(user_id = %user.id, "Onboarding lookup timed out, treating as incomplete");
                AuthState::AuthenticatedIncomplete(user)
            }
        }
    }

    /// Resolve state and evaluate the policy for the given path.
    pub async fn check(&self, path: &str, session_token: Option<&str>) -> GateDecision {
        let route = classify_path(path);
        // Public routes are allowed in every state; skip the provider
        // round-trip entirely.
        if route == RouteClass::Public {
            return GateDecision::Allow;
        }
        evaluate(&self.resolve_state(session_token).await, route)
    }
}
