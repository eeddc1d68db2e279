//! Client for the hosted identity provider (GoTrue-compatible HTTP API).
//!
//! The gatekeeper and the auth routes talk to the provider exclusively
//! through [`IdentityProvider`], so tests can substitute a fake without
//! touching module-level state.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// Cookie carrying the provider access token.
pub const SESSION_COOKIE: &str = "sb-access-token";
/// Cookie carrying the provider refresh token.
pub const REFRESH_COOKIE: &str = "sb-refresh-token";
/// Reserved prefix/suffix pair for provider-issued session cookies.
const SESSION_COOKIE_PREFIX: &str = "sb-";
const SESSION_COOKIE_SUFFIX: &str = "-auth-token";

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("json error: {0}")]
    Serde(String),
    #[error("invalid provider url: {0}")]
    InvalidBaseUrl(String),
}

/// Identity as reported by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

/// Token pair issued by the provider at sign-in/sign-up/code exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: AuthUser,
}

/// The subset of the provider the gatekeeper depends on.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Validate an access token with the provider and return the identity
    /// it belongs to, or `None` for an invalid/expired token.
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, AuthError>;
}

/// Find the provider session token among the request cookies.
///
/// The exact provider cookie name wins; a cookie matching the reserved
/// `sb-*-auth-token` naming pattern is accepted as a fallback. Presence
/// alone never authenticates: the token is always verified with the
/// provider afterwards.
pub fn find_session_token<'a, I>(cookies: I) -> Option<&'a str>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut fallback = None;
    for (name, value) in cookies {
        if name == SESSION_COOKIE {
            return Some(value);
        }
        if name.starts_with(SESSION_COOKIE_PREFIX)
            && name.ends_with(SESSION_COOKIE_SUFFIX)
            && fallback.is_none()
        {
            fallback = Some(value);
        }
    }
    fallback
}

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct CodeExchange<'a> {
    auth_code: &'a str,
}

/// HTTP client for the provider's auth API.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: Client,
    base_url: Url,
    anon_key: String,
}

impl AuthClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(base_url: &str, anon_key: String) -> Result<Self, AuthError> {
        let base_url =
            Url::parse(base_url).map_err(|e| AuthError::InvalidBaseUrl(e.to_string()))?;
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("gitstack/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            anon_key,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        self.base_url
            .join(path)
            .map_err(|e| AuthError::InvalidBaseUrl(e.to_string()))
    }

    /// Register a new identity with email/password.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let url = self.endpoint("/auth/v1/signup")?;
        let res = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_session(res).await
    }

    /// Exchange email/password for a session (password grant).
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let mut url = self.endpoint("/auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let res = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_session(res).await
    }

    /// Exchange a PKCE authorization code from the provider callback.
    pub async fn exchange_code(&self, code: &str) -> Result<AuthSession, AuthError> {
        let mut url = self.endpoint("/auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "pkce");
        let res = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&CodeExchange { auth_code: code })
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_session(res).await
    }

    /// Revoke the session behind the given access token.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let url = self.endpoint("/auth/v1/logout")?;
        let res = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => Ok(()),
            // Revoking an already-dead token is a no-op, not a failure.
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => Ok(()),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(AuthError::Http { status, body })
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for AuthClient {
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, AuthError> {
        let url = self.endpoint("/auth/v1/user")?;
        let res = self
            .http
            .get(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => res
                .json::<AuthUser>()
                .await
                .map(Some)
                .map_err(|e| AuthError::Serde(e.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(AuthError::Http { status, body })
            }
        }
    }
}

async fn read_session(res: reqwest::Response) -> Result<AuthSession, AuthError> {
    match res.status() {
        s if s.is_success() => res
            .json::<AuthSession>()
            .await
            .map_err(|e| AuthError::Serde(e.to_string())),
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY => {
            Err(AuthError::InvalidCredentials)
        }
        s => {
            let status = s.as_u16();
            let body = res.text().await.unwrap_or_default();
            Err(AuthError::Http { status, body })
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> AuthError {
    if e.is_timeout() {
        AuthError::Timeout
    } else {
        AuthError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_session_cookie_wins() {
        let cookies = [
            ("theme", "dark"),
            ("sb-abcd-auth-token", "fallback"),
            (SESSION_COOKIE, "primary"),
        ];
        assert_eq!(find_session_token(cookies), Some("primary"));
    }

    #[test]
    fn reserved_prefix_fallback_is_accepted() {
        let cookies = [("theme", "dark"), ("sb-projectref-auth-token", "tok")];
        assert_eq!(find_session_token(cookies), Some("tok"));
    }

    #[test]
    fn unrelated_cookies_never_match() {
        let cookies = [
            ("theme", "dark"),
            ("sb-preferences", "x"),
            ("other-auth-token", "y"),
        ];
        assert_eq!(find_session_token(cookies), None);
    }
}
