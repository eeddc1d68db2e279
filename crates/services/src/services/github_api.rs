//! GitHub REST client for repository metadata.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use thiserror::Error;

const GITHUB_API_URL: &str = "https://api.github.com";

static REPO_URL_RE: Lazy<Regex> = Lazy::new(|| {
    // Owner and repo segments of a github.com URL, tolerating a trailing
    // ".git" or "/".
    Regex::new(r"github\.com[/:]([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+?)(?:\.git)?/?$")
        .expect("repo url regex is valid")
});

#[derive(Debug, Clone, Error)]
pub enum GitHubApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("repository not found")]
    NotFound,
    #[error("rate limited")]
    RateLimited,
    #[error("json error: {0}")]
    Serde(String),
    #[error("not a GitHub repository url: {0}")]
    InvalidRepoUrl(String),
}

/// Owner/name pair parsed out of a repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Parse `https://github.com/{owner}/{repo}` (and close variants).
pub fn parse_repo_url(url: &str) -> Result<RepoRef, GitHubApiError> {
    let captures = REPO_URL_RE
        .captures(url.trim())
        .ok_or_else(|| GitHubApiError::InvalidRepoUrl(url.to_string()))?;
    Ok(RepoRef {
        owner: captures[1].to_string(),
        repo: captures[2].to_string(),
    })
}

/// Repository metadata as returned by `GET /repos/{owner}/{repo}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoMetadata {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub language: Option<String>,
    pub stargazers_count: i64,
    pub forks_count: i64,
}

/// GitHub REST API client. A token raises the rate limit and grants access
/// to private repositories; without one only public metadata is reachable.
#[derive(Debug, Clone)]
pub struct GitHubApiClient {
    http: Client,
    token: Option<String>,
}

impl GitHubApiClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(token: Option<String>) -> Result<Self, GitHubApiError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("gitstack/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GitHubApiError::Transport(e.to_string()))?;

        Ok(Self { http, token })
    }

    /// Fetch live metadata for the referenced repository.
    pub async fn get_repository(&self, repo: &RepoRef) -> Result<RepoMetadata, GitHubApiError> {
        let url = format!("{}/repos/{}/{}", GITHUB_API_URL, repo.owner, repo.repo);

        let mut request = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("x-github-api-version", "2022-11-28");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let res = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GitHubApiError::Timeout
            } else {
                GitHubApiError::Transport(e.to_string())
            }
        })?;

        match res.status() {
            s if s.is_success() => res
                .json::<RepoMetadata>()
                .await
                .map_err(|e| GitHubApiError::Serde(e.to_string())),
            StatusCode::NOT_FOUND => Err(GitHubApiError::NotFound),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                Err(GitHubApiError::RateLimited)
            }
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(GitHubApiError::Http { status, body })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_https_url() {
        let parsed = parse_repo_url("https://github.com/rust-lang/rust").unwrap();
        assert_eq!(parsed.owner, "rust-lang");
        assert_eq!(parsed.repo, "rust");
        assert_eq!(parsed.full_name(), "rust-lang/rust");
    }

    #[test]
    fn parses_git_suffix_and_trailing_slash() {
        let parsed = parse_repo_url("https://github.com/tokio-rs/tokio.git").unwrap();
        assert_eq!(parsed.repo, "tokio");

        let parsed = parse_repo_url("https://github.com/tokio-rs/tokio/").unwrap();
        assert_eq!(parsed.repo, "tokio");
    }

    #[test]
    fn rejects_non_github_urls() {
        assert!(parse_repo_url("https://gitlab.com/owner/repo").is_err());
        assert!(parse_repo_url("not a url").is_err());
        assert!(parse_repo_url("https://github.com/owner-only").is_err());
    }
}
