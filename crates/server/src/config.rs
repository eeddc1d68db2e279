use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

/// Server configuration, read once at startup. No module-level state:
/// everything constructed from this is passed down explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub github_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("GITSTACK_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = match env::var("GITSTACK_PORT") {
            Ok(value) => value
                .parse()
                .map_err(|e: std::num::ParseIntError| ConfigError::Invalid("GITSTACK_PORT", e.to_string()))?,
            Err(_) => 8080,
        };
        let database_url =
            env::var("GITSTACK_DATABASE_URL").unwrap_or_else(|_| "sqlite:gitstack.db".to_string());
        let supabase_url = env::var("SUPABASE_URL").map_err(|_| ConfigError::Missing("SUPABASE_URL"))?;
        let supabase_anon_key =
            env::var("SUPABASE_ANON_KEY").map_err(|_| ConfigError::Missing("SUPABASE_ANON_KEY"))?;
        let github_token = env::var("GITHUB_TOKEN").ok();

        Ok(Self {
            host,
            port,
            database_url,
            supabase_url,
            supabase_anon_key,
            github_token,
        })
    }
}
