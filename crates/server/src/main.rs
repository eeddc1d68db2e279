use std::sync::Arc;

use db::DBService;
use server::{AppState, app_router, config::Config};
use services::services::{
    assistant::AssistantService,
    auth::AuthClient,
    gatekeeper::{Gatekeeper, ProjectCompletionStore},
    github_api::GitHubApiClient,
    groq_api::GroqApiClient,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let db = DBService::new(&config.database_url).await?;

    let auth = Arc::new(AuthClient::new(
        &config.supabase_url,
        config.supabase_anon_key.clone(),
    )?);
    let completion = Arc::new(ProjectCompletionStore::new(db.pool.clone()));
    let gatekeeper = Arc::new(Gatekeeper::new(auth.clone(), completion));
    let assistant = Arc::new(AssistantService::new(GroqApiClient::from_env()?));
    let github = Arc::new(GitHubApiClient::new(config.github_token.clone())?);

    let state = AppState::new(db, gatekeeper, auth, assistant, github);
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!("GitStack listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
