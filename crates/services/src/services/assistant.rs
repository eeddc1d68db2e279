//! AI assistant features: project chat, repository Q&A, regex generation
//! and explanation. Prompts are built here; the routes stay thin.

use db::models::{project::Project, repository::ConnectedRepository};
use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;

use super::groq_api::{GroqApiClient, GroqApiError, extract_json};

const CHAT_MAX_TOKENS: u32 = 1000;
const GENERATE_MAX_TOKENS: u32 = 500;
const EXPLAIN_MAX_TOKENS: u32 = 800;

/// A generated pattern with its explanation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct RegexSuggestion {
    pub pattern: String,
    pub explanation: String,
}

/// Stateless facade over the completion client.
#[derive(Debug, Clone)]
pub struct AssistantService {
    groq: GroqApiClient,
}

impl AssistantService {
    pub fn new(groq: GroqApiClient) -> Self {
        Self { groq }
    }

    /// Answer a question in the context of the user's project.
    pub async fn project_chat(
        &self,
        project: &Project,
        message: &str,
    ) -> Result<String, GroqApiError> {
        let system = format!(
            "You are a private coding assistant for the project \"{}\".\n\n\
             Project description: {}\n\n\
             Help the user with code implementation questions, architecture \
             decisions, best practices for their specific project, debugging \
             and troubleshooting, and code reviews. Be concise, practical, \
             and focus on actionable advice in the context of their project.",
            project.name,
            project.description.as_deref().unwrap_or("(none)"),
        );

        info!(project_id = %project.id, "Project chat request");
        self.groq.ask(message, Some(&system), CHAT_MAX_TOKENS).await
    }

    /// Answer a question about a connected repository.
    pub async fn repo_chat(
        &self,
        repository: &ConnectedRepository,
        message: &str,
    ) -> Result<String, GroqApiError> {
        let system = format!(
            "You are a code analysis assistant for the GitHub repository \"{}\".\n\n\
             Repository details:\n\
             - Name: {}\n\
             - Description: {}\n\
             - Primary language: {}\n\
             - Stars: {}\n\
             - URL: {}\n\n\
             You help developers understand codebases: explain structure and \
             architecture, identify patterns, suggest improvements, and answer \
             questions about functionality and dependencies. If you would need \
             to see specific code to answer, say so.",
            repository.full_name,
            repository.name,
            repository.description.as_deref().unwrap_or("(none)"),
            repository.language.as_deref().unwrap_or("unknown"),
            repository.stars,
            repository.url,
        );

        info!(repository_id = %repository.id, "Repository chat request");
        self.groq.ask(message, Some(&system), CHAT_MAX_TOKENS).await
    }

    /// Generate a regex pattern from a plain-language description.
    ///
    /// The model is asked for JSON; if its output cannot be parsed, the raw
    /// text is returned as the pattern rather than failing the request.
    pub async fn generate_regex(
        &self,
        description: &str,
    ) -> Result<RegexSuggestion, GroqApiError> {
        let system = "You are a regex expert. Generate a regex pattern based on the \
                      user's description.\n\n\
                      Rules:\n\
                      1. Return ONLY the regex pattern, no delimiters like / /\n\
                      2. Make the pattern as accurate and efficient as possible\n\
                      3. Include common edge cases\n\
                      4. Use proper escaping for special characters\n\n\
                      Format your response as JSON:\n\
                      {\"pattern\": \"your_regex_pattern_here\", \
                      \"explanation\": \"Brief explanation of what the pattern matches\"}";

        let prompt = format!("Generate a regex pattern for: {description}");
        let text = self
            .groq
            .ask(&prompt, Some(system), GENERATE_MAX_TOKENS)
            .await?;

        match serde_json::from_str::<RegexSuggestion>(extract_json(&text)) {
            Ok(suggestion) => Ok(suggestion),
            Err(_) => Ok(RegexSuggestion {
                pattern: text.trim().to_string(),
                explanation: "AI-generated regex pattern".to_string(),
            }),
        }
    }

    /// Explain a regex pattern in plain English.
    pub async fn explain_regex(&self, pattern: &str) -> Result<String, GroqApiError> {
        let system = "You are a regex expert. Explain regex patterns in plain English. \
                      Break the pattern down piece by piece, explain what each part \
                      does in simple language, and state what the overall pattern \
                      matches. Keep the explanation concise but comprehensive.";

        let prompt = format!("Explain this regex pattern: {pattern}");
        let text = self
            .groq
            .ask(&prompt, Some(system), EXPLAIN_MAX_TOKENS)
            .await?;
        Ok(text.trim().to_string())
    }
}
