pub mod assistant;
pub mod auth;
pub mod gatekeeper;
pub mod github_api;
pub mod groq_api;
pub mod regex_lab;
