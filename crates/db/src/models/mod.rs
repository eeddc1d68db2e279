pub mod project;
pub mod regex_pattern;
pub mod repository;
