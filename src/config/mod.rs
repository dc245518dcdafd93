/// Application settings loaded from config.toml and the environment
pub mod app;

/// Database connection management and table creation
pub mod database;
