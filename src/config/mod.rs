/// Database configuration and connection management
pub mod database;

/// Seed users and products loaded from config.toml
pub mod seed;

/// HTTP listener address from environment variables
pub mod server;
