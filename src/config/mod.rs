/// Database configuration and connection management
pub mod database;

/// Settings, cohorts and meal options loaded from config.toml
pub mod challenge;
