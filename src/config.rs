//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

use crate::error::AppError;

/// Subsystem configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `DB_MAX_CONNECTIONS` (optional): connection pool size, defaults to 5
/// - `ROOT_SECRET_COST` (optional): bcrypt cost factor for generated root
///   secrets, defaults to 15
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_root_secret_cost")]
    pub root_secret_cost: u32,
}

/// Default pool size if DB_MAX_CONNECTIONS is not set.
fn default_max_connections() -> u32 {
    5
}

/// Default bcrypt cost for root secrets.
///
/// Deliberately high: the secret is hashed once per provisioning, never
/// on a request path, so the slow cost factor is affordable.
fn default_root_secret_cost() -> u32 {
    15
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, AppError> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Parse environment variables into Config struct
        // Field names are automatically converted: database_url -> DATABASE_URL
        Ok(envy::from_env::<Config>()?)
    }
}
