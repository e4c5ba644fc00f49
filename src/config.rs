//! Configuration module
//!
//! Loads configuration from environment variables once at startup.
//! Components receive the parts they need explicitly.

use std::env;
use std::str::FromStr;

use crate::security::HashingParams;

/// Which storage backend the server runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    Memory,
}

impl FromStr for StorageKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageKind::Postgres),
            "memory" => Ok(StorageKind::Memory),
            _ => Err(ConfigError::InvalidValue("STORAGE")),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage backend
    pub storage: StorageKind,

    /// Database connection URL (required for the postgres backend)
    pub database_url: Option<String>,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Minimum accepted password length, in characters
    pub min_password_length: usize,

    /// Argon2 cost parameters
    pub hashing: HashingParams,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let storage = env::var("STORAGE")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()?;

        let database_url = env::var("DATABASE_URL").ok();
        if storage == StorageKind::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnv("DATABASE_URL"));
        }

        let database_max_connections = parse_or("DATABASE_MAX_CONNECTIONS", 10)?;

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("PORT", 5000)?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let min_password_length = parse_or("MIN_PASSWORD_LENGTH", 8)?;
        if min_password_length == 0 {
            return Err(ConfigError::InvalidValue("MIN_PASSWORD_LENGTH"));
        }

        let defaults = HashingParams::default();
        let hashing = HashingParams {
            memory_kib: parse_or("HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or("HASH_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or("HASH_PARALLELISM", defaults.parallelism)?,
        };

        Ok(Self {
            storage,
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            min_password_length,
            hashing,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Read `key` and parse it, falling back to `default` when unset
fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(key)),
        Err(_) => Ok(default),
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
