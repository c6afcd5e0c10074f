//! Runtime settings read from the environment (after `.env` is loaded by the binary).

use crate::error::AppError;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/cosmos";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    pub max_connections: u32,
    /// Upper bound applied to `limit` by the HTTP layer.
    pub max_page_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: DEFAULT_DATABASE_URL.into(),
            bind_addr: DEFAULT_BIND_ADDR.into(),
            max_connections: 5,
            max_page_size: 100,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        Ok(Settings {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            max_connections: parse_or("DB_MAX_CONNECTIONS", lookup("DB_MAX_CONNECTIONS"), defaults.max_connections)?,
            max_page_size: parse_or("MAX_PAGE_SIZE", lookup("MAX_PAGE_SIZE"), defaults.max_page_size)?,
        })
    }
}

fn parse_or(key: &str, raw: Option<String>, default: u32) -> Result<u32, AppError> {
    let Some(s) = raw else { return Ok(default) };
    match s.trim().parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(AppError::Config(format!("{} must be a positive integer, got '{}'", key, s))),
    }
}
