use std::{net::SocketAddr, str::FromStr};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub database_max_connections: u32,
    pub session_secure: bool,
    pub session_idle_minutes: i64,
}

impl Config {
    /// Reads the environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &'static str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        Ok(Config {
            database_url: var("DATABASE_URL", "sqlite://studybud.db?mode=rwc"),
            bind_addr: parse("BIND_ADDR", var("BIND_ADDR", "0.0.0.0:8080"))?,
            database_max_connections: parse(
                "DATABASE_MAX_CONNECTIONS",
                var("DATABASE_MAX_CONNECTIONS", "16"),
            )?,
            session_secure: parse("SESSION_SECURE", var("SESSION_SECURE", "false"))?,
            session_idle_minutes: parse("SESSION_IDLE_MINUTES", var("SESSION_IDLE_MINUTES", "60"))?,
        })
    }
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid { key, value })
}
