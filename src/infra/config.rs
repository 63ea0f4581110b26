//! Configuration loaded from environment variables (and `.env`, see
//! [`crate::infra::bootstrap::init_env`]).
//!
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: `10`)
//! - `HOST`: bind address (default: `"0.0.0.0"`)
//! - `PORT`: listen port (default: `5000`)

use std::{collections::HashMap, str::FromStr};

use anyhow::{Context, Result, anyhow};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Loads configuration from the process environment.
pub fn load() -> Result<AppConfig> {
    from_vars(&std::env::vars().collect())
}

fn from_vars(vars: &HashMap<String, String>) -> Result<AppConfig> {
    let url = vars
        .get("DATABASE_URL")
        .filter(|url| !url.trim().is_empty())
        .cloned()
        .ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;

    Ok(AppConfig {
        server: ServerConfig {
            host: vars
                .get("HOST")
                .cloned()
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(vars, "PORT", 5000)?,
        },
        database: DatabaseConfig {
            url,
            max_connections: parse_or(vars, "DATABASE_MAX_CONNECTIONS", 10)?,
        },
    })
}

fn parse_or<T>(vars: &HashMap<String, String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match vars.get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}
