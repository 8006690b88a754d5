use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    pub kitchen_url: String,
    pub user_url: String,
    pub timeout_secs: u64,
    /// Directories expose `POST /.../lookup`; when false, fall back to per-id calls.
    pub batch_lookup: bool,
    /// Upper bound on concurrent per-id calls in the fallback path.
    pub enrich_concurrency: usize,
}

impl DirectoryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub directory: DirectoryConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let directory = DirectoryConfig {
            kitchen_url: std::env::var("KITCHEN_DIRECTORY_URL")
                .context("KITCHEN_DIRECTORY_URL is not set")?,
            user_url: std::env::var("USER_DIRECTORY_URL")
                .context("USER_DIRECTORY_URL is not set")?,
            timeout_secs: parse_or("DIRECTORY_TIMEOUT_SECS", 5),
            batch_lookup: parse_or("DIRECTORY_BATCH_LOOKUP", true),
            enrich_concurrency: parse_or("ENRICH_CONCURRENCY", 8),
        };
        Ok(Self {
            database_url,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_or("APP_PORT", 8080),
            directory,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
