// ABOUTME: Runtime configuration loaded from environment variables with logged defaults
// ABOUTME: Covers the listener, database, token signing, password work factor, and catalog client

use anyhow::{anyhow, Result};
use std::{env, fmt::Display, str::FromStr, time::Duration};
use tracing::{info, warn};

const DEV_SECRET: &str = "secret-dev";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub secret_key: String,
    pub token_ttl_secs: i64,
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub catalog_base_url: String,
    pub catalog_api_key: String,
    pub catalog_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let secret_key = lookup("SECRET_KEY").unwrap_or_else(|| {
            warn!("SECRET_KEY not set, using the development secret");
            DEV_SECRET.to_string()
        });

        let catalog_api_key = lookup("CATALOG_API_KEY").unwrap_or_else(|| {
            warn!("CATALOG_API_KEY not set, movie catalog requests will be rejected upstream");
            String::new()
        });

        Ok(Self {
            host: try_load(&lookup, "HOST", "0.0.0.0")?,
            port: try_load(&lookup, "PORT", "3001")?,
            database_url: try_load(&lookup, "DATABASE_URL", "sqlite:reelmark.db?mode=rwc")?,
            secret_key,
            token_ttl_secs: try_load(&lookup, "TOKEN_TTL_SECS", "86400")?,
            argon2_memory_kib: try_load(&lookup, "ARGON2_MEMORY_KIB", "19456")?,
            argon2_iterations: try_load(&lookup, "ARGON2_ITERATIONS", "2")?,
            catalog_base_url: try_load(&lookup, "CATALOG_BASE_URL", "https://api.themoviedb.org/3")?,
            catalog_api_key,
            catalog_timeout: Duration::from_secs(try_load(&lookup, "CATALOG_TIMEOUT_SECS", "10")?),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T>
where
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| anyhow!("Invalid {key} value {raw:?}: {e}"))
}
