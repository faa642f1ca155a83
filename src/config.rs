use std::env;
use std::str::FromStr;

use anyhow::{Context, bail};
use dotenvy::dotenv;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    MySql,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(StoreBackend::MySql),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("unknown STORE_BACKEND '{other}', expected 'mysql' or 'memory'"),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub store_backend: StoreBackend,
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub token_ttl: usize,

    // Single admin credential
    pub admin_username: String,
    pub admin_password: String,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_api_per_min: u32,

    pub api_prefix: String,
    pub development: bool,
    pub log_dir: String,
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed<T>(key: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|e| anyhow::anyhow!("{key}='{raw}' is invalid: {e}"))
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();

        let store_backend: StoreBackend = parsed("STORE_BACKEND", "mysql")?;
        let database_url = match store_backend {
            StoreBackend::MySql => required("DATABASE_URL")?,
            StoreBackend::Memory => env::var("DATABASE_URL").unwrap_or_default(),
        };

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            store_backend,
            database_url,
            db_max_connections: parsed("DB_MAX_CONNECTIONS", "10")?,
            jwt_secret: required("JWT_SECRET")?,
            token_ttl: parsed("JWT_EXPIRES_IN", "86400")?, // default 1 day

            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_password: required("ADMIN_PASSWORD")?,

            rate_login_per_min: parsed("RATE_LOGIN_PER_MIN", "60")?,
            rate_api_per_min: parsed("RATE_API_PER_MIN", "1000")?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            development: env::var("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("development"))
                .unwrap_or(false),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("mysql".parse::<StoreBackend>().unwrap(), StoreBackend::MySql);
        assert_eq!("MEMORY".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("postgres".parse::<StoreBackend>().is_err());
    }
}
