use anyhow::{Context, anyhow};
use chrono_tz::Tz;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    /// Zone whose calendar decides "today" and whose wall clock is recorded.
    pub timezone: Tz,

    pub shift_cache_ttl: Duration,
    pub shift_cache_capacity: u64,
    pub notify_timeout: Duration,

    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub run_migrations: bool,

    pub log_dir: String,
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name).with_context(|| format!("{} must be set", name))
}

fn parsed_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{} has an invalid value {:?}: {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,

            rate_protected_per_min: parsed_or("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            timezone: parsed_or("ATTENDANCE_TIMEZONE", chrono_tz::Asia::Dhaka)?,

            shift_cache_ttl: Duration::from_secs(parsed_or("SHIFT_CACHE_TTL_SECS", 300)?),
            shift_cache_capacity: parsed_or("SHIFT_CACHE_CAPACITY", 10_000)?,
            notify_timeout: Duration::from_millis(parsed_or("NOTIFY_TIMEOUT_MS", 3000)?),

            db_max_connections: parsed_or("DB_MAX_CONNECTIONS", 10)?,
            db_acquire_timeout: Duration::from_secs(parsed_or("DB_ACQUIRE_TIMEOUT_SECS", 5)?),
            run_migrations: parsed_or("RUN_MIGRATIONS", true)?,

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: "mysql://localhost/test".to_string(),
            jwt_secret: "test-secret".to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            rate_protected_per_min: 1000,
            api_prefix: "/api".to_string(),
            timezone: chrono_tz::Asia::Dhaka,
            shift_cache_ttl: Duration::from_secs(60),
            shift_cache_capacity: 100,
            notify_timeout: Duration::from_secs(1),
            db_max_connections: 1,
            db_acquire_timeout: Duration::from_secs(1),
            run_migrations: false,
            log_dir: "logs".to_string(),
        }
    }
}
