use std::env;
use std::str::FromStr;

use anyhow::{anyhow, Context};
use chrono::Duration;

/// Session secret used when `SESSION_SECRET` is not set.
pub const DEFAULT_SESSION_SECRET: &str = "change-this-session-secret-in-production";

/// Longest accepted `SESSION_TTL_HOURS`.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 31;

/// Longest accepted `SESSION_REMEMBER_DAYS`.
pub const MAX_SESSION_REMEMBER_DAYS: i64 = 3650;

/// Credentials of the bootstrap administrator.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl AdminSeed {
    /// True when the seed still carries the shipped default password.
    pub fn uses_default_password(&self) -> bool {
        self.password == "admin123"
    }
}

impl Default for AdminSeed {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password: "admin123".to_string(),
        }
    }
}

/// Runtime configuration, loaded from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub session_remember_days: i64,
    pub admin: AdminSeed,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://bizsite.db?mode=rwc".to_string(),
            db_max_connections: 5,
            host: "0.0.0.0".to_string(),
            port: 5000,
            environment: "development".to_string(),
            session_secret: DEFAULT_SESSION_SECRET.to_string(),
            session_ttl_hours: 24,
            session_remember_days: 30,
            admin: AdminSeed::default(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            cors_origins: Vec::new(),
            max_body_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Reads configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed, or if the
    /// default session secret is used with `ENVIRONMENT=production`.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Config::default();

        let admin = AdminSeed {
            username: env::var("ADMIN_USERNAME").unwrap_or(defaults.admin.username),
            email: env::var("ADMIN_EMAIL").unwrap_or(defaults.admin.email),
            password: env::var("ADMIN_PASSWORD").unwrap_or(defaults.admin.password),
        };

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let config = Config {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            host: env::var("SERVER_HOST").unwrap_or(defaults.host),
            port: parse_var("SERVER_PORT", defaults.port)?,
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            session_secret: env::var("SESSION_SECRET").unwrap_or(defaults.session_secret),
            session_ttl_hours: parse_bounded(
                "SESSION_TTL_HOURS",
                defaults.session_ttl_hours,
                MAX_SESSION_TTL_HOURS,
            )?,
            session_remember_days: parse_bounded(
                "SESSION_REMEMBER_DAYS",
                defaults.session_remember_days,
                MAX_SESSION_REMEMBER_DAYS,
            )?,
            admin,
            bcrypt_cost: parse_var("BCRYPT_COST", defaults.bcrypt_cost)?,
            cors_origins,
            max_body_bytes: parse_var("MAX_BODY_BYTES", defaults.max_body_bytes)?,
        };

        if config.is_production()
            && (config.session_secret.is_empty() || config.session_secret == DEFAULT_SESSION_SECRET)
        {
            return Err(anyhow!(
                "SESSION_SECRET must be set to a unique value in production"
            ));
        }

        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Lifetime of a session; remember sessions live longer. Values outside
    /// `1..=MAX_*` are clamped.
    pub fn session_lifetime(&self, remember: bool) -> Duration {
        if remember {
            Duration::days(self.session_remember_days.clamp(1, MAX_SESSION_REMEMBER_DAYS))
        } else {
            Duration::hours(self.session_ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS))
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid {}", name)),
        Err(_) => Ok(default),
    }
}

/// Like [`parse_var`], but the value must lie in `1..=max`.
fn parse_bounded(name: &str, default: i64, max: i64) -> anyhow::Result<i64> {
    let value = parse_var(name, default)?;
    if !(1..=max).contains(&value) {
        return Err(anyhow!("{} must be between 1 and {}", name, max));
    }
    Ok(value)
}
