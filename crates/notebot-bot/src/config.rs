//! Process configuration from environment variables.

use std::fmt;

use url::Url;

use notebot_core::{defaults, Error, Result};
use notebot_telegram::TelegramConfig;

/// PostgreSQL connection settings.
#[derive(Clone)]
pub struct DatabaseConfig {
    /// Full connection URL; takes precedence over the discrete fields.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: defaults::DB_HOST.to_string(),
            port: defaults::DB_PORT,
            user: defaults::DB_USER.to_string(),
            password: String::new(),
            name: defaults::DB_NAME.to_string(),
            max_connections: defaults::DB_MAX_CONNECTIONS,
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl DatabaseConfig {
    /// Connection URL, built from the discrete fields unless `url` is set.
    pub fn connection_url(&self) -> Result<String> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }

        let invalid = |what: &str| Error::Config(format!("Invalid database {}", what));
        let mut url = Url::parse("postgres://localhost")
            .map_err(|e| Error::Config(format!("Invalid database URL: {}", e)))?;
        url.set_host(Some(&self.host))
            .map_err(|e| Error::Config(format!("Invalid database host: {}", e)))?;
        url.set_port(Some(self.port)).map_err(|()| invalid("port"))?;
        url.set_username(&self.user).map_err(|()| invalid("user"))?;
        if !self.password.is_empty() {
            url.set_password(Some(&self.password))
                .map_err(|()| invalid("password"))?;
        }
        url.set_path(&self.name);
        Ok(url.to_string())
    }
}

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram: TelegramConfig,
    pub database: DatabaseConfig,
    /// Apply embedded migrations at startup.
    pub run_migrations: bool,
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, key: &str, default: T) -> Result<T> {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: {}", key, v))),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<String>, default: bool) -> bool {
    match value.as_deref().map(str::trim) {
        Some("0") | Some("false") | Some("no") | Some("off") => false,
        Some("1") | Some("true") | Some("yes") | Some("on") => true,
        _ => default,
    }
}

impl BotConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("TELEGRAM_BOT_API_KEY")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::Config("TELEGRAM_BOT_API_KEY is not set".to_string()))?;

        let mut telegram = TelegramConfig::new(token);
        if let Some(api_url) = lookup("TELEGRAM_API_URL").filter(|u| !u.is_empty()) {
            telegram.api_url = api_url;
        }
        telegram.poll_timeout_secs = parse_or(
            lookup("TELEGRAM_POLL_TIMEOUT"),
            "TELEGRAM_POLL_TIMEOUT",
            defaults::POLL_TIMEOUT_SECS,
        )?;
        telegram.skip_tls_verify = lookup("TLS").as_deref() == Some("0");

        let database = DatabaseConfig {
            url: lookup("DATABASE_URL").filter(|u| !u.is_empty()),
            host: lookup("DB_HOST").unwrap_or_else(|| defaults::DB_HOST.to_string()),
            port: parse_or(lookup("DB_PORT"), "DB_PORT", defaults::DB_PORT)?,
            user: lookup("DB_USER").unwrap_or_else(|| defaults::DB_USER.to_string()),
            password: lookup("DB_PASSWORD").unwrap_or_default(),
            name: lookup("DB_NAME").unwrap_or_else(|| defaults::DB_NAME.to_string()),
            max_connections: parse_or(
                lookup("DB_MAX_CONNECTIONS"),
                "DB_MAX_CONNECTIONS",
                defaults::DB_MAX_CONNECTIONS,
            )?,
        };

        Ok(Self {
            telegram,
            database,
            run_migrations: parse_bool(lookup("RUN_MIGRATIONS"), true),
        })
    }
}
