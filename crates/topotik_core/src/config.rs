//! Deployment configuration read once at process start.
//!
//! # Responsibility
//! - Parse storage location, signing secret, token lifetime, hash cost
//!   and logging settings from environment-style key/value lookups.
//!
//! # Invariants
//! - The signing secret is non-empty and wiped from memory on drop.
//! - Values are validated here; the rest of the core never re-reads the
//!   environment.

use crate::auth::password::{DEFAULT_HASH_COST, MAX_HASH_COST, MIN_HASH_COST};
use crate::db::DbLocation;
use crate::logging::default_log_level;
use jsonwebtoken::Algorithm;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::PathBuf;
use zeroize::Zeroizing;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const SECRET_KEY: &str = "SECRET_KEY";
pub const ALGORITHM: &str = "ALGORITHM";
pub const ACCESS_TOKEN_EXPIRE_MINUTES: &str = "ACCESS_TOKEN_EXPIRE_MINUTES";
pub const PASSWORD_HASH_COST: &str = "PASSWORD_HASH_COST";
pub const LOG_LEVEL: &str = "LOG_LEVEL";
pub const LOG_DIR: &str = "LOG_DIR";

const DEFAULT_TOKEN_MINUTES: u64 = 30;
const MEMORY_URL: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required key is absent or blank.
    Missing(&'static str),
    /// Key is present but its value is unusable.
    Invalid { key: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "missing required setting {key}"),
            Self::Invalid { key, reason } => write!(f, "invalid {key}: {reason}"),
        }
    }
}

impl Error for ConfigError {}

/// Validated core configuration.
#[derive(Clone)]
pub struct CoreConfig {
    pub database: DbLocation,
    pub secret_key: Zeroizing<String>,
    pub algorithm: Algorithm,
    pub access_token_expire_minutes: u64,
    pub password_hash_cost: u32,
    pub log_level: String,
    /// File logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl CoreConfig {
    /// Configuration with defaults for everything but storage and secret.
    pub fn new(database: DbLocation, secret_key: &str) -> Result<Self, ConfigError> {
        let secret_key = secret_key.trim();
        if secret_key.is_empty() {
            return Err(ConfigError::Missing(SECRET_KEY));
        }
        Ok(Self {
            database,
            secret_key: Zeroizing::new(secret_key.to_owned()),
            algorithm: Algorithm::HS256,
            access_token_expire_minutes: DEFAULT_TOKEN_MINUTES,
            password_hash_cost: DEFAULT_HASH_COST,
            log_level: default_log_level().to_string(),
            log_dir: None,
        })
    }

    /// Builds configuration from a key lookup, e.g. the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let database_url = value(DATABASE_URL).ok_or(ConfigError::Missing(DATABASE_URL))?;
        let secret_key = value(SECRET_KEY).ok_or(ConfigError::Missing(SECRET_KEY))?;
        let mut config = Self::new(parse_database_url(&database_url)?, &secret_key)?;

        if let Some(raw) = value(ALGORITHM) {
            config.algorithm = parse_algorithm(&raw)?;
        }
        if let Some(raw) = value(ACCESS_TOKEN_EXPIRE_MINUTES) {
            config.access_token_expire_minutes = parse_token_minutes(&raw)?;
        }
        if let Some(raw) = value(PASSWORD_HASH_COST) {
            config.password_hash_cost = parse_hash_cost(&raw)?;
        }
        if let Some(raw) = value(LOG_LEVEL) {
            config.log_level = raw.to_ascii_lowercase();
        }
        config.log_dir = value(LOG_DIR).map(PathBuf::from);

        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl Debug for CoreConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database", &self.database)
            .field("secret_key", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field(
                "access_token_expire_minutes",
                &self.access_token_expire_minutes,
            )
            .field("password_hash_cost", &self.password_hash_cost)
            .field("log_level", &self.log_level)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

/// Accepts `:memory:`, a plain path, or either behind `sqlite://`.
pub fn parse_database_url(raw: &str) -> Result<DbLocation, ConfigError> {
    let location = raw
        .strip_prefix("sqlite://")
        .or_else(|| raw.strip_prefix("sqlite:"))
        .unwrap_or(raw);
    if location.contains("://") {
        return Err(ConfigError::Invalid {
            key: DATABASE_URL,
            reason: "only sqlite databases are supported".to_string(),
        });
    }
    match location {
        "" => Err(ConfigError::Missing(DATABASE_URL)),
        MEMORY_URL => Ok(DbLocation::Memory),
        path => Ok(DbLocation::File(PathBuf::from(path))),
    }
}

fn parse_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    match raw.to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(ConfigError::Invalid {
            key: ALGORITHM,
            reason: format!("`{other}` is not one of HS256|HS384|HS512"),
        }),
    }
}

fn parse_token_minutes(raw: &str) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(minutes) if minutes > 0 => Ok(minutes),
        _ => Err(ConfigError::Invalid {
            key: ACCESS_TOKEN_EXPIRE_MINUTES,
            reason: format!("`{raw}` is not a positive integer"),
        }),
    }
}

fn parse_hash_cost(raw: &str) -> Result<u32, ConfigError> {
    match raw.parse::<u32>() {
        Ok(cost) if (MIN_HASH_COST..=MAX_HASH_COST).contains(&cost) => Ok(cost),
        _ => Err(ConfigError::Invalid {
            key: PASSWORD_HASH_COST,
            reason: format!("`{raw}` is outside {MIN_HASH_COST}..={MAX_HASH_COST}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_database_url, ConfigError, CoreConfig};
    use crate::db::DbLocation;
    use jsonwebtoken::Algorithm;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = CoreConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite://./topotik.db"),
            ("SECRET_KEY", "change-me"),
        ]))
        .unwrap();

        assert_eq!(config.database, DbLocation::File(PathBuf::from("./topotik.db")));
        assert_eq!(config.algorithm, Algorithm::HS256);
        assert_eq!(config.access_token_expire_minutes, 30);
        assert_eq!(config.password_hash_cost, 12);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = CoreConfig::from_lookup(lookup(&[
            ("DATABASE_URL", ":memory:"),
            ("SECRET_KEY", "k"),
            ("ALGORITHM", "hs512"),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "5"),
            ("PASSWORD_HASH_COST", "4"),
            ("LOG_LEVEL", "WARN"),
            ("LOG_DIR", "/var/log/topotik"),
        ]))
        .unwrap();

        assert_eq!(config.database, DbLocation::Memory);
        assert_eq!(config.algorithm, Algorithm::HS512);
        assert_eq!(config.access_token_expire_minutes, 5);
        assert_eq!(config.password_hash_cost, 4);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/topotik")));
    }

    #[test]
    fn missing_or_blank_secret_is_rejected() {
        let err = CoreConfig::from_lookup(lookup(&[
            ("DATABASE_URL", ":memory:"),
            ("SECRET_KEY", "   "),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("SECRET_KEY"));
    }

    #[test]
    fn out_of_range_values_are_invalid() {
        for (key, value) in [
            ("ALGORITHM", "RS256"),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "0"),
            ("PASSWORD_HASH_COST", "40"),
        ] {
            let err = CoreConfig::from_lookup(lookup(&[
                ("DATABASE_URL", ":memory:"),
                ("SECRET_KEY", "k"),
                (key, value),
            ]))
            .unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { key: k, .. } if k == key));
        }
    }

    #[test]
    fn non_sqlite_urls_are_rejected() {
        assert!(parse_database_url("postgresql://localhost/db").is_err());
        assert_eq!(parse_database_url("sqlite://:memory:").unwrap(), DbLocation::Memory);
    }

    #[test]
    fn debug_output_hides_secret() {
        let config = CoreConfig::new(DbLocation::Memory, "super-secret").unwrap();
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
