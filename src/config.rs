use std::env;
use std::time::Duration;

/// Database configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_max_size: u32,
    pub connection_timeout_secs: u64,
}

/// Batch job configuration
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    /// Stock brands not refreshed for this many days count as delisted
    pub delisting_retention_days: i64,
    /// Six-field cron expression (seconds first), evaluated in UTC
    pub delisting_cron: String,
}

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub jobs: JobConfig,
}

impl DatabaseConfig {
    /// Create database config from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create database config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("DATABASE_URL")
            .filter(|url| !url.is_empty())
            .ok_or("DATABASE_URL environment variable is required")?;

        let pool_max_size = lookup("DB_POOL_MAX_SIZE")
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(20);

        let connection_timeout_secs = lookup("DB_CONNECTION_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        // Validate configuration
        if pool_max_size == 0 {
            return Err("DB_POOL_MAX_SIZE must be greater than 0".to_string());
        }

        if connection_timeout_secs == 0 {
            return Err("DB_CONNECTION_TIMEOUT_SECS must be greater than 0".to_string());
        }

        Ok(Self {
            url,
            pool_max_size,
            connection_timeout_secs,
        })
    }

    /// Get connection timeout as Duration
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/market_data".to_string(),
            pool_max_size: 20,
            connection_timeout_secs: 30,
        }
    }
}

impl JobConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let delisting_retention_days = lookup("DELISTING_RETENTION_DAYS")
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(365);

        let delisting_cron =
            lookup("DELISTING_CRON").unwrap_or_else(|| "0 0 3 * * *".to_string());

        if delisting_retention_days <= 0 {
            return Err("DELISTING_RETENTION_DAYS must be greater than 0".to_string());
        }

        if delisting_cron.split_whitespace().count() < 6 {
            return Err(format!(
                "Invalid DELISTING_CRON: {}. Expected six fields starting with seconds",
                delisting_cron
            ));
        }

        Ok(Self {
            delisting_retention_days,
            delisting_cron,
        })
    }
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            delisting_retention_days: 365,
            delisting_cron: "0 0 3 * * *".to_string(),
        }
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            database: DatabaseConfig::from_lookup(&lookup)?,
            jobs: JobConfig::from_lookup(&lookup)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_database_url_is_required() {
        assert!(DatabaseConfig::from_lookup(lookup_from(&[])).is_err());
        assert!(DatabaseConfig::from_lookup(lookup_from(&[("DATABASE_URL", "")])).is_err());
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[(
            "DATABASE_URL",
            "postgresql://localhost/market_data",
        )]))
        .unwrap();

        assert_eq!(config.database, DatabaseConfig::default());
        assert_eq!(config.jobs, JobConfig::default());
        assert_eq!(config.database.connection_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgresql://db/prices"),
            ("DB_POOL_MAX_SIZE", "5"),
            ("DB_CONNECTION_TIMEOUT_SECS", "3"),
            ("DELISTING_RETENTION_DAYS", "30"),
            ("DELISTING_CRON", "0 30 4 * * *"),
        ]))
        .unwrap();

        assert_eq!(config.database.pool_max_size, 5);
        assert_eq!(config.database.connection_timeout_secs, 3);
        assert_eq!(config.jobs.delisting_retention_days, 30);
        assert_eq!(config.jobs.delisting_cron, "0 30 4 * * *");
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let url = ("DATABASE_URL", "postgresql://db/prices");

        assert!(DatabaseConfig::from_lookup(lookup_from(&[url, ("DB_POOL_MAX_SIZE", "0")])).is_err());
        assert!(DatabaseConfig::from_lookup(lookup_from(&[
            url,
            ("DB_CONNECTION_TIMEOUT_SECS", "0")
        ]))
        .is_err());
        assert!(JobConfig::from_lookup(lookup_from(&[("DELISTING_RETENTION_DAYS", "0")])).is_err());
        assert!(JobConfig::from_lookup(lookup_from(&[("DELISTING_RETENTION_DAYS", "-7")])).is_err());
        assert!(JobConfig::from_lookup(lookup_from(&[("DELISTING_CRON", "0 3 * * *")])).is_err());
    }
}
