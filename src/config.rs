use std::env;
use std::fmt;
use std::path::PathBuf;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_MAPPING_FILE: &str = "resume-mappings.json";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Runtime settings sourced from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub mapping_file: PathBuf,
    pub log_level: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").filter(|value| !value.trim().is_empty());
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|count| *count > 0)
                .ok_or(ConfigError::InvalidMaxConnections(value))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        let mapping_file = lookup("RESUME_MAPPING_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MAPPING_FILE));
        let log_level = lookup("HIRE_SIGNAL_LOG").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Self {
            database_url,
            max_connections,
            mapping_file,
            log_level,
        })
    }

    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::MissingDatabaseUrl)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    MissingDatabaseUrl,
    InvalidMaxConnections(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingDatabaseUrl => {
                write!(f, "DATABASE_URL must be set to a production Postgres instance")
            }
            ConfigError::InvalidMaxConnections(value) => write!(
                f,
                "DATABASE_MAX_CONNECTIONS must be a positive integer, got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.database_url, None);
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.mapping_file, PathBuf::from("resume-mappings.json"));
        assert_eq!(config.log_level, "info");
        assert_eq!(
            config.require_database_url(),
            Err(ConfigError::MissingDatabaseUrl)
        );
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/hire"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("RESUME_MAPPING_FILE", "/tmp/mappings.json"),
            ("HIRE_SIGNAL_LOG", "debug"),
        ]))
        .unwrap();
        assert_eq!(config.require_database_url(), Ok("postgres://localhost/hire"));
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.mapping_file, PathBuf::from("/tmp/mappings.json"));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn rejects_bad_pool_size() {
        for value in ["zero", "0", "-3"] {
            let result = AppConfig::from_lookup(lookup_from(&[("DATABASE_MAX_CONNECTIONS", value)]));
            assert_eq!(
                result.unwrap_err(),
                ConfigError::InvalidMaxConnections(value.to_string())
            );
        }
    }

    #[test]
    fn blank_database_url_counts_as_missing() {
        let config = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "  ")])).unwrap();
        assert!(config.database_url.is_none());
    }
}
