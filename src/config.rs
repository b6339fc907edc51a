//! Runtime settings read from the environment (and `.env` when present).

use crate::error::ConfigError;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::str::FromStr;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/carbon";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 64 * 1024;

/// Where data is kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    /// Process memory; everything is lost on restart.
    Memory,
}

impl FromStr for StorageKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageKind::Postgres),
            "memory" => Ok(StorageKind::Memory),
            _ => Err(ConfigError::Storage(s.to_string())),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub storage: StorageKind,
    /// PostgreSQL schema holding all tables. Must be a valid identifier.
    pub schema: String,
    pub max_connections: u32,
    pub body_limit_bytes: usize,
}

impl Settings {
    /// Read `DATABASE_URL`, `BIND_ADDR`, `CARBON_STORAGE`, `CARBON_SCHEMA`, `DB_MAX_CONNECTIONS`
    /// and `BODY_LIMIT_BYTES`, falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&std::env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| vars.get(name).map(|s| s.trim()).filter(|s| !s.is_empty());

        let storage = match get("CARBON_STORAGE") {
            Some(s) => s.parse()?,
            None => StorageKind::Postgres,
        };

        Ok(Settings {
            database_url: get("DATABASE_URL").unwrap_or(DEFAULT_DATABASE_URL).to_string(),
            bind_addr: parse_var("BIND_ADDR", get("BIND_ADDR").unwrap_or(DEFAULT_BIND_ADDR))?,
            storage,
            schema: get("CARBON_SCHEMA").unwrap_or(DEFAULT_SCHEMA).to_string(),
            max_connections: get("DB_MAX_CONNECTIONS")
                .map(|v| parse_var("DB_MAX_CONNECTIONS", v))
                .transpose()?
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            body_limit_bytes: get("BODY_LIMIT_BYTES")
                .map(|v| parse_var("BODY_LIMIT_BYTES", v))
                .transpose()?
                .unwrap_or(DEFAULT_BODY_LIMIT_BYTES),
        })
    }
}

fn parse_var<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidVar {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_when_unset() {
        let s = Settings::from_vars(&HashMap::new()).unwrap();
        assert_eq!(s.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(s.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(s.storage, StorageKind::Postgres);
        assert_eq!(s.schema, "public");
        assert_eq!(s.max_connections, 5);
        assert_eq!(s.body_limit_bytes, 65536);
    }

    #[test]
    fn reads_overrides() {
        let s = Settings::from_vars(&vars(&[
            ("CARBON_STORAGE", "Memory"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("DB_MAX_CONNECTIONS", "12"),
            ("CARBON_SCHEMA", "carbon"),
        ]))
        .unwrap();
        assert_eq!(s.storage, StorageKind::Memory);
        assert_eq!(s.bind_addr.port(), 8080);
        assert_eq!(s.max_connections, 12);
        assert_eq!(s.schema, "carbon");
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let s = Settings::from_vars(&vars(&[("DATABASE_URL", "  ")])).unwrap();
        assert_eq!(s.database_url, DEFAULT_DATABASE_URL);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            Settings::from_vars(&vars(&[("CARBON_STORAGE", "sqlite")])),
            Err(ConfigError::Storage(_))
        ));
        assert!(matches!(
            Settings::from_vars(&vars(&[("DB_MAX_CONNECTIONS", "many")])),
            Err(ConfigError::InvalidVar { var: "DB_MAX_CONNECTIONS", .. })
        ));
        assert!(matches!(
            Settings::from_vars(&vars(&[("BIND_ADDR", "localhost")])),
            Err(ConfigError::InvalidVar { var: "BIND_ADDR", .. })
        ));
    }
}
