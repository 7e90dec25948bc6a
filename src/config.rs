//! Connection settings and dialect detection.

use std::{path::Path, time::Duration};

use dotenvy::dotenv;
use serde::Deserialize;
use sqlx::any::{AnyPoolOptions, install_default_drivers};

use crate::{
    error::{Error, Result},
    value::ColumnType,
};

/// The database flavour behind a connection URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    MySql,
    Postgres,
    Sqlite,
}

impl Dialect {
    #[must_use]
    pub fn from_connection_string(input: &str) -> Option<Self> {
        let lower = input.to_lowercase();

        if lower.starts_with("postgres") {
            Some(Self::Postgres)
        } else if lower.starts_with("sqlite") {
            Some(Self::Sqlite)
        } else if lower.starts_with("mysql") || lower.starts_with("mariadb") {
            Some(Self::MySql)
        } else {
            None
        }
    }

    /// Whether generated identities can be read back with `RETURNING`.
    #[must_use]
    pub const fn supports_returning(self) -> bool {
        !matches!(self, Self::MySql)
    }

    pub(crate) const fn identity_definition(self) -> &'static str {
        match self {
            Self::MySql => "BIGINT PRIMARY KEY AUTO_INCREMENT",
            Self::Postgres => "BIGSERIAL PRIMARY KEY",
            Self::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
        }
    }

    pub(crate) const fn type_name(self, ty: ColumnType) -> &'static str {
        match (self, ty) {
            (_, ColumnType::Bool) => "BOOLEAN",
            (Self::Sqlite, ColumnType::Integer) => "INTEGER",
            (_, ColumnType::Integer) => "BIGINT",
            (Self::Sqlite, ColumnType::Real) => "REAL",
            (Self::Postgres, ColumnType::Real) => "DOUBLE PRECISION",
            (Self::MySql, ColumnType::Real) => "DOUBLE",
            (_, ColumnType::Text) => "TEXT",
            (Self::Postgres, ColumnType::Blob) => "BYTEA",
            (_, ColumnType::Blob) => "BLOB",
        }
    }
}

/// Attempt to retrieve the database URL from the `DATABASE_URL` environment variable, or from a
/// corresponding `.env` file.
#[must_use]
pub fn get_database_url() -> Option<String> {
    let _ = dotenv();

    std::env::var("DATABASE_URL").ok()
}

const fn default_max_connections() -> u32 {
    5
}

const fn default_acquire_timeout_secs() -> u64 {
    30
}

/// Settings for the connection pool behind a [`DbStorage`](crate::DbStorage).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    pub database_url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl StorageConfig {
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: default_max_connections(),
            min_connections: 0,
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }

    /// Build a configuration from `DATABASE_URL`, see [`get_database_url`].
    ///
    /// # Errors
    ///
    /// If the variable is not set.
    pub fn from_env() -> Result<Self> {
        get_database_url().map(Self::new).ok_or_else(|| {
            Error::Config(
                "missing database URL, set the `DATABASE_URL` environment variable or add it to a `.env` file"
                    .to_string(),
            )
        })
    }

    /// # Errors
    ///
    /// If the document is not a valid configuration.
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|e| Error::Config(e.to_string()))
    }

    /// # Errors
    ///
    /// If the file cannot be read or is not a valid configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read `{}`: {e}", path.display())))?;

        Self::from_json(&input)
    }

    /// # Errors
    ///
    /// If the URL does not start with `postgres`, `mysql` or `sqlite`.
    pub fn dialect(&self) -> Result<Dialect> {
        Dialect::from_connection_string(&self.database_url).ok_or_else(|| {
            Error::Config(
                "failed to determine database type from connection string, ensure it starts with either `postgres`, `mysql`, or `sqlite`"
                    .to_string(),
            )
        })
    }

    pub(crate) fn pool_options(&self) -> AnyPoolOptions {
        install_default_drivers();

        AnyPoolOptions::new()
            .max_connections(self.max_connections.max(1))
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn dialect_follows_url_scheme() {
        assert_eq!(
            Dialect::from_connection_string("SQLITE::memory:"),
            Some(Dialect::Sqlite)
        );
        assert_eq!(
            Dialect::from_connection_string("postgresql://localhost/db"),
            Some(Dialect::Postgres)
        );
        assert_eq!(
            Dialect::from_connection_string("mysql://root@localhost/db"),
            Some(Dialect::MySql)
        );
        assert_eq!(Dialect::from_connection_string("redis://localhost"), None);
    }

    #[test]
    fn json_config_fills_defaults() {
        let config = StorageConfig::from_json(r#"{"database_url": "sqlite::memory:"}"#).unwrap();

        assert_eq!(config, StorageConfig::new("sqlite::memory:"));
        assert_eq!(config.dialect().unwrap(), Dialect::Sqlite);
    }

    #[test]
    fn malformed_config_is_a_config_error() {
        let result = StorageConfig::from_json(r#"{"max_connections": 3}"#);

        assert!(matches!(result, Err(Error::Config(_))));
    }
}
