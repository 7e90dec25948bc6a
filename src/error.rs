//! Error types shared by every storage operation.

use sqlx::error::ErrorKind;
use thiserror::Error;

/// Result type for storage operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by [`DbStorage`](crate::DbStorage) and the schema registration pass.
#[derive(Debug, Error)]
pub enum Error {
    /// A filter value does not match the kind of the column it is applied to.
    #[error("invalid filter value for `{entity}.{attribute}`: {reason}")]
    InvalidFilterValue {
        entity: &'static str,
        attribute: String,
        reason: String,
    },

    /// A related-object filter matched zero or several rows where exactly one is required.
    #[error("related object for `{entity}.{attribute}` matched {matches} rows, expected exactly one")]
    RelatedObjectNotFound {
        entity: &'static str,
        attribute: String,
        matches: usize,
    },

    /// An insert or update broke a uniqueness, foreign-key, not-null or check constraint.
    #[error("integrity violation: {0}")]
    IntegrityViolation(#[source] sqlx::Error),

    /// A single-result read (including lazy proxies) did not find exactly one row.
    #[error("expected exactly one `{entity}` row, found {found}")]
    NotFound { entity: &'static str, found: usize },

    /// A filter or ordering refers to an attribute the entity does not declare.
    #[error("`{entity}` has no attribute `{attribute}`")]
    UnknownAttribute {
        entity: &'static str,
        attribute: String,
    },

    /// The entity type was never registered with the schema.
    #[error("entity type `{0}` is not registered")]
    UnregisteredType(&'static str),

    /// The declared entity metadata is inconsistent.
    #[error("schema error: {0}")]
    Schema(String),

    /// A stored value could not be converted into the declared field type.
    #[error("cannot decode `{column}`: {reason}")]
    Decode { column: String, reason: String },

    /// The storage configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for Error {
    fn from(value: sqlx::Error) -> Self {
        let integrity = match &value {
            sqlx::Error::Database(e) => matches!(
                e.kind(),
                ErrorKind::UniqueViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation
            ),
            _ => false,
        };

        if integrity {
            Self::IntegrityViolation(value)
        } else {
            Self::Database(value)
        }
    }
}

impl Error {
    pub(crate) fn invalid_filter(
        entity: &'static str,
        attribute: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidFilterValue {
            entity,
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown_attribute(entity: &'static str, attribute: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            entity,
            attribute: attribute.into(),
        }
    }
}
