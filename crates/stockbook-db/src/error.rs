//! # Database Error Types
//!
//! Error types for database operations and the engine facade.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  CoreError (rule violation)      SQLite Error (sqlx::Error)             │
//! │       │                                │                                │
//! │       │ #[from]                        │ From impl: categorize          │
//! │       ▼                                ▼                                │
//! │  ┌──────────────────────────────────────────────────────┐              │
//! │  │ DbError (this module)                                │              │
//! │  │   Domain(CoreError)   → kind() = Some(core kind)     │              │
//! │  │   Busy                → kind() = Some(Conflict)      │              │
//! │  │   Unique / FK         → kind() = Some(Validation)    │              │
//! │  │   everything else     → kind() = None (infra)        │              │
//! │  └──────────────────────────────────────────────────────┘              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  API layer maps ErrorKind to a response                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use stockbook_core::{CoreError, ErrorKind, ValidationError};
use thiserror::Error;

/// Database and engine errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// A ledger or catalog rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate product code or type name slipping past the pre-check
    /// - A movement linked to two sales
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Referencing a non-existent product or product type
    /// - Attempting to delete a product referenced by the ledger
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// SQLite reported the database as busy or locked.
    #[error("Database busy: {0}")]
    Busy(String),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Error kind for callers, `None` for infrastructure failures.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            DbError::Domain(err) => Some(err.kind()),
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                Some(ErrorKind::Validation)
            }
            DbError::Busy(_) => Some(ErrorKind::Conflict),
            _ => None,
        }
    }

    /// The wrapped domain error, if this is one.
    pub fn as_domain(&self) -> Option<&CoreError> {
        match self {
            DbError::Domain(err) => Some(err),
            _ => None,
        }
    }

    pub fn not_found(entity: &str, id: impl Into<String>) -> Self {
        DbError::Domain(CoreError::not_found(entity, id))
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → Domain(NotFound)
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: <table>.<column>"
                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("database is locked") || msg.contains("database is busy") {
                    DbError::Busy(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_keep_their_kind() {
        let err: DbError = CoreError::InsufficientStock {
            code: "A".to_string(),
            available: 1,
            requested: 2,
        }
        .into();
        assert_eq!(err.kind(), Some(ErrorKind::InsufficientStock));
        assert_eq!(err.to_string(), "Insufficient stock for A: available 1, requested 2");
    }

    #[test]
    fn test_validation_converts_directly() {
        let err: DbError = ValidationError::Required {
            field: "code".to_string(),
        }
        .into();
        assert_eq!(err.kind(), Some(ErrorKind::Validation));
    }

    #[test]
    fn test_infrastructure_errors_have_no_kind() {
        assert_eq!(DbError::PoolExhausted.kind(), None);
        assert_eq!(DbError::Busy("database is locked".to_string()).kind(), Some(ErrorKind::Conflict));
    }
}
