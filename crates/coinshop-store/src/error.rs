//! Error types for coinshop storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Backend-neutral storage errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// A named storage constraint rejected the statement.
    #[error("constraint {constraint} violated: {message}")]
    Constraint {
        /// Constraint identifier (see [`crate::schema::constraint`]).
        constraint: String,
        /// Backend message.
        message: String,
    },

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// A stored value could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Build a constraint violation.
    #[must_use]
    pub fn constraint(constraint: &str, message: impl Into<String>) -> Self {
        Self::Constraint {
            constraint: constraint.to_string(),
            message: message.into(),
        }
    }

    /// Name of the violated constraint, if this is a constraint violation.
    #[must_use]
    pub fn constraint_name(&self) -> Option<&str> {
        match self {
            Self::Constraint { constraint, .. } => Some(constraint),
            Self::Database(_) | Self::Serialization(_) => None,
        }
    }
}

/// Look up the violation kind a store assigns to `err`'s constraint.
pub(crate) fn classify<V: Copy>(table: &[(&str, V)], err: &StoreError) -> Option<V> {
    let name = err.constraint_name()?;
    table
        .iter()
        .find(|(constraint, _)| *constraint == name)
        .map(|(_, violation)| *violation)
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if let Some(constraint) = db_err.constraint() {
                return Self::constraint(constraint, db_err.message());
            }
        }

        match err {
            sqlx::Error::Decode(_) | sqlx::Error::ColumnDecode { .. } => {
                Self::Serialization(err.to_string())
            }
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Database(format!("migration failed: {err}"))
    }
}
