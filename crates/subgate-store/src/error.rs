//! Store error taxonomy.

/// Errors surfaced by store backends.
///
/// The variants map onto distinct HTTP outcomes at the service layer:
/// constraint violations become conflicts, malformed queries become bad
/// requests, and everything else is an internal failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness or referential constraint was violated.
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// The query was malformed or a row failed to decode.
    #[error("query failed: {0}")]
    Query(String),

    /// The referenced record does not exist.
    #[error("record not found")]
    NotFound,

    /// Any other database failure.
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::TypeNotFound { .. } => Self::Query(err.to_string()),
            sqlx::Error::Database(db) => {
                if db.is_unique_violation()
                    || db.is_foreign_key_violation()
                    || db.is_check_violation()
                {
                    Self::Constraint(db.message().to_owned())
                } else {
                    Self::Database(db.message().to_owned())
                }
            }
            _ => Self::Database(err.to_string()),
        }
    }
}
