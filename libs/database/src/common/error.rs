/// Failures surfaced by this crate's own helpers
///
/// Connection and migration calls return `sea_orm::DbErr` directly.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[cfg(feature = "postgres")]
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sea_orm::DbErr),

    /// `SELECT 1` did not come back; the readiness probe reports this
    #[error("Health check failed: {0}")]
    HealthCheckFailed(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
