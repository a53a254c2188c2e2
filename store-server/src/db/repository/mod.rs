//! Repository Module
//!
//! CRUD and conditional-write operations over the SQLite schema. All
//! functions are free functions over `&SqlitePool`, or over
//! `&mut SqliteConnection` when they must participate in a caller-owned
//! transaction (tier resolution + ledger append, finalize commit).

pub mod batch;
pub mod coupon;
pub mod gift;
pub mod loyalty;
pub mod order;
pub mod reward_source;
pub mod shopper;
pub mod wallet;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db) = err
            && db.is_unique_violation()
        {
            return RepoError::Conflict(db.message().to_string());
        }
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

#[cfg(test)]
pub(crate) mod test_support {
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqlitePoolOptions;

    /// In-memory SQLite pool with the full schema applied.
    ///
    /// Single connection: every new `:memory:` connection would otherwise
    /// be a fresh empty database.
    pub async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    /// File-backed pool for tests that need real cross-connection
    /// concurrency. Returns the pool plus the tempfile guard (dropping the
    /// guard deletes the database).
    pub async fn test_pool_concurrent() -> (SqlitePool, tempfile::NamedTempFile) {
        let file = tempfile::NamedTempFile::new().unwrap();
        let url = format!("sqlite:{}?mode=rwc", file.path().display());
        let options: sqlx::sqlite::SqliteConnectOptions = url.parse().unwrap();
        let options = options
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        (pool, file)
    }

    /// Seed a shopper row for foreign keys
    pub async fn seed_shopper(pool: &SqlitePool, id: i64, points: i64) {
        sqlx::query(
            "INSERT INTO shopper (id, display_name, engagement_points, is_active, created_at, updated_at) VALUES (?, 'Test Shopper', ?, 1, 0, 0)",
        )
        .bind(id)
        .bind(points)
        .execute(pool)
        .await
        .unwrap();
    }
}
