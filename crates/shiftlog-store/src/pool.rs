//! Database connection pool management
//!
//! Provides a wrapper around SQLx's SqlitePool with:
//! - Automatic directory creation for database files
//! - WAL journal mode for concurrent reads
//! - Schema-version checked migration on first connection
//! - In-memory mode for testing
//!
//! ## Schema versioning
//!
//! The schema generation is tracked with `PRAGMA user_version`. When the
//! stored version differs from [`SCHEMA_VERSION`], the three record tables
//! are dropped and recreated. This destructive migration is intentional:
//! the record collections are a queue of small, short-lived rows, and
//! callers must not assume an upgrade preserves old-shape records.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use shiftlog_core::ports::record_store::StoreError;

/// Current schema generation, stored in `PRAGMA user_version`
pub const SCHEMA_VERSION: i64 = 2;

/// Manages a pool of SQLite connections for Shiftlog record persistence
///
/// The pool is configured with:
/// - WAL journal mode for concurrent read access
/// - 5 max connections for file-based databases
/// - 1 connection for in-memory databases (required for data persistence)
/// - 5-second busy timeout to handle write contention
#[derive(Clone)]
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens (or creates) the database file at `db_path`
    ///
    /// This will:
    /// 1. Create parent directories if they don't exist
    /// 2. Create the database file if it doesn't exist
    /// 3. Enable WAL journal mode
    /// 4. Run the schema-version checked migration
    ///
    /// Safe to call repeatedly; the migration is idempotent at the current
    /// schema version.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ConnectionFailed` if the connection cannot be
    /// established, or `StoreError::MigrationFailed` if the migration fails.
    pub async fn open(db_path: &Path) -> Result<Self, StoreError> {
        // Create parent directory if needed
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::ConnectionFailed(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| {
                StoreError::ConnectionFailed(format!(
                    "Failed to connect to database at {}: {}",
                    db_path.display(),
                    e
                ))
            })?;

        Self::run_migrations(&pool).await?;

        tracing::info!(
            path = %db_path.display(),
            "Database pool initialized"
        );

        Ok(Self { pool })
    }

    /// Creates an in-memory database pool for testing
    ///
    /// Uses a single connection to ensure data persistence across queries
    /// (SQLite in-memory databases are per-connection).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ConnectionFailed` if the connection cannot be
    /// established, or `StoreError::MigrationFailed` if the migration fails.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                StoreError::ConnectionFailed(format!("Failed to create in-memory database: {}", e))
            })?;

        Self::run_migrations(&pool).await?;

        tracing::debug!("In-memory database pool initialized");

        Ok(Self { pool })
    }

    /// Returns a reference to the underlying SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Runs the schema-version checked migration
    ///
    /// On a version mismatch the record tables are dropped first, then the
    /// schema is recreated and `user_version` updated.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), StoreError> {
        let row = sqlx::query("PRAGMA user_version")
            .fetch_one(pool)
            .await
            .map_err(|e| {
                StoreError::MigrationFailed(format!("Failed to read user_version: {}", e))
            })?;
        let stored_version: i64 = row.get(0);

        if stored_version != 0 && stored_version != SCHEMA_VERSION {
            tracing::warn!(
                stored_version,
                schema_version = SCHEMA_VERSION,
                "Schema version mismatch, dropping record tables"
            );
            sqlx::raw_sql(
                "DROP TABLE IF EXISTS checklists;\n\
                 DROP TABLE IF EXISTS non_conformances;\n\
                 DROP TABLE IF EXISTS incidents;",
            )
            .execute(pool)
            .await
            .map_err(|e| {
                StoreError::MigrationFailed(format!("Failed to drop outdated tables: {}", e))
            })?;
        }

        let migration_sql = include_str!("migrations/20260715_records.sql");
        sqlx::raw_sql(migration_sql)
            .execute(pool)
            .await
            .map_err(|e| {
                StoreError::MigrationFailed(format!("Failed to run records migration: {}", e))
            })?;

        sqlx::raw_sql(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
            .execute(pool)
            .await
            .map_err(|e| {
                StoreError::MigrationFailed(format!("Failed to set user_version: {}", e))
            })?;

        tracing::debug!("Database migrations completed");
        Ok(())
    }
}
