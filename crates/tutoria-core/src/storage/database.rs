//! SQLite database operations
//!
//! Provides connection pool management and database initialization for tutoria.

use crate::storage::migrations;
use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default maximum connections in the pool
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Database configuration options
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Whether to run migrations automatically
    pub auto_migrate: bool,
    /// Journal mode (default: WAL for better concurrency)
    pub journal_mode: SqliteJournalMode,
    /// Synchronous mode (default: NORMAL for balance of safety/performance)
    pub synchronous: SqliteSynchronous,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            auto_migrate: true,
            journal_mode: SqliteJournalMode::Wal,
            synchronous: SqliteSynchronous::Normal,
        }
    }
}

impl DatabaseConfig {
    /// Create a new database config with the specified path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Create a config for an in-memory database (useful for testing)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::from(":memory:"),
            max_connections: 1, // In-memory requires single connection
            auto_migrate: true,
            journal_mode: SqliteJournalMode::Wal,
            synchronous: SqliteSynchronous::Normal,
        }
    }

    /// Set the maximum number of connections
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Disable automatic migrations
    pub fn no_migrate(mut self) -> Self {
        self.auto_migrate = false;
        self
    }

    /// Whether this config points at an in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == ":memory:"
    }
}

/// Get the default database path
pub fn default_database_path() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("tutoria").join("tutoria.db")
    } else {
        PathBuf::from("tutoria.db")
    }
}

/// Database connection pool wrapper
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    config: DatabaseConfig,
}

impl Database {
    /// Create a new database connection with the given configuration
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        let connect_options = if config.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            // Ensure the directory exists
            if let Some(parent) = config.path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create database directory: {:?}", parent)
                    })?;
                }
            }
            SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", config.path.display()))?
                .create_if_missing(true)
        };

        // Referential actions only fire on connections that enforce foreign
        // keys, and SQLite leaves enforcement off unless asked. Setting it in
        // the connect options covers every connection the pool opens.
        let connect_options = connect_options
            .journal_mode(config.journal_mode)
            .synchronous(config.synchronous)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("Failed to connect to database: {:?}", config.path))?;

        let db = Self {
            pool,
            config: config.clone(),
        };

        // Run migrations if auto_migrate is enabled
        if config.auto_migrate {
            db.migrate().await?;
        }

        Ok(db)
    }

    /// Create an in-memory database (useful for testing)
    pub async fn in_memory() -> Result<Self> {
        Self::new(DatabaseConfig::in_memory()).await
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        migrations::run_migrations(&self.pool)
            .await
            .context("Failed to run database migrations")
    }

    /// Check migration status
    pub async fn migration_status(&self) -> Result<migrations::MigrationStatus> {
        migrations::migration_status(&self.pool)
            .await
            .context("Failed to check migration status")
    }

    /// Check if database is healthy
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.config.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::in_memory().await.expect("Failed to create in-memory database");

        // Health check should pass
        db.health_check().await.expect("Health check failed");

        // Migrations should have run
        let status = db.migration_status().await.expect("Failed to get migration status");
        assert!(!status.needs_migration);
    }

    #[tokio::test]
    async fn test_database_config_builder() {
        let config = DatabaseConfig::with_path("/tmp/test.db")
            .max_connections(10)
            .no_migrate();

        assert_eq!(config.path, PathBuf::from("/tmp/test.db"));
        assert_eq!(config.max_connections, 10);
        assert!(!config.auto_migrate);
        assert!(!config.is_in_memory());
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let db = Database::in_memory().await.expect("Failed to create database");

        // Check that foreign keys are enabled
        let result: (i32,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .expect("Failed to check foreign_keys pragma");

        assert_eq!(result.0, 1, "Foreign keys should be enabled");
    }

    #[tokio::test]
    async fn test_database_crud_operations() {
        let db = Database::in_memory().await.expect("Failed to create database");

        // Insert a user
        let result = sqlx::query("INSERT INTO users (username, email) VALUES (?, ?)")
            .bind("alice")
            .bind("alice@example.com")
            .execute(db.pool())
            .await
            .expect("Failed to insert user");
        let user_id = result.last_insert_rowid();

        // Query it back
        let (username,): (String,) = sqlx::query_as("SELECT username FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(db.pool())
            .await
            .expect("Failed to query user");

        assert_eq!(username, "alice");

        // Update it
        sqlx::query("UPDATE users SET email = ? WHERE user_id = ?")
            .bind("alice@tutoria.app")
            .bind(user_id)
            .execute(db.pool())
            .await
            .expect("Failed to update user");

        // Verify update
        let (email,): (String,) = sqlx::query_as("SELECT email FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(db.pool())
            .await
            .expect("Failed to query updated user");

        assert_eq!(email, "alice@tutoria.app");

        // Delete it
        sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(user_id)
            .execute(db.pool())
            .await
            .expect("Failed to delete user");

        // Verify deletion
        let result: Option<(String,)> = sqlx::query_as("SELECT username FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(db.pool())
            .await
            .expect("Failed to query deleted user");

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_cascade_delete() {
        let db = Database::in_memory().await.expect("Failed to create database");

        // Insert a user
        let result = sqlx::query("INSERT INTO users (username, email) VALUES (?, ?)")
            .bind("bob")
            .bind("bob@example.com")
            .execute(db.pool())
            .await
            .expect("Failed to insert user");
        let user_id = result.last_insert_rowid();

        // Insert a thread for the user
        let result = sqlx::query("INSERT INTO threads (create_date, user_id) VALUES (?, ?)")
            .bind("2026-01-05 09:30:00")
            .bind(user_id)
            .execute(db.pool())
            .await
            .expect("Failed to insert thread");
        let thread_id = result.last_insert_rowid();

        // Verify thread exists
        let row: Option<(i64,)> = sqlx::query_as("SELECT thread_id FROM threads WHERE thread_id = ?")
            .bind(thread_id)
            .fetch_optional(db.pool())
            .await
            .expect("Failed to query thread");
        assert!(row.is_some());

        // Delete the user (should cascade to threads)
        sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(user_id)
            .execute(db.pool())
            .await
            .expect("Failed to delete user");

        // Verify thread was deleted via cascade
        let row: Option<(i64,)> = sqlx::query_as("SELECT thread_id FROM threads WHERE thread_id = ?")
            .bind(thread_id)
            .fetch_optional(db.pool())
            .await
            .expect("Failed to query deleted thread");
        assert!(row.is_none(), "Thread should be deleted via cascade");
    }
}
