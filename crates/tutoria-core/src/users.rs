//! User accounts
//!
//! Provides the user entity and its database operations.

use crate::Result;
use crate::storage::Database;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::fmt;

/// A registered account in the tutoring service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier, assigned by the store on insert
    pub user_id: i64,
    /// Login name, unique across all users
    pub username: String,
    /// Contact address
    pub email: String,
    /// Pre-hashed credential; hashing happens outside this layer
    pub password_hash: Option<String>,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "User {} with email {} and id {}",
            self.username, self.email, self.user_id
        )
    }
}

/// User repository for database operations
pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a new user and return it with its store-assigned id
    ///
    /// A duplicate username surfaces as the store's uniqueness violation.
    pub async fn insert(
        &self,
        username: &str,
        email: &str,
        password_hash: Option<&str>,
    ) -> Result<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .execute(self.db.pool())
        .await?;

        Ok(User {
            user_id: result.last_insert_rowid(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.map(str::to_string),
        })
    }

    /// Get a user by ID
    pub async fn get(&self, user_id: i64) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT user_id, username, email, password_hash FROM users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|r| self.row_to_user(r)))
    }

    /// List all users (oldest first)
    pub async fn list(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(
            "SELECT user_id, username, email, password_hash FROM users ORDER BY user_id ASC",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(|r| self.row_to_user(r)).collect())
    }

    /// Write a user's mutable fields back to the store
    ///
    /// The identifier is the lookup key and is never reassigned.
    pub async fn update(&self, user: &User) -> Result<()> {
        sqlx::query(
            "UPDATE users SET username = ?, email = ?, password_hash = ? WHERE user_id = ?",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.user_id)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Delete a user; the store cascades to their threads and messages
    pub async fn delete(&self, user_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// Check if a user exists
    pub async fn exists(&self, user_id: i64) -> Result<bool> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.is_some())
    }

    /// Convert a database row to a User
    fn row_to_user(&self, row: sqlx::sqlite::SqliteRow) -> User {
        User {
            user_id: row.get("user_id"),
            username: row.get("username"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
        }
    }
}
