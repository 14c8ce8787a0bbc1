//! Conversation threads and messages
//!
//! A thread is one tutoring conversation owned by a user; messages are the
//! turns inside it. Thread dates are stored as formatted text at second
//! precision while message timestamps keep full datetime precision; the
//! asymmetry is inherited contract and deliberately not normalized.

use crate::Result;
use crate::storage::Database;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::fmt;

/// Text format for thread create/update dates (UTC, second precision)
pub const THREAD_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A conversation session owned by one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    /// Unique thread identifier, assigned by the store on insert
    pub thread_id: i64,
    /// Creation time as formatted text, set once at creation
    pub create_date: String,
    /// Last explicit update time; unset until the thread is updated
    pub update_date: Option<String>,
    /// Owning user
    pub user_id: i64,
}

impl fmt::Display for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Thread {} created {} for user {}",
            self.thread_id, self.create_date, self.user_id
        )
    }
}

/// One turn in a thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier, assigned by the store on insert
    pub message_id: i64,
    /// Message body
    pub content: String,
    /// Speaker label, e.g. "user" or "assistant"; any label is accepted
    pub role: String,
    /// Creation time at full precision
    pub timestamp: DateTime<Utc>,
    /// Containing thread
    pub thread_id: i64,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Message {} from {} in thread {}",
            self.message_id, self.role, self.thread_id
        )
    }
}

/// Thread repository for database operations
pub struct ThreadRepository<'a> {
    db: &'a Database,
}

impl<'a> ThreadRepository<'a> {
    /// Create a new thread repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a new thread and return it with its store-assigned id
    ///
    /// `update_date` starts NULL. A missing owner surfaces as the store's
    /// foreign-key violation.
    pub async fn insert(&self, user_id: i64, create_date: &str) -> Result<Thread> {
        let result = sqlx::query(
            r#"
            INSERT INTO threads (create_date, user_id)
            VALUES (?, ?)
            "#,
        )
        .bind(create_date)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        Ok(Thread {
            thread_id: result.last_insert_rowid(),
            create_date: create_date.to_string(),
            update_date: None,
            user_id,
        })
    }

    /// Get a thread by ID
    pub async fn get(&self, thread_id: i64) -> Result<Option<Thread>> {
        let row = sqlx::query(
            "SELECT thread_id, create_date, update_date, user_id FROM threads WHERE thread_id = ?",
        )
        .bind(thread_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|r| self.row_to_thread(r)))
    }

    /// List a user's threads (oldest first)
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Thread>> {
        let rows = sqlx::query(
            r#"
            SELECT thread_id, create_date, update_date, user_id
            FROM threads WHERE user_id = ? ORDER BY thread_id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(|r| self.row_to_thread(r)).collect())
    }

    /// Stamp a thread's update date
    ///
    /// The only mutable thread field; create_date and ownership are fixed
    /// at creation.
    pub async fn set_update_date(&self, thread_id: i64, update_date: &str) -> Result<()> {
        sqlx::query("UPDATE threads SET update_date = ? WHERE thread_id = ?")
            .bind(update_date)
            .bind(thread_id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// Delete a thread; the store cascades to its messages
    pub async fn delete(&self, thread_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM threads WHERE thread_id = ?")
            .bind(thread_id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// Check if a thread exists
    pub async fn exists(&self, thread_id: i64) -> Result<bool> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM threads WHERE thread_id = ?")
            .bind(thread_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.is_some())
    }

    /// Convert a database row to a Thread
    fn row_to_thread(&self, row: sqlx::sqlite::SqliteRow) -> Thread {
        Thread {
            thread_id: row.get("thread_id"),
            create_date: row.get("create_date"),
            update_date: row.get("update_date"),
            user_id: row.get("user_id"),
        }
    }
}

/// Message repository for database operations
pub struct MessageRepository<'a> {
    db: &'a Database,
}

impl<'a> MessageRepository<'a> {
    /// Create a new message repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a new message and return it with its store-assigned id
    ///
    /// A missing thread surfaces as the store's foreign-key violation.
    pub async fn insert(
        &self,
        thread_id: i64,
        content: &str,
        role: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Message> {
        let result = sqlx::query(
            r#"
            INSERT INTO messages (content, role, timestamp, thread_id)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(content)
        .bind(role)
        .bind(timestamp)
        .bind(thread_id)
        .execute(self.db.pool())
        .await?;

        Ok(Message {
            message_id: result.last_insert_rowid(),
            content: content.to_string(),
            role: role.to_string(),
            timestamp,
            thread_id,
        })
    }

    /// Get a message by ID
    pub async fn get(&self, message_id: i64) -> Result<Option<Message>> {
        let row = sqlx::query(
            r#"
            SELECT message_id, content, role, timestamp, thread_id
            FROM messages WHERE message_id = ?
            "#,
        )
        .bind(message_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|r| self.row_to_message(r)))
    }

    /// List a thread's messages (oldest first)
    pub async fn list_by_thread(&self, thread_id: i64) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            r#"
            SELECT message_id, content, role, timestamp, thread_id
            FROM messages WHERE thread_id = ? ORDER BY message_id ASC
            "#,
        )
        .bind(thread_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(|r| self.row_to_message(r)).collect())
    }

    /// Write a message's mutable fields back to the store
    ///
    /// The identifier and containing thread are the lookup key; the
    /// creation timestamp is never rewritten.
    pub async fn update(&self, message: &Message) -> Result<()> {
        sqlx::query("UPDATE messages SET content = ?, role = ? WHERE message_id = ?")
            .bind(&message.content)
            .bind(&message.role)
            .bind(message.message_id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// Delete a single message
    pub async fn delete(&self, message_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM messages WHERE message_id = ?")
            .bind(message_id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// Convert a database row to a Message
    fn row_to_message(&self, row: sqlx::sqlite::SqliteRow) -> Message {
        Message {
            message_id: row.get("message_id"),
            content: row.get("content"),
            role: row.get("role"),
            timestamp: row.get("timestamp"),
            thread_id: row.get("thread_id"),
        }
    }
}
