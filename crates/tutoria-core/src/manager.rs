//! Data-access facade
//!
//! `DataManager` is the single entry point route handlers and scripts use to
//! work with users, threads, and messages. Every mutating call awaits the
//! committing write before returning, so each operation is durable on its
//! own; there is no cross-operation batching.
//!
//! Two outcome channels, matching the service's contract:
//!
//! 1. Expected "not found" conditions on update/delete and on collection
//!    lookups come back as failure records (`success: false` plus a human
//!    message) inside an `Ok(_)`.
//! 2. Store-level failures such as a duplicate username, a dangling foreign
//!    key, or lost connectivity propagate as `Err` untranslated.

use crate::chat::{Message, MessageRepository, Thread, ThreadRepository, THREAD_DATE_FORMAT};
use crate::storage::Database;
use crate::users::{User, UserRepository};
use crate::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Result of a user create/update/delete operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Result of a thread create/update/delete operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread: Option<Thread>,
}

/// Result of a message create/update/delete operation
///
/// The payload field is `thread_message` rather than `message`, which the
/// human-readable string already occupies. Inherited field naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_message: Option<Message>,
}

/// Failure record for collection lookups on a missing parent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Failure {
    /// Always false
    pub success: bool,
    pub message: String,
}

impl Failure {
    fn new(message: String) -> Self {
        Self {
            success: false,
            message,
        }
    }
}

/// Threads of one user, or a failure record when the user does not exist
///
/// Untagged so the serialized form is either a plain sequence or a
/// `{success, message}` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThreadListing {
    Found(Vec<Thread>),
    Missing(Failure),
}

/// Messages of one thread, or a failure record when the thread does not exist
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageListing {
    Found(Vec<Message>),
    Missing(Failure),
}

/// Whether an optional update value should be applied
///
/// An empty string counts as "not supplied" and is skipped, the same as an
/// absent value. Known edge-case policy kept for compatibility; callers
/// cannot clear a field to empty through the update operations.
fn supplied(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Current UTC time in the thread date text format
fn now_thread_date() -> String {
    Utc::now().format(THREAD_DATE_FORMAT).to_string()
}

/// The data-access facade over the tutoring store
///
/// Holds an injected database handle; tests construct one over an isolated
/// in-memory store. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DataManager {
    db: Database,
}

impl DataManager {
    /// Create a facade over the given database
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Access the underlying database handle
    pub fn database(&self) -> &Database {
        &self.db
    }

    // --- users ---

    /// Create a user
    ///
    /// A duplicate username propagates the store's uniqueness violation;
    /// no row is added in that case.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: Option<&str>,
    ) -> Result<UserOutcome> {
        let user = UserRepository::new(&self.db)
            .insert(username, email, password_hash)
            .await?;

        tracing::debug!(user_id = user.user_id, username, "user created");
        Ok(UserOutcome {
            success: true,
            message: format!("User {username} successfully added."),
            user: Some(user),
        })
    }

    /// Get a user by id; absent ids are `Ok(None)`, never a failure record
    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        UserRepository::new(&self.db).get(user_id).await
    }

    /// List all users, oldest first
    pub async fn list_users(&self) -> Result<Vec<User>> {
        UserRepository::new(&self.db).list().await
    }

    /// Update a user's supplied fields
    ///
    /// Only non-empty supplied values are applied; identity is never
    /// touched. A missing user yields a failure outcome, not an error.
    pub async fn update_user(
        &self,
        user_id: i64,
        username: Option<&str>,
        email: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<UserOutcome> {
        let repo = UserRepository::new(&self.db);
        let Some(mut user) = repo.get(user_id).await? else {
            return Ok(UserOutcome {
                success: false,
                message: format!("User with id {user_id} does not exist."),
                user: None,
            });
        };

        if let Some(username) = supplied(username) {
            user.username = username.to_string();
        }
        if let Some(email) = supplied(email) {
            user.email = email.to_string();
        }
        if let Some(password_hash) = supplied(password_hash) {
            user.password_hash = Some(password_hash.to_string());
        }

        repo.update(&user).await?;

        Ok(UserOutcome {
            success: true,
            message: format!("User {} successfully updated.", user.username),
            user: Some(user),
        })
    }

    /// Delete a user and, by cascade, all their threads and messages
    pub async fn delete_user(&self, user_id: i64) -> Result<UserOutcome> {
        let repo = UserRepository::new(&self.db);
        let Some(user) = repo.get(user_id).await? else {
            return Ok(UserOutcome {
                success: false,
                message: format!("User with id {user_id} does not exist."),
                user: None,
            });
        };

        repo.delete(user_id).await?;

        tracing::debug!(user_id, "user deleted");
        Ok(UserOutcome {
            success: true,
            message: format!("User {} with id {user_id} has been deleted.", user.username),
            user: Some(user),
        })
    }

    // --- threads ---

    /// Create a thread for a user, stamped with the current time
    ///
    /// A missing user propagates the store's foreign-key violation.
    pub async fn create_thread(&self, user_id: i64) -> Result<ThreadOutcome> {
        let thread = ThreadRepository::new(&self.db)
            .insert(user_id, &now_thread_date())
            .await?;

        tracing::debug!(thread_id = thread.thread_id, user_id, "thread created");
        Ok(ThreadOutcome {
            success: true,
            message: format!("Thread {} successfully added.", thread.thread_id),
            thread: Some(thread),
        })
    }

    /// Get a thread by id
    pub async fn get_thread(&self, thread_id: i64) -> Result<Option<Thread>> {
        ThreadRepository::new(&self.db).get(thread_id).await
    }

    /// List a user's threads, or a failure record when the user is missing
    ///
    /// A user with no threads is `Found` with an empty sequence, which is
    /// distinct from `Missing`.
    pub async fn get_threads_by_user(&self, user_id: i64) -> Result<ThreadListing> {
        if !UserRepository::new(&self.db).exists(user_id).await? {
            return Ok(ThreadListing::Missing(Failure::new(format!(
                "No user with id {user_id} found."
            ))));
        }

        let threads = ThreadRepository::new(&self.db).list_by_user(user_id).await?;
        Ok(ThreadListing::Found(threads))
    }

    /// Stamp a thread's update date with the current time
    ///
    /// No other thread field is mutable through this operation.
    pub async fn update_thread(&self, thread_id: i64) -> Result<ThreadOutcome> {
        let repo = ThreadRepository::new(&self.db);
        let Some(mut thread) = repo.get(thread_id).await? else {
            return Ok(ThreadOutcome {
                success: false,
                message: format!("Thread with id {thread_id} does not exist."),
                thread: None,
            });
        };

        let update_date = now_thread_date();
        repo.set_update_date(thread_id, &update_date).await?;
        thread.update_date = Some(update_date);

        Ok(ThreadOutcome {
            success: true,
            message: format!("Thread {thread_id} successfully updated."),
            thread: Some(thread),
        })
    }

    /// Delete a thread and, by cascade, all its messages
    pub async fn delete_thread(&self, thread_id: i64) -> Result<ThreadOutcome> {
        let repo = ThreadRepository::new(&self.db);
        let Some(thread) = repo.get(thread_id).await? else {
            return Ok(ThreadOutcome {
                success: false,
                message: format!("Thread with id {thread_id} does not exist."),
                thread: None,
            });
        };

        repo.delete(thread_id).await?;

        Ok(ThreadOutcome {
            success: true,
            message: format!("Thread with id {thread_id} has been deleted."),
            thread: Some(thread),
        })
    }

    // --- messages ---

    /// Create a message in a thread, stamped with the current time
    ///
    /// A missing thread propagates the store's foreign-key violation.
    pub async fn create_message(
        &self,
        thread_id: i64,
        content: &str,
        role: &str,
    ) -> Result<MessageOutcome> {
        let message = MessageRepository::new(&self.db)
            .insert(thread_id, content, role, Utc::now())
            .await?;

        tracing::debug!(message_id = message.message_id, thread_id, "message created");
        Ok(MessageOutcome {
            success: true,
            message: format!("Message {} successfully added.", message.message_id),
            thread_message: Some(message),
        })
    }

    /// Get a message by id
    pub async fn get_message(&self, message_id: i64) -> Result<Option<Message>> {
        MessageRepository::new(&self.db).get(message_id).await
    }

    /// List a thread's messages, or a failure record when the thread is missing
    pub async fn get_messages_by_thread(&self, thread_id: i64) -> Result<MessageListing> {
        if !ThreadRepository::new(&self.db).exists(thread_id).await? {
            return Ok(MessageListing::Missing(Failure::new(format!(
                "No thread with id {thread_id} found."
            ))));
        }

        let messages = MessageRepository::new(&self.db)
            .list_by_thread(thread_id)
            .await?;
        Ok(MessageListing::Found(messages))
    }

    /// Update a message's supplied fields
    ///
    /// Same non-empty apply policy as `update_user`; timestamp and thread
    /// are fixed at creation.
    pub async fn update_message(
        &self,
        message_id: i64,
        content: Option<&str>,
        role: Option<&str>,
    ) -> Result<MessageOutcome> {
        let repo = MessageRepository::new(&self.db);
        let Some(mut message) = repo.get(message_id).await? else {
            return Ok(MessageOutcome {
                success: false,
                message: format!("Message with id {message_id} does not exist."),
                thread_message: None,
            });
        };

        if let Some(content) = supplied(content) {
            message.content = content.to_string();
        }
        if let Some(role) = supplied(role) {
            message.role = role.to_string();
        }

        repo.update(&message).await?;

        Ok(MessageOutcome {
            success: true,
            message: format!("Message {message_id} successfully updated."),
            thread_message: Some(message),
        })
    }

    /// Delete a single message
    pub async fn delete_message(&self, message_id: i64) -> Result<MessageOutcome> {
        let repo = MessageRepository::new(&self.db);
        let Some(message) = repo.get(message_id).await? else {
            return Ok(MessageOutcome {
                success: false,
                message: format!("Message with id {message_id} does not exist."),
                thread_message: None,
            });
        };

        repo.delete(message_id).await?;

        Ok(MessageOutcome {
            success: true,
            message: format!("Message with id {message_id} has been deleted."),
            thread_message: Some(message),
        })
    }
}
