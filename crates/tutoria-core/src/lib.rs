//! Tutoria Core Library
//!
//! This crate provides the persistence layer for the tutoring-chat service:
//! - Entities (users, conversation threads, messages)
//! - Storage (SQLite pool + schema migrations)
//! - The data-access facade (`DataManager`)
//! - Configuration

pub mod chat;
pub mod config;
pub mod error;
pub mod manager;
pub mod storage;
pub mod users;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::chat::{Message, Thread};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::manager::DataManager;
    pub use crate::storage::{Database, DatabaseConfig};
    pub use crate::users::User;
}
