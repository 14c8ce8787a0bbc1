//! Tutoria Core Integration Tests
//!
//! End-to-end exercises of the data-access facade over an isolated store,
//! covering the conversation lifecycle and the on-disk database path.

use tempfile::TempDir;
use tutoria_core::manager::{DataManager, MessageListing, ThreadListing};
use tutoria_core::storage::{Database, DatabaseConfig};

async fn fresh_manager() -> DataManager {
    let db = Database::in_memory().await.expect("Failed to create database");
    DataManager::new(db)
}

#[tokio::test]
async fn test_conversation_lifecycle() {
    let manager = fresh_manager().await;

    // First user in a fresh store gets id 1
    let alice = manager
        .create_user("alice", "a@x.com", None)
        .await
        .expect("Failed to create user")
        .user
        .unwrap();
    assert_eq!(alice.user_id, 1);

    // First thread gets id 1, creation date set, update date unset
    let thread = manager
        .create_thread(alice.user_id)
        .await
        .expect("Failed to create thread")
        .thread
        .unwrap();
    assert_eq!(thread.thread_id, 1);
    assert!(!thread.create_date.is_empty());
    assert!(thread.update_date.is_none());

    // First message gets id 1
    let message = manager
        .create_message(thread.thread_id, "hi", "user")
        .await
        .expect("Failed to create message")
        .thread_message
        .unwrap();
    assert_eq!(message.message_id, 1);

    // Updating the thread stamps its update date
    let updated = manager
        .update_thread(thread.thread_id)
        .await
        .unwrap()
        .thread
        .unwrap();
    assert!(updated.update_date.is_some());

    // Deleting the user takes the thread and the message with it
    let outcome = manager.delete_user(alice.user_id).await.unwrap();
    assert!(outcome.success);

    assert!(manager.get_thread(thread.thread_id).await.unwrap().is_none());
    assert!(manager.get_message(message.message_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_cascade_spans_multiple_threads() {
    let manager = fresh_manager().await;

    let user = manager
        .create_user("bob", "b@x.com", None)
        .await
        .unwrap()
        .user
        .unwrap();

    let mut message_ids = Vec::new();
    let mut thread_ids = Vec::new();
    for _ in 0..3 {
        let thread = manager
            .create_thread(user.user_id)
            .await
            .unwrap()
            .thread
            .unwrap();
        for content in ["question", "answer"] {
            let message = manager
                .create_message(thread.thread_id, content, "user")
                .await
                .unwrap()
                .thread_message
                .unwrap();
            message_ids.push(message.message_id);
        }
        thread_ids.push(thread.thread_id);
    }

    manager.delete_user(user.user_id).await.unwrap();

    for thread_id in thread_ids {
        assert!(manager.get_thread(thread_id).await.unwrap().is_none());
    }
    for message_id in message_ids {
        assert!(manager.get_message(message_id).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_ids_are_never_reused() {
    let manager = fresh_manager().await;

    let first = manager
        .create_user("carol", "c@x.com", None)
        .await
        .unwrap()
        .user
        .unwrap();
    manager.delete_user(first.user_id).await.unwrap();

    // A fresh id even after the highest row was deleted
    let second = manager
        .create_user("dan", "d@x.com", None)
        .await
        .unwrap()
        .user
        .unwrap();
    assert!(second.user_id > first.user_id);
}

#[tokio::test]
async fn test_listings_follow_insertion_order() {
    let manager = fresh_manager().await;
    let user = manager
        .create_user("erin", "e@x.com", None)
        .await
        .unwrap()
        .user
        .unwrap();
    let thread = manager
        .create_thread(user.user_id)
        .await
        .unwrap()
        .thread
        .unwrap();

    for content in ["one", "two", "three"] {
        manager
            .create_message(thread.thread_id, content, "user")
            .await
            .unwrap();
    }

    let ThreadListing::Found(threads) = manager.get_threads_by_user(user.user_id).await.unwrap()
    else {
        panic!("Existing user must yield a sequence");
    };
    assert_eq!(threads.len(), 1);

    let MessageListing::Found(messages) =
        manager.get_messages_by_thread(thread.thread_id).await.unwrap()
    else {
        panic!("Existing thread must yield a sequence");
    };
    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["one", "two", "three"]);
}

#[tokio::test]
async fn test_on_disk_database_persists_across_reopen() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("tutoria.db");

    {
        let db = Database::new(DatabaseConfig::with_path(&path))
            .await
            .expect("Failed to open database");
        let manager = DataManager::new(db);
        manager.create_user("frank", "f@x.com", None).await.unwrap();
    }

    let db = Database::new(DatabaseConfig::with_path(&path))
        .await
        .expect("Failed to reopen database");
    let manager = DataManager::new(db);

    let users = manager.list_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].username, "frank");
}

#[tokio::test]
async fn test_failure_outcomes_do_not_mutate() {
    let manager = fresh_manager().await;
    let user = manager
        .create_user("grace", "g@x.com", None)
        .await
        .unwrap()
        .user
        .unwrap();

    // Operations against missing ids come back as failure records and the
    // surviving data is untouched
    assert!(!manager.update_user(99, Some("x"), None, None).await.unwrap().success);
    assert!(!manager.delete_thread(99).await.unwrap().success);
    assert!(!manager.delete_message(99).await.unwrap().success);

    let fetched = manager.get_user(user.user_id).await.unwrap().unwrap();
    assert_eq!(fetched.username, "grace");
}
