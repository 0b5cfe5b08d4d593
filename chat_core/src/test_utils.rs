//! Database fixtures shared by unit tests and the API integration tests.
//!
//! Enabled for other crates through the `test-utils` feature.

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::entity::prelude::*;
use crate::ids::TopicId;
use crate::models::migrator::Migrator;

/// Fresh, empty in-memory SQLite database with no schema.
///
/// The pool is pinned to a single connection; every connection to
/// `sqlite::memory:` opens a separate database.
pub async fn connect_memory_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);

    Database::connect(options)
        .await
        .expect("Failed to create in-memory database")
}

/// In-memory database with all migrations applied.
pub async fn setup_test_db() -> DatabaseConnection {
    let db = connect_memory_db().await;
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub async fn insert_topic(db: &DatabaseConnection, title: &str) -> TopicModel {
    TopicActiveModel {
        title: Set(title.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert topic")
}

pub async fn insert_message(db: &DatabaseConnection, topic_id: TopicId, text: &str) -> MessageModel {
    MessageActiveModel {
        text: Set(text.to_string()),
        topic_id: Set(topic_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert message")
}
