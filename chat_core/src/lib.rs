use sea_orm::DatabaseConnection;
use tracing::info;

use crate::service::{MessagesService, TopicsService};

pub mod config;
pub mod entity;
pub mod error;
pub mod ids;
pub mod models;
pub mod service;
pub mod validation;
pub mod wire;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

/// Main runtime handle for the chat backend.
#[derive(Clone)]
pub struct ChatCore {
    pub config: config::ChatConfig,

    pub db: DatabaseConnection,

    pub topics: TopicsService,

    pub messages: MessagesService,
}

impl ChatCore {
    /// Connects to the configured database and brings its schema up to date.
    pub async fn start(config: config::ChatConfig) -> Result<Self, error::CoreError> {
        let db = models::open_or_create_db(&config).await?;
        models::migrate_up(&db).await?;

        info!(bind_addr = %config.bind_addr, "chat core ready");

        Ok(Self {
            topics: TopicsService::new(db.clone()),
            messages: MessagesService::new(db.clone()),
            config,
            db,
        })
    }

    pub async fn shutdown(self) -> Result<(), error::CoreError> {
        self.db.close().await?;
        Ok(())
    }
}

pub mod prelude {
    pub use super::config::ChatConfig;
    pub use super::error::CoreError;
    pub use super::ids::{MessageId, TopicId};
    pub use super::service::{
        MessageScope, MessagesService, MessagesServiceError, TopicsService, TopicsServiceError,
    };
    pub use super::validation::{
        FieldError, MessageInput, MessagePatch, TopicInput, TopicPatch, ValidationErrors,
    };
    pub use super::wire::{MessageWire, TopicSource, TopicWire, WriteMode};
    pub use super::ChatCore;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_against_in_memory_db() {
        let core = ChatCore::start(config::ChatConfig::in_memory())
            .await
            .expect("failed to start core");

        assert!(core.topics.list_topics().await.unwrap().is_empty());
        assert!(core
            .messages
            .list_messages(service::MessageScope::All)
            .await
            .unwrap()
            .is_empty());

        core.shutdown().await.unwrap();
    }
}
