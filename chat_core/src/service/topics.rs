use sea_orm::DatabaseConnection;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    entity::prelude::*,
    ids::TopicId,
    validation::{merge_topic, validate_topic_input, TopicInput, TopicPatch, ValidationErrors},
};

#[derive(Debug, Error)]
pub enum TopicsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("topic not found")]
    TopicNotFound,

    #[error("invalid topic: {0}")]
    Invalid(#[from] ValidationErrors),
}

#[derive(Clone)]
pub struct TopicsService {
    db: DatabaseConnection,
}

impl TopicsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// List every topic, oldest first
    pub async fn list_topics(&self) -> Result<Vec<TopicModel>, TopicsServiceError> {
        let topics = Topic::find()
            .order_by_asc(TopicColumn::Id)
            .all(&self.db)
            .await?;

        debug!(count = topics.len(), "listed topics");
        Ok(topics)
    }

    /// Get a specific topic by ID
    pub async fn get_topic(&self, topic_id: TopicId) -> Result<TopicModel, TopicsServiceError> {
        Topic::find_by_id(topic_id)
            .one(&self.db)
            .await?
            .ok_or(TopicsServiceError::TopicNotFound)
    }

    /// Create a new topic
    pub async fn create_topic(&self, input: TopicInput) -> Result<TopicModel, TopicsServiceError> {
        validate_topic_input(&input)?;

        let topic = TopicActiveModel {
            id: NotSet,
            title: Set(input.title),
            created_at: Set(chrono::Utc::now()),
        };

        let created = topic.insert(&self.db).await?;
        info!(topic_id = %created.id, "created topic");
        Ok(created)
    }

    /// Apply `patch` to an existing topic
    pub async fn update_topic(
        &self,
        topic_id: TopicId,
        patch: TopicPatch,
    ) -> Result<TopicModel, TopicsServiceError> {
        let stored = self.get_topic(topic_id).await?;
        let merged = merge_topic(&stored, patch)?;

        let mut topic: TopicActiveModel = stored.into();
        topic.title = Set(merged.title);

        let updated = topic.update(&self.db).await?;
        info!(topic_id = %updated.id, "updated topic");
        Ok(updated)
    }

    /// Delete a topic together with all of its messages
    pub async fn delete_topic(&self, topic_id: TopicId) -> Result<(), TopicsServiceError> {
        let txn = self.db.begin().await?;

        if Topic::find_by_id(topic_id).one(&txn).await?.is_none() {
            return Err(TopicsServiceError::TopicNotFound);
        }

        // The foreign key cascades too; deleting here keeps the outcome
        // independent of whether the backend enforces it.
        let removed = Message::delete_many()
            .filter(MessageColumn::TopicId.eq(topic_id))
            .exec(&txn)
            .await?;

        Topic::delete_by_id(topic_id).exec(&txn).await?;
        txn.commit().await?;

        info!(%topic_id, messages = removed.rows_affected, "deleted topic");
        Ok(())
    }
}
