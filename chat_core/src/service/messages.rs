use sea_orm::DatabaseConnection;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    entity::prelude::*,
    ids::{MessageId, TopicId},
    validation::{
        field, merge_message, validate_message_input, validate_topic_reference, InvariantError,
        MessageInput, MessagePatch, ValidationErrors,
    },
};

#[derive(Debug, Error)]
pub enum MessagesServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("message not found")]
    MessageNotFound,

    #[error("invalid message: {0}")]
    Invalid(#[from] ValidationErrors),
}

/// Which messages an operation can see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageScope {
    All,
    /// Only messages belonging to this topic. Anything else is treated as
    /// missing.
    Topic(TopicId),
}

impl MessageScope {
    fn apply(self, query: Select<Message>) -> Select<Message> {
        match self {
            MessageScope::All => query,
            MessageScope::Topic(topic_id) => query.filter(MessageColumn::TopicId.eq(topic_id)),
        }
    }
}

#[derive(Clone)]
pub struct MessagesService {
    db: DatabaseConnection,
}

impl MessagesService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// List the messages visible in `scope`, ordered by id
    pub async fn list_messages(
        &self,
        scope: MessageScope,
    ) -> Result<Vec<MessageModel>, MessagesServiceError> {
        let messages = scope
            .apply(Message::find())
            .order_by_asc(MessageColumn::Id)
            .all(&self.db)
            .await?;

        debug!(?scope, count = messages.len(), "listed messages");
        Ok(messages)
    }

    /// Get a message by ID, provided it is visible in `scope`
    pub async fn get_message(
        &self,
        scope: MessageScope,
        message_id: MessageId,
    ) -> Result<MessageModel, MessagesServiceError> {
        scope
            .apply(Message::find_by_id(message_id))
            .one(&self.db)
            .await?
            .ok_or(MessagesServiceError::MessageNotFound)
    }

    /// Create a message in an existing topic
    ///
    /// Field errors and an unknown topic are reported together.
    pub async fn create_message(
        &self,
        input: MessageInput,
    ) -> Result<MessageModel, MessagesServiceError> {
        let mut errors = ValidationErrors::new();
        if let Err(field_errors) = validate_message_input(&input) {
            errors.merge(field_errors);
        }

        match validate_topic_reference(&self.db, None, input.topic_id).await {
            Ok(()) => {}
            Err(InvariantError::Field(error)) => errors.add(field::TOPIC, error),
            Err(InvariantError::Db(error)) => return Err(error.into()),
        }

        if !errors.is_empty() {
            return Err(errors.into());
        }

        let message = MessageActiveModel {
            id: NotSet,
            text: Set(input.text),
            topic_id: Set(input.topic_id),
            created_at: Set(chrono::Utc::now()),
        };

        let created = message.insert(&self.db).await?;
        info!(message_id = %created.id, topic_id = %created.topic_id, "created message");
        Ok(created)
    }

    /// Apply `patch` to a message visible in `scope`
    pub async fn update_message(
        &self,
        scope: MessageScope,
        message_id: MessageId,
        patch: MessagePatch,
    ) -> Result<MessageModel, MessagesServiceError> {
        let stored = self.get_message(scope, message_id).await?;
        let merged = merge_message(&stored, patch)?;

        let mut message: MessageActiveModel = stored.into();
        message.text = Set(merged.text);

        let updated = message.update(&self.db).await?;
        info!(message_id = %updated.id, "updated message");
        Ok(updated)
    }

    /// Delete a message visible in `scope`
    pub async fn delete_message(
        &self,
        scope: MessageScope,
        message_id: MessageId,
    ) -> Result<(), MessagesServiceError> {
        let message = self.get_message(scope, message_id).await?;
        message.delete(&self.db).await?;

        info!(%message_id, "deleted message");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;
    use crate::validation::FieldError;

    struct Fixture {
        service: MessagesService,
        weather: TopicId,
        color: TopicId,
    }

    async fn setup_test_service() -> Fixture {
        let db = test_utils::setup_test_db().await;
        let weather = test_utils::insert_topic(&db, "What is the weather like?").await;
        let color = test_utils::insert_topic(&db, "The Most Popular Color in the World").await;

        Fixture {
            service: MessagesService::new(db),
            weather: weather.id,
            color: color.id,
        }
    }

    fn invalid(err: MessagesServiceError) -> ValidationErrors {
        match err {
            MessagesServiceError::Invalid(errors) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    fn input(text: &str, topic_id: TopicId) -> MessageInput {
        MessageInput {
            text: text.to_string(),
            topic_id,
        }
    }

    #[tokio::test]
    async fn test_create_message() {
        let fx = setup_test_service().await;

        let message = fx
            .service
            .create_message(input("Hot and sunny day", fx.weather))
            .await
            .expect("Failed to create message");

        assert_eq!(message.text, "Hot and sunny day");
        assert_eq!(message.topic_id, fx.weather);

        let fetched = fx
            .service
            .get_message(MessageScope::All, message.id)
            .await
            .unwrap();
        assert_eq!(fetched, message);
    }

    #[tokio::test]
    async fn test_create_message_text_bounds() {
        let fx = setup_test_service().await;

        assert!(fx
            .service
            .create_message(input(&"a".repeat(10), fx.weather))
            .await
            .is_ok());

        let err = fx
            .service
            .create_message(input(&"a".repeat(9), fx.weather))
            .await
            .unwrap_err();
        let errors = invalid(err);
        assert_eq!(
            errors.get(field::TEXT),
            Some(
                &[FieldError::TooShort {
                    min: 10,
                    actual: Some(9)
                }][..]
            )
        );
    }

    #[tokio::test]
    async fn test_create_message_unknown_topic() {
        let fx = setup_test_service().await;

        let err = fx
            .service
            .create_message(input("Hot and sunny day", TopicId::from_i32(99)))
            .await
            .unwrap_err();
        let errors = invalid(err);
        assert_eq!(
            errors.get(field::TOPIC).unwrap()[0].to_string(),
            r#"Invalid pk "99" - object does not exist."#
        );

        let all = fx.service.list_messages(MessageScope::All).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_create_message_reports_all_errors() {
        let fx = setup_test_service().await;

        let err = fx
            .service
            .create_message(input("short", TopicId::from_i32(99)))
            .await
            .unwrap_err();
        let errors = invalid(err);
        assert_eq!(errors.fields().collect::<Vec<_>>(), [field::TEXT, field::TOPIC]);
    }

    #[tokio::test]
    async fn test_list_messages_by_scope() {
        let fx = setup_test_service().await;

        let hot = fx
            .service
            .create_message(input("Hot and sunny day", fx.weather))
            .await
            .unwrap();
        let blue = fx
            .service
            .create_message(input("The best color is Blue", fx.color))
            .await
            .unwrap();
        let cold = fx
            .service
            .create_message(input("I think it will be cold", fx.weather))
            .await
            .unwrap();

        let all = fx.service.list_messages(MessageScope::All).await.unwrap();
        assert_eq!(all, vec![hot.clone(), blue.clone(), cold.clone()]);

        let weather = fx
            .service
            .list_messages(MessageScope::Topic(fx.weather))
            .await
            .unwrap();
        assert_eq!(weather, vec![hot, cold]);

        let color = fx
            .service
            .list_messages(MessageScope::Topic(fx.color))
            .await
            .unwrap();
        assert_eq!(color, vec![blue]);

        let nowhere = fx
            .service
            .list_messages(MessageScope::Topic(TopicId::from_i32(99)))
            .await
            .unwrap();
        assert!(nowhere.is_empty());
    }

    #[tokio::test]
    async fn test_scope_hides_other_topics() {
        let fx = setup_test_service().await;
        let message = fx
            .service
            .create_message(input("The best color is Blue", fx.color))
            .await
            .unwrap();

        let wrong = MessageScope::Topic(fx.weather);

        assert!(matches!(
            fx.service.get_message(wrong, message.id).await,
            Err(MessagesServiceError::MessageNotFound)
        ));
        assert!(matches!(
            fx.service
                .update_message(wrong, message.id, MessagePatch::default())
                .await,
            Err(MessagesServiceError::MessageNotFound)
        ));
        assert!(matches!(
            fx.service.delete_message(wrong, message.id).await,
            Err(MessagesServiceError::MessageNotFound)
        ));

        // still there
        fx.service
            .get_message(MessageScope::Topic(fx.color), message.id)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_message_text() {
        let fx = setup_test_service().await;
        let message = fx
            .service
            .create_message(input("Its sunny day", fx.weather))
            .await
            .unwrap();

        let updated = fx
            .service
            .update_message(
                MessageScope::All,
                message.id,
                MessagePatch {
                    text: Some("Its a cloudy day".to_string()),
                    topic_id: Some(fx.weather),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, message.id);
        assert_eq!(updated.text, "Its a cloudy day");
        assert_eq!(updated.topic_id, fx.weather);
        assert_eq!(updated.created_at, message.created_at);
    }

    #[tokio::test]
    async fn test_update_message_cannot_change_topic() {
        let fx = setup_test_service().await;
        let message = fx
            .service
            .create_message(input("Its sunny day", fx.weather))
            .await
            .unwrap();

        let err = fx
            .service
            .update_message(
                MessageScope::All,
                message.id,
                MessagePatch {
                    text: Some("Its a cloudy day".to_string()),
                    topic_id: Some(fx.color),
                },
            )
            .await
            .unwrap_err();
        let errors = invalid(err);
        assert_eq!(
            errors.get(field::TOPIC),
            Some(&[FieldError::ImmutableFieldViolation][..])
        );

        let unchanged = fx
            .service
            .get_message(MessageScope::All, message.id)
            .await
            .unwrap();
        assert_eq!(unchanged, message);
    }

    #[tokio::test]
    async fn test_delete_message() {
        let fx = setup_test_service().await;
        let message = fx
            .service
            .create_message(input("Hot and sunny day", fx.weather))
            .await
            .unwrap();

        fx.service
            .delete_message(MessageScope::Topic(fx.weather), message.id)
            .await
            .unwrap();

        assert!(matches!(
            fx.service.get_message(MessageScope::All, message.id).await,
            Err(MessagesServiceError::MessageNotFound)
        ));
        assert!(matches!(
            fx.service.delete_message(MessageScope::All, message.id).await,
            Err(MessagesServiceError::MessageNotFound)
        ));
    }
}
