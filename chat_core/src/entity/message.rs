use crate::ids::{MessageId, TopicId};
use crate::validation::{validate_message_text, validate_topic_reference, FieldError};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "message")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: MessageId,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    pub topic_id: TopicId,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::topic::Entity",
        from = "Column::TopicId",
        to = "super::topic::Column::Id",
        on_delete = "Cascade"
    )]
    Topic,
}

impl Related<super::topic::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Topic.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    /// Runs the same field and topic rules as the services, so writes made
    /// straight through an `ActiveModel` cannot skip them.
    async fn before_save<C>(mut self, db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let ActiveValue::Set(text) = &self.text {
            validate_message_text(text)?;
        }

        if insert {
            let submitted = match &self.topic_id {
                ActiveValue::Set(id) | ActiveValue::Unchanged(id) => *id,
                ActiveValue::NotSet => return Err(FieldError::RequiredFieldMissing.into()),
            };
            validate_topic_reference(db, None, submitted).await?;

            if !self.created_at.is_set() {
                self.created_at = ActiveValue::Set(chrono::Utc::now());
            }
        } else {
            let id = match &self.id {
                ActiveValue::Set(id) | ActiveValue::Unchanged(id) => Some(*id),
                ActiveValue::NotSet => None,
            };

            if let (ActiveValue::Set(submitted), Some(id)) = (&self.topic_id, id) {
                let stored = Entity::find_by_id(id)
                    .one(db)
                    .await?
                    .ok_or_else(|| DbErr::RecordNotFound(format!("message {id}")))?;
                validate_topic_reference(db, Some(stored.topic_id), *submitted).await?;
            }

            // created_at is write-once
            self.created_at = ActiveValue::NotSet;
        }

        Ok(self)
    }
}
