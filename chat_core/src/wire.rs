//! JSON shapes exchanged with clients.
//!
//! Output structs list their fields by hand so the wire contract never
//! follows the storage schema by accident. Input is read field by field out
//! of a `serde_json::Value`: unknown keys are ignored and every problem is
//! reported under the key that caused it.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::entity::{message, topic};
use crate::ids::{MessageId, TopicId};
use crate::validation::{
    check_topic_unchanged, field, validate_message_text, validate_topic_title, FieldError,
    MessageInput, MessagePatch, TopicInput, TopicPatch, ValidationErrors,
};

/// Second resolution, always UTC.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

fn serialize_timestamp<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicWire {
    pub id: TopicId,
    pub title: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageWire {
    pub id: MessageId,
    pub text: String,
    pub topic: TopicId,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

pub fn topic_to_wire(topic: &topic::Model) -> TopicWire {
    TopicWire {
        id: topic.id,
        title: topic.title.clone(),
        created_at: topic.created_at,
    }
}

pub fn message_to_wire(message: &message::Model) -> MessageWire {
    MessageWire {
        id: message.id,
        text: message.text.clone(),
        topic: message.topic_id,
        created_at: message.created_at,
    }
}

/// Which request is being decoded. Decides whether required fields may be
/// left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// `POST`
    Create,
    /// `PUT`
    Replace,
    /// `PATCH`
    Partial,
}

impl WriteMode {
    fn requires_all_fields(self) -> bool {
        !matches!(self, WriteMode::Partial)
    }
}

/// Where a message's topic comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicSource {
    /// The `topic` key of the request body.
    Body,
    /// A topic id taken from the URL. Any `topic` key in the body is ignored.
    Path(TopicId),
}

fn type_label(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "int",
        Value::Number(_) => "float",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, ValidationErrors> {
    body.as_object().ok_or_else(|| {
        ValidationErrors::single(
            field::NON_FIELD_ERRORS,
            FieldError::InvalidData {
                received: type_label(body),
            },
        )
    })
}

/// Reads a text field. `Ok(None)` means the key is absent.
fn read_text(object: &Map<String, Value>, key: &str) -> Result<Option<String>, FieldError> {
    match object.get(key) {
        None => Ok(None),
        Some(Value::Null) => Err(FieldError::NullNotAllowed),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(FieldError::NotAString),
    }
}

/// Reads a topic reference. Accepts integers and integer strings.
fn read_topic_id(
    object: &Map<String, Value>,
    key: &str,
) -> Result<Option<TopicId>, FieldError> {
    let value = match object.get(key) {
        None => return Ok(None),
        Some(Value::Null) => return Err(FieldError::NullNotAllowed),
        Some(value) => value,
    };

    let pk: i64 = match value {
        Value::Number(n) => n.as_i64().ok_or(FieldError::IncorrectPkType {
            received: type_label(value),
        })?,
        Value::String(s) => s.trim().parse().map_err(|_| FieldError::IncorrectPkType {
            received: "str",
        })?,
        other => {
            return Err(FieldError::IncorrectPkType {
                received: type_label(other),
            })
        }
    };

    i32::try_from(pk)
        .map(|id| Some(TopicId::from_i32(id)))
        .map_err(|_| FieldError::ForeignKeyNotFound { pk: pk.to_string() })
}

fn require<T>(value: Option<T>, mode: WriteMode) -> Result<Option<T>, FieldError> {
    match value {
        None if mode.requires_all_fields() => Err(FieldError::RequiredFieldMissing),
        value => Ok(value),
    }
}

fn decode_title(
    object: &Map<String, Value>,
    mode: WriteMode,
) -> Result<Option<String>, FieldError> {
    let title = require(read_text(object, field::TITLE)?, mode)?;
    if let Some(title) = &title {
        validate_topic_title(title)?;
    }
    Ok(title)
}

fn decode_text(
    object: &Map<String, Value>,
    mode: WriteMode,
) -> Result<Option<String>, FieldError> {
    let text = require(read_text(object, field::TEXT)?, mode)?;
    if let Some(text) = &text {
        validate_message_text(text)?;
    }
    Ok(text)
}

fn decode_topic(
    object: &Map<String, Value>,
    mode: WriteMode,
    source: TopicSource,
    existing: Option<&message::Model>,
) -> Result<Option<TopicId>, FieldError> {
    let topic_id = match source {
        TopicSource::Path(id) => Some(id),
        TopicSource::Body => require(read_topic_id(object, field::TOPIC)?, mode)?,
    };
    if let Some(topic_id) = topic_id {
        check_topic_unchanged(existing.map(|m| m.topic_id), topic_id)?;
    }
    Ok(topic_id)
}

/// Moves a field's error into `errors`, leaving `None` in its place.
fn slot<T>(
    errors: &mut ValidationErrors,
    key: &'static str,
    result: Result<Option<T>, FieldError>,
) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(error) => {
            errors.add(key, error);
            None
        }
    }
}

/// Decodes a new topic. `title` is required.
pub fn wire_to_topic_input(body: &Value) -> Result<TopicInput, ValidationErrors> {
    let patch = wire_to_topic_patch(body, WriteMode::Create)?;
    match patch.title {
        Some(title) => Ok(TopicInput { title }),
        None => Err(ValidationErrors::single(
            field::TITLE,
            FieldError::RequiredFieldMissing,
        )),
    }
}

pub fn wire_to_topic_patch(
    body: &Value,
    mode: WriteMode,
) -> Result<TopicPatch, ValidationErrors> {
    let object = as_object(body)?;
    let mut errors = ValidationErrors::new();

    let title = slot(&mut errors, field::TITLE, decode_title(object, mode));

    errors.into_result(TopicPatch { title })
}

/// Decodes a new message. Both `text` and the topic are required; the topic
/// may come from the URL instead of the body.
pub fn wire_to_message_input(
    body: &Value,
    source: TopicSource,
) -> Result<MessageInput, ValidationErrors> {
    let object = as_object(body)?;
    let mut errors = ValidationErrors::new();

    let text = slot(&mut errors, field::TEXT, decode_text(object, WriteMode::Create));
    let topic_id = slot(
        &mut errors,
        field::TOPIC,
        decode_topic(object, WriteMode::Create, source, None),
    );

    match (text, topic_id) {
        (Some(text), Some(topic_id)) if errors.is_empty() => Ok(MessageInput { text, topic_id }),
        _ => Err(errors),
    }
}

/// Decodes an update to `existing`. A topic that differs from the stored
/// one is rejected here, before the request reaches the store.
pub fn wire_to_message_patch(
    body: &Value,
    existing: &message::Model,
    mode: WriteMode,
    source: TopicSource,
) -> Result<MessagePatch, ValidationErrors> {
    let object = as_object(body)?;
    let mut errors = ValidationErrors::new();

    let text = slot(&mut errors, field::TEXT, decode_text(object, mode));
    let topic_id = slot(
        &mut errors,
        field::TOPIC,
        decode_topic(object, mode, source, Some(existing)),
    );

    errors.into_result(MessagePatch { text, topic_id })
}
