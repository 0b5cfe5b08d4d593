//! Field rules and the message topic invariant.
//!
//! Everything that decides whether a topic or message may be written lives
//! here. The same functions are called from the wire layer, from the
//! services, and from the entity `before_save` hooks, so a write is judged
//! identically no matter which path it takes.

use std::collections::BTreeMap;
use std::fmt;

use sea_orm::{ConnectionTrait, DbErr, EntityTrait};
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::entity::{message, topic};
use crate::ids::TopicId;

pub const TOPIC_TITLE_MIN_LEN: usize = 5;
pub const TOPIC_TITLE_MAX_LEN: usize = 255;
pub const MESSAGE_TEXT_MIN_LEN: usize = 10;

/// Wire field names used as keys in [`ValidationErrors`].
pub mod field {
    pub const TITLE: &str = "title";
    pub const TEXT: &str = "text";
    pub const TOPIC: &str = "topic";
    pub const NON_FIELD_ERRORS: &str = "non_field_errors";
}

/// A single problem with a single field.
///
/// The `Display` output is the exact string sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// `actual` is only reported for validator-style bounds (message text).
    #[error("{}", too_short_message(.min, .actual))]
    TooShort { min: usize, actual: Option<usize> },

    #[error("Ensure this field has no more than {max} characters.")]
    TooLong { max: usize },

    #[error("This field is required.")]
    RequiredFieldMissing,

    #[error("This field may not be null.")]
    NullNotAllowed,

    #[error("Not a valid string.")]
    NotAString,

    #[error("Incorrect type. Expected pk value, received {received}.")]
    IncorrectPkType { received: &'static str },

    #[error("Invalid pk \"{pk}\" - object does not exist.")]
    ForeignKeyNotFound { pk: String },

    #[error("Cannot update message topic")]
    ImmutableFieldViolation,

    #[error("Invalid data. Expected a dictionary, but got {received}.")]
    InvalidData { received: &'static str },
}

fn too_short_message(min: &usize, actual: &Option<usize>) -> String {
    match actual {
        Some(actual) => {
            format!("Ensure this value has at least {min} characters (it has {actual}).")
        }
        None => format!("Ensure this field has at least {min} characters."),
    }
}

impl Serialize for FieldError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Field-keyed collection of [`FieldError`]s.
///
/// Serializes as `{"field": ["message", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<FieldError>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, error: FieldError) -> Self {
        let mut errors = Self::new();
        errors.add(field, error);
        errors
    }

    pub fn add(&mut self, field: &'static str, error: FieldError) {
        self.0.entry(field).or_default().push(error);
    }

    /// Records the error of `result`, if any.
    pub fn check(&mut self, field: &'static str, result: Result<(), FieldError>) {
        if let Err(error) = result {
            self.add(field, error);
        }
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, errors) in other.0 {
            self.0.entry(field).or_default().extend(errors);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[FieldError]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    /// `Ok(value)` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, errors) in &self.0 {
            for error in errors {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {error}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Failure of a check that needs the database.
#[derive(Debug, Error)]
pub enum InvariantError {
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error(transparent)]
    Db(#[from] DbErr),
}

// The direct persistence path reports rule violations with the same text
// the HTTP layer sends.
impl From<FieldError> for DbErr {
    fn from(error: FieldError) -> Self {
        DbErr::Custom(error.to_string())
    }
}

impl From<InvariantError> for DbErr {
    fn from(error: InvariantError) -> Self {
        match error {
            InvariantError::Field(error) => error.into(),
            InvariantError::Db(error) => error,
        }
    }
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

pub fn validate_topic_title(title: &str) -> Result<(), FieldError> {
    let len = char_len(title);
    if len < TOPIC_TITLE_MIN_LEN {
        return Err(FieldError::TooShort {
            min: TOPIC_TITLE_MIN_LEN,
            actual: None,
        });
    }
    if len > TOPIC_TITLE_MAX_LEN {
        return Err(FieldError::TooLong {
            max: TOPIC_TITLE_MAX_LEN,
        });
    }
    Ok(())
}

pub fn validate_message_text(text: &str) -> Result<(), FieldError> {
    let len = char_len(text);
    if len < MESSAGE_TEXT_MIN_LEN {
        return Err(FieldError::TooShort {
            min: MESSAGE_TEXT_MIN_LEN,
            actual: Some(len),
        });
    }
    Ok(())
}

/// Pure half of the topic reference rule: a stored reference may only be
/// resubmitted unchanged.
pub fn check_topic_unchanged(
    existing: Option<TopicId>,
    submitted: TopicId,
) -> Result<(), FieldError> {
    match existing {
        Some(existing) if existing != submitted => Err(FieldError::ImmutableFieldViolation),
        _ => Ok(()),
    }
}

/// Full topic reference rule. New records (`existing == None`) must point
/// at a topic that exists in `db`.
pub async fn validate_topic_reference<C>(
    db: &C,
    existing: Option<TopicId>,
    submitted: TopicId,
) -> Result<(), InvariantError>
where
    C: ConnectionTrait,
{
    check_topic_unchanged(existing, submitted)?;

    if existing.is_none() {
        let found = topic::Entity::find_by_id(submitted).one(db).await?;
        if found.is_none() {
            return Err(FieldError::ForeignKeyNotFound {
                pk: submitted.to_string(),
            }
            .into());
        }
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicInput {
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicPatch {
    pub title: Option<String>,
}

impl From<TopicInput> for TopicPatch {
    fn from(input: TopicInput) -> Self {
        Self {
            title: Some(input.title),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageInput {
    pub text: String,
    pub topic_id: TopicId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePatch {
    pub text: Option<String>,
    pub topic_id: Option<TopicId>,
}

impl From<MessageInput> for MessagePatch {
    fn from(input: MessageInput) -> Self {
        Self {
            text: Some(input.text),
            topic_id: Some(input.topic_id),
        }
    }
}

pub fn validate_topic_input(input: &TopicInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.check(field::TITLE, validate_topic_title(&input.title));
    errors.into_result(())
}

/// Field rules for a new message. Topic existence is checked separately
/// with [`validate_topic_reference`].
pub fn validate_message_input(input: &MessageInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.check(field::TEXT, validate_message_text(&input.text));
    errors.into_result(())
}

/// Applies `patch` on top of `stored`. `id` and `created_at` always come
/// from `stored`.
pub fn merge_topic(
    stored: &topic::Model,
    patch: TopicPatch,
) -> Result<topic::Model, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut merged = stored.clone();

    if let Some(title) = patch.title {
        errors.check(field::TITLE, validate_topic_title(&title));
        merged.title = title;
    }

    errors.into_result(merged)
}

/// Applies `patch` on top of `stored`, rejecting any attempt to move the
/// message to another topic.
pub fn merge_message(
    stored: &message::Model,
    patch: MessagePatch,
) -> Result<message::Model, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut merged = stored.clone();

    if let Some(text) = patch.text {
        errors.check(field::TEXT, validate_message_text(&text));
        merged.text = text;
    }

    if let Some(topic_id) = patch.topic_id {
        errors.check(
            field::TOPIC,
            check_topic_unchanged(Some(stored.topic_id), topic_id),
        );
    }

    errors.into_result(merged)
}
