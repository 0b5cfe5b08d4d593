//! Messages addressed through their topic. A message outside the topic in
//! the URL is indistinguishable from one that doesn't exist.

use axum::{extract::State, http::StatusCode, Json};
use chat_core::{
    ids::{MessageId, TopicId},
    service::MessageScope,
    wire::{
        message_to_wire, wire_to_message_input, wire_to_message_patch, MessageWire, TopicSource,
        WriteMode,
    },
};

use crate::{
    error::ApiResult,
    extract::{IdPath, WireJson},
    state::AppState,
};

pub async fn list(
    State(state): State<AppState>,
    IdPath(topic_id): IdPath<TopicId>,
) -> ApiResult<Json<Vec<MessageWire>>> {
    let messages = state
        .messages
        .list_messages(MessageScope::Topic(topic_id))
        .await?;
    Ok(Json(messages.iter().map(message_to_wire).collect()))
}

/// The topic comes from the URL. An unknown topic is a 400 on `topic`, not a
/// 404.
pub async fn create(
    State(state): State<AppState>,
    IdPath(topic_id): IdPath<TopicId>,
    WireJson(body): WireJson,
) -> ApiResult<(StatusCode, Json<MessageWire>)> {
    let input = wire_to_message_input(&body, TopicSource::Path(topic_id))?;
    let message = state.messages.create_message(input).await?;
    Ok((StatusCode::CREATED, Json(message_to_wire(&message))))
}

pub async fn retrieve(
    State(state): State<AppState>,
    IdPath((topic_id, id)): IdPath<(TopicId, MessageId)>,
) -> ApiResult<Json<MessageWire>> {
    let message = state
        .messages
        .get_message(MessageScope::Topic(topic_id), id)
        .await?;
    Ok(Json(message_to_wire(&message)))
}

pub async fn replace(
    State(state): State<AppState>,
    IdPath((topic_id, id)): IdPath<(TopicId, MessageId)>,
    WireJson(body): WireJson,
) -> ApiResult<Json<MessageWire>> {
    update(state, topic_id, id, body, WriteMode::Replace).await
}

pub async fn partial_update(
    State(state): State<AppState>,
    IdPath((topic_id, id)): IdPath<(TopicId, MessageId)>,
    WireJson(body): WireJson,
) -> ApiResult<Json<MessageWire>> {
    update(state, topic_id, id, body, WriteMode::Partial).await
}

async fn update(
    state: AppState,
    topic_id: TopicId,
    id: MessageId,
    body: serde_json::Value,
    mode: WriteMode,
) -> ApiResult<Json<MessageWire>> {
    let scope = MessageScope::Topic(topic_id);
    let existing = state.messages.get_message(scope, id).await?;

    let patch = wire_to_message_patch(&body, &existing, mode, TopicSource::Path(topic_id))?;
    let message = state.messages.update_message(scope, id, patch).await?;
    Ok(Json(message_to_wire(&message)))
}

pub async fn destroy(
    State(state): State<AppState>,
    IdPath((topic_id, id)): IdPath<(TopicId, MessageId)>,
) -> ApiResult<StatusCode> {
    state
        .messages
        .delete_message(MessageScope::Topic(topic_id), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
