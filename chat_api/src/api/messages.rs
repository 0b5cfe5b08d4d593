//! Messages addressed by their own id, across all topics.

use axum::{extract::State, http::StatusCode, Json};
use chat_core::{
    ids::MessageId,
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

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<MessageWire>>> {
    let messages = state.messages.list_messages(MessageScope::All).await?;
    Ok(Json(messages.iter().map(message_to_wire).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    WireJson(body): WireJson,
) -> ApiResult<(StatusCode, Json<MessageWire>)> {
    let input = wire_to_message_input(&body, TopicSource::Body)?;
    let message = state.messages.create_message(input).await?;
    Ok((StatusCode::CREATED, Json(message_to_wire(&message))))
}

pub async fn retrieve(
    State(state): State<AppState>,
    IdPath(id): IdPath<MessageId>,
) -> ApiResult<Json<MessageWire>> {
    let message = state.messages.get_message(MessageScope::All, id).await?;
    Ok(Json(message_to_wire(&message)))
}

pub async fn replace(
    State(state): State<AppState>,
    IdPath(id): IdPath<MessageId>,
    WireJson(body): WireJson,
) -> ApiResult<Json<MessageWire>> {
    update(state, id, body, WriteMode::Replace).await
}

pub async fn partial_update(
    State(state): State<AppState>,
    IdPath(id): IdPath<MessageId>,
    WireJson(body): WireJson,
) -> ApiResult<Json<MessageWire>> {
    update(state, id, body, WriteMode::Partial).await
}

async fn update(
    state: AppState,
    id: MessageId,
    body: serde_json::Value,
    mode: WriteMode,
) -> ApiResult<Json<MessageWire>> {
    let existing = state.messages.get_message(MessageScope::All, id).await?;

    let patch = wire_to_message_patch(&body, &existing, mode, TopicSource::Body)?;
    let message = state
        .messages
        .update_message(MessageScope::All, id, patch)
        .await?;
    Ok(Json(message_to_wire(&message)))
}

pub async fn destroy(
    State(state): State<AppState>,
    IdPath(id): IdPath<MessageId>,
) -> ApiResult<StatusCode> {
    state.messages.delete_message(MessageScope::All, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
