use axum::{extract::State, http::StatusCode, Json};
use chat_core::{
    ids::TopicId,
    wire::{topic_to_wire, wire_to_topic_input, wire_to_topic_patch, TopicWire, WriteMode},
};

use crate::{
    error::ApiResult,
    extract::{IdPath, WireJson},
    state::AppState,
};

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<TopicWire>>> {
    let topics = state.topics.list_topics().await?;
    Ok(Json(topics.iter().map(topic_to_wire).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    WireJson(body): WireJson,
) -> ApiResult<(StatusCode, Json<TopicWire>)> {
    let input = wire_to_topic_input(&body)?;
    let topic = state.topics.create_topic(input).await?;
    Ok((StatusCode::CREATED, Json(topic_to_wire(&topic))))
}

pub async fn retrieve(
    State(state): State<AppState>,
    IdPath(id): IdPath<TopicId>,
) -> ApiResult<Json<TopicWire>> {
    let topic = state.topics.get_topic(id).await?;
    Ok(Json(topic_to_wire(&topic)))
}

pub async fn replace(
    State(state): State<AppState>,
    IdPath(id): IdPath<TopicId>,
    WireJson(body): WireJson,
) -> ApiResult<Json<TopicWire>> {
    update(state, id, body, WriteMode::Replace).await
}

pub async fn partial_update(
    State(state): State<AppState>,
    IdPath(id): IdPath<TopicId>,
    WireJson(body): WireJson,
) -> ApiResult<Json<TopicWire>> {
    update(state, id, body, WriteMode::Partial).await
}

async fn update(
    state: AppState,
    id: TopicId,
    body: serde_json::Value,
    mode: WriteMode,
) -> ApiResult<Json<TopicWire>> {
    // unknown ids are 404 even when the body is also wrong
    state.topics.get_topic(id).await?;

    let patch = wire_to_topic_patch(&body, mode)?;
    let topic = state.topics.update_topic(id, patch).await?;
    Ok(Json(topic_to_wire(&topic)))
}

pub async fn destroy(
    State(state): State<AppState>,
    IdPath(id): IdPath<TopicId>,
) -> ApiResult<StatusCode> {
    state.topics.delete_topic(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
