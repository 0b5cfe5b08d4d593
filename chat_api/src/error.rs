use axum::{
    extract::rejection::{BytesRejection, PathRejection},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chat_core::{
    service::{MessagesServiceError, TopicsServiceError},
    validation::ValidationErrors,
};
use chat_core::entity::prelude::DbErr;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Everything a handler can fail with, already mapped to a status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,

    #[error("invalid input: {0}")]
    Validation(ValidationErrors),

    #[error("JSON parse error - {0}")]
    Parse(String),

    #[error("unsupported media type")]
    UnsupportedMediaType,

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("Method \"{0}\" not allowed.")]
    MethodNotAllowed(Method),

    #[error("database failure")]
    Database(#[from] DbErr),

    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

fn detail(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "detail": message.into() }))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => detail(StatusCode::NOT_FOUND, "Not found."),
            ApiError::Validation(errors) => {
                warn!(%errors, "rejected request body");
                (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            ApiError::Parse(_) => {
                warn!(error = %self, "malformed request body");
                detail(StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::UnsupportedMediaType => detail(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Unsupported media type in request.",
            ),
            ApiError::PayloadTooLarge => detail(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body is too large.",
            ),
            ApiError::MethodNotAllowed(_) => {
                detail(StatusCode::METHOD_NOT_ALLOWED, self.to_string())
            }
            ApiError::Database(err) => {
                error!(error = %err, "database error while handling request");
                detail(StatusCode::INTERNAL_SERVER_ERROR, "A server error occurred.")
            }
            ApiError::Internal(message) => {
                error!(%message, "internal error while handling request");
                detail(StatusCode::INTERNAL_SERVER_ERROR, "A server error occurred.")
            }
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<TopicsServiceError> for ApiError {
    fn from(err: TopicsServiceError) -> Self {
        match err {
            TopicsServiceError::TopicNotFound => ApiError::NotFound,
            TopicsServiceError::Invalid(errors) => ApiError::Validation(errors),
            TopicsServiceError::DbError(err) => ApiError::Database(err),
        }
    }
}

impl From<MessagesServiceError> for ApiError {
    fn from(err: MessagesServiceError) -> Self {
        match err {
            MessagesServiceError::MessageNotFound => ApiError::NotFound,
            MessagesServiceError::Invalid(errors) => ApiError::Validation(errors),
            MessagesServiceError::DbError(err) => ApiError::Database(err),
        }
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::Parse(rejection.body_text())
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            // `/topics/abc` names nothing that could exist
            PathRejection::FailedToDeserializePathParams(_) => ApiError::NotFound,
            other => ApiError::Internal(other.body_text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use chat_core::validation::{field, FieldError};

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn not_found_body() {
        let (status, body) = render(ApiError::NotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"detail": "Not found."}));
    }

    #[tokio::test]
    async fn validation_body_is_field_keyed() {
        let errors = ValidationErrors::single(field::TOPIC, FieldError::ImmutableFieldViolation);
        let (status, body) = render(errors.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"topic": ["Cannot update message topic"]}));
    }

    #[tokio::test]
    async fn database_errors_are_opaque() {
        let err = ApiError::from(TopicsServiceError::DbError(DbErr::Custom(
            "disk on fire".to_string(),
        )));
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"detail": "A server error occurred."}));
    }

    #[tokio::test]
    async fn method_not_allowed_names_the_method() {
        let (status, body) = render(ApiError::MethodNotAllowed(Method::DELETE)).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({"detail": "Method \"DELETE\" not allowed."}));
    }

    #[tokio::test]
    async fn parse_errors_keep_reason() {
        let (status, body) = render(ApiError::Parse("EOF while parsing".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"detail": "JSON parse error - EOF while parsing"}));
    }
}
