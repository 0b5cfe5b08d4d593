use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::{header, HeaderMap},
};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Path parameters, with undecodable ids reported as a plain 404.
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct IdPath<T>(pub T);

/// A request body parsed as JSON but not yet interpreted.
///
/// An empty body reads as `{}` whatever its content type, so missing fields
/// are reported field by field. Non-empty bodies must be declared as JSON.
pub struct WireJson(pub Value);

fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

#[async_trait]
impl<S> FromRequest<S> for WireJson
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json_declared = is_json_content_type(req.headers());

        let body = Bytes::from_request(req, state).await?;

        if body.is_empty() {
            return Ok(WireJson(Value::Object(Map::new())));
        }
        if !json_declared {
            return Err(ApiError::UnsupportedMediaType);
        }

        serde_json::from_slice(&body)
            .map(WireJson)
            .map_err(|err| ApiError::Parse(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::HeaderValue;

    fn headers(content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    #[test]
    fn json_content_types() {
        assert!(is_json_content_type(&headers("application/json")));
        assert!(is_json_content_type(&headers("application/json; charset=utf-8")));
        assert!(is_json_content_type(&headers("Application/JSON")));
        assert!(is_json_content_type(&headers("application/vnd.api+json")));

        assert!(!is_json_content_type(&headers("text/plain")));
        assert!(!is_json_content_type(&headers("application/x-www-form-urlencoded")));
        assert!(!is_json_content_type(&HeaderMap::new()));
    }

    #[tokio::test]
    async fn oversized_body_is_payload_too_large() {
        // no DefaultBodyLimit layer here, so axum's 2 MB default applies
        let body = format!(r#"{{"text":"{}","topic":1}}"#, "a".repeat(3_000_000));
        let req = axum::http::Request::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();

        let result = WireJson::from_request(req, &()).await;
        assert!(matches!(result, Err(ApiError::PayloadTooLarge)));
    }
}
