use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Form,
    Other
}

impl BodyKind {

    // a missing or empty content type is read as JSON
    pub fn from_content_type(content_type: Option<&str>) -> Self {

        let essence = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .unwrap_or_default();

        if essence.is_empty() || essence == "application/json" || essence.ends_with("+json") {
            BodyKind::Json
        } else if essence == "application/x-www-form-urlencoded" {
            BodyKind::Form
        } else {
            BodyKind::Other
        }

    }

}

/// Decodes a request body into `T`.
///
/// Only unparseable JSON is an error. A body that parses but does not fit `T`,
/// or a content type we do not read, yields `T::default()` and is left to the
/// handler's own validation.
pub fn decode_body<T>(kind: BodyKind, bytes: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default
{

    match kind {
        BodyKind::Json => {
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(T::default());
            }

            let value: Value = serde_json::from_slice(bytes).map_err(|e| {
                debug!(error = %e, "request body failed to parse");
                ApiError::InvalidJson
            })?;

            // only objects and arrays are accepted as top-level bodies
            match value {
                Value::Object(_) => Ok(serde_json::from_value(value).unwrap_or_default()),
                // an array has no named fields to read
                Value::Array(_) => Ok(T::default()),
                _ => Err(ApiError::InvalidJson)
            }
        }
        BodyKind::Form => Ok(serde_urlencoded::from_bytes(bytes).unwrap_or_default()),
        BodyKind::Other => Ok(T::default())
    }

}

/// Body extractor with the service's own rejection rules.
#[derive(Debug)]
pub struct RequestBody<T>(pub T);

#[async_trait]
impl<T> FromRequest<AppState> for RequestBody<T>
where
    T: DeserializeOwned + Default + Send
{

    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {

        let kind = BodyKind::from_content_type(
            req.headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
        );

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::internal(rejection.body_text(), state.config.is_development()))?;

        decode_body(kind, &bytes).map(RequestBody)

    }

}
