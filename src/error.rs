use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

pub const VALIDATION_MESSAGE: &str = "Name and version are required";
const GENERIC_DETAIL: &str = "Internal server error";

/// Errors a request handler can surface to the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {

    #[error("validation failed: {0}")]
    Validation(&'static str),

    #[error("request body is not valid JSON")]
    InvalidJson,

    #[error("no route for {method} {path}")]
    NotFound { path: String, method: String },

    // detail is None when the environment must not expose it
    #[error("internal error: {}", .detail.as_deref().unwrap_or(GENERIC_DETAIL))]
    Internal { detail: Option<String> }

}

impl ApiError {

    pub fn internal(detail: impl Into<String>, expose_detail: bool) -> Self {

        let detail = detail.into();
        error!(%detail, "internal error while handling request");

        ApiError::Internal {
            detail: expose_detail.then_some(detail)
        }

    }

    pub fn status_code(&self) -> StatusCode {

        match self {
            ApiError::Validation(_) | ApiError::InvalidJson => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR
        }

    }

}

/// Body used for 500 responses, shared with the panic handler.
pub fn internal_error_body(detail: Option<&str>) -> serde_json::Value {

    json!({
        "error": "Something went wrong!",
        "message": detail.unwrap_or(GENERIC_DETAIL)
    })

}

impl IntoResponse for ApiError {

    fn into_response(self) -> Response {

        let status = self.status_code();

        let body = match &self {
            ApiError::Validation(message) => {
                warn!(%message, "rejecting request");
                json!({ "error": message })
            }
            ApiError::InvalidJson => {
                warn!("rejecting malformed JSON body");
                json!({ "error": "Invalid JSON format" })
            }
            ApiError::NotFound { path, method } => json!({
                "error": "Endpoint not found",
                "path": path,
                "method": method
            }),
            ApiError::Internal { detail } => internal_error_body(detail.as_deref())
        };

        (status, Json(body)).into_response()

    }

}

#[cfg(test)]
mod tests {

    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {

        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())

    }

    #[tokio::test]
    async fn test_validation_maps_to_400() {

        let (status, body) = body_json(ApiError::Validation(VALIDATION_MESSAGE)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Name and version are required");

    }

    #[tokio::test]
    async fn test_invalid_json_maps_to_400() {

        let (status, body) = body_json(ApiError::InvalidJson).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid JSON format");

    }

    #[tokio::test]
    async fn test_not_found_echoes_request() {

        let err = ApiError::NotFound {
            path: "/nope?x=1".to_string(),
            method: "DELETE".to_string()
        };

        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["path"], "/nope?x=1");
        assert_eq!(body["method"], "DELETE");

    }

    #[tokio::test]
    async fn test_internal_hides_detail_outside_development() {

        let (status, body) = body_json(ApiError::internal("disk on fire", false)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Something went wrong!");
        assert_eq!(body["message"], "Internal server error");

        let (_, body) = body_json(ApiError::internal("disk on fire", true)).await;
        assert_eq!(body["message"], "disk on fire");

    }

}
