use axum::Json;
use axum::extract::{OriginalUri, Path, State};
use axum::extract::rejection::PathRejection;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::info;

use crate::AppState;
use crate::catalog;
use crate::error::ApiError;
use crate::extract::RequestBody;
use crate::models::{
    timestamp, ApiInfo, CreateServiceRequest, EndpointIndex, ServiceDetail, ServiceDraft,
    ServiceList, UserList, WelcomeResponse
};
use crate::status::SERVICE_VERSION;

pub async fn welcome(State(state): State<AppState>) -> Json<WelcomeResponse> {

    let config = &state.config;

    Json(WelcomeResponse {
        message: format!("Welcome to {}", config.app_name),
        environment: config.environment.clone(),
        version: SERVICE_VERSION,
        timestamp: timestamp(),
        hostname: config.placement.hostname.clone(),
        pod_name: config.placement.pod_name.clone(),
        node_name: config.placement.node_name.clone(),
        namespace: config.placement.namespace.clone(),
        endpoints: EndpointIndex::with_api()
    })

}

pub async fn health(State(state): State<AppState>) -> Response {

    match state.status.health().await {
        Ok(report) => Json(report).into_response(),
        Err(failure) => (StatusCode::INTERNAL_SERVER_ERROR, Json(failure)).into_response()
    }

}

pub async fn api_info() -> Json<ApiInfo> {

    Json(ApiInfo {
        message: "API is running",
        version: "1.0.0",
        documentation: "https://github.com/backstage/backstage"
    })

}

pub async fn api_status(State(state): State<AppState>) -> Response {

    match state.status.status().await {
        Ok(report) => Json(report).into_response(),
        Err(failure) => (StatusCode::INTERNAL_SERVER_ERROR, Json(failure)).into_response()
    }

}

pub async fn list_users() -> Json<UserList> {

    Json(catalog::list_users())

}

pub async fn list_services() -> Json<ServiceList> {

    Json(catalog::list_services())

}

// an id that does not percent-decode to UTF-8 goes through the JSON error path
pub async fn get_service(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>
) -> Result<Json<ServiceDetail>, ApiError> {

    let Path(id) = id.map_err(|rejection| ApiError::internal(rejection.body_text(), state.config.is_development()))?;

    Ok(Json(catalog::describe_service(&id, &mut rand::thread_rng())))

}

pub async fn create_service(
    State(state): State<AppState>,
    RequestBody(request): RequestBody<CreateServiceRequest>
) -> Result<(StatusCode, Json<ServiceDraft>), ApiError> {

    let draft = catalog::create_service_draft(request, state.config.is_development())?;
    info!(id = %draft.id, version = %draft.version, "service draft created");

    Ok((StatusCode::CREATED, Json(draft)))

}

// echoes the request target as received, query string included
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {

    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    ApiError::NotFound {
        path,
        method: method.to_string()
    }

}
