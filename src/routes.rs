use std::any::Any;

use axum::Json;
use axum::Router;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::AppState;
use crate::error::internal_error_body;
use crate::handlers;

fn panic_response(panic: Box<dyn Any + Send + 'static>, expose_detail: bool) -> Response {

    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("handler panicked");

    error!(%detail, "request handler panicked");

    let body = internal_error_body(expose_detail.then_some(detail));
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()

}

// every known path answers unsupported methods with the same 404 as unknown paths
pub fn build_router(state: AppState) -> Router {

    let expose_detail = state.config.is_development();

    Router::new()
        .route("/", get(handlers::welcome).fallback(handlers::not_found))
        .route("/health", get(handlers::health).fallback(handlers::not_found))
        .route("/api", get(handlers::api_info).fallback(handlers::not_found))
        .route("/api-status", get(handlers::api_status).fallback(handlers::not_found))
        .route("/api/users", get(handlers::list_users).fallback(handlers::not_found))
        .route(
            "/api/services",
            get(handlers::list_services)
                .post(handlers::create_service)
                .fallback(handlers::not_found)
        )
        .route("/api/services/:id", get(handlers::get_service).fallback(handlers::not_found))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| {
            panic_response(panic, expose_detail)
        }))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff")
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN")
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("0")
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())

}
