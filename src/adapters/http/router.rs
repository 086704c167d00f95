//! Application router: routes, state wiring and the tower-http stack.

use axum::{body::Body, routing::get, Json, Router};
use http::{header, HeaderName, HeaderValue, Method, Request};
use serde_json::{json, Value};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::adapters::websocket::{websocket_router, WebSocketState};
use crate::config::ServerConfig;

use super::webhook::{webhook_router, WebhookAppState};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// GET /health - Liveness probe
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Assemble the full HTTP surface.
///
/// ```text
/// POST /api/webhooks/transactions
/// GET  /api/notifications/ws
/// GET  /health
/// ```
pub fn build_app(webhook: WebhookAppState, websocket: WebSocketState, server: &ServerConfig) -> Router {
    let api = webhook_router()
        .with_state(webhook)
        .merge(websocket_router().with_state(websocket));

    let router = Router::new()
        .nest("/api", api)
        .route("/health", get(health))
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::new(server.request_timeout()));

    let router = match cors_layer(&server.cors_origins_list()) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    router
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri().path(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

/// CORS for browser clients of the notification socket. `*` allows any origin.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| HeaderValue::from_str(o).ok()))
    };

    Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
    )
}
