use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use kvsearch_common::{Error, ErrorKind};
use kvsearch_query::SearchService;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

pub const SEARCH_PATH: &str = "/search";

const CORS_HEADERS: [(header::HeaderName, &str); 3] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (
        header::ACCESS_CONTROL_ALLOW_METHODS,
        "GET, HEAD, POST, OPTIONS",
    ),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
];

/// Application state shared across requests.
pub struct AppState {
    pub service: SearchService,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(handle_request)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Every request lands here: preflight for any path, search on
/// [`SEARCH_PATH`] for any other method, 404 elsewhere.
pub async fn handle_request(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
) -> Response {
    if method == Method::OPTIONS {
        return (StatusCode::OK, CORS_HEADERS).into_response();
    }
    match uri.path() {
        SEARCH_PATH => handle_search(&state, uri.query()).await,
        _ => (StatusCode::NOT_FOUND, CORS_HEADERS).into_response(),
    }
}

async fn handle_search(state: &AppState, raw_query: Option<&str>) -> Response {
    let query = match raw_query {
        Some(q) if !q.is_empty() => format!("?{q}"),
        _ => String::new(),
    };
    match state.service.search(&query).await {
        Ok(response) => (StatusCode::OK, CORS_HEADERS, Json(response)).into_response(),
        Err(e) => error_response(&query, e),
    }
}

fn error_response(query: &str, e: Error) -> Response {
    let status = match e.kind() {
        ErrorKind::MalformedQuery { .. } => StatusCode::BAD_REQUEST,
        ErrorKind::TooManyTerms { .. } | ErrorKind::QueryTooLong { .. } => {
            StatusCode::PAYLOAD_TOO_LARGE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let message = if e.is_client_error() {
        warn!(%query, error = %e, "Rejected search");
        e.to_string()
    } else {
        error!(%query, error = %e, "Search failed");
        "Internal error".to_string()
    };
    (
        status,
        CORS_HEADERS,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}
