//! Axum adapter for the preview endpoint.

use std::sync::Arc;

use axum::{
    extract::{OriginalUri, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::admin::RequestUrl;
use crate::auth::Principal;
use crate::handler::{PreviewHandler, PreviewResponse};

use super::core::{self, EmailTypesResponse};

/// Shared state for routes.
#[derive(Clone)]
struct AppState {
    handler: Arc<PreviewHandler>,
    principal: Arc<Principal>,
}

/// Create the preview router.
pub fn create_router(handler: Arc<PreviewHandler>, principal: Principal) -> Router {
    let state = AppState {
        handler,
        principal: Arc::new(principal),
    };

    Router::new()
        .route("/", get(index))
        .route("/json", get(list_json))
        .with_state(state)
}

/// GET / - Preview an email or render the settings page.
async fn index(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Response {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = RequestUrl::new(false, host, path_and_query);

    let response = core::index(&state.handler, &state.principal, uri.query().unwrap_or(""), &url);
    into_axum(response)
}

/// GET /json - Registered email types as JSON.
async fn list_json(State(state): State<AppState>) -> Json<EmailTypesResponse> {
    Json(core::list_email_types(&state.handler))
}

fn into_axum(response: PreviewResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, response.content_type)],
        response.body,
    )
        .into_response()
}
