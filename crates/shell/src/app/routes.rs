use axum::{
    Extension, Json,
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::app::errors::json_error;
use crate::middleware::{PageAccess, ShellState};

pub async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Describes the page the guard let through.
///
/// `params` holds the numeric ids captured by the matching pattern, e.g.
/// `/parent/orders/77` under `/parent/orders/:orderId` gives `{"orderId": "77"}`.
pub async fn page(
    State(state): State<ShellState>,
    Extension(access): Extension<PageAccess>,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET {
        return json_error(StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", "pages are GET only");
    }

    let path = uri.path();
    let pattern = state.guard.policy().matching_pattern(access.role, path);
    let params = pattern.and_then(|p| p.captures(path)).unwrap_or_default();

    Json(json!({
        "path": path,
        "pattern": pattern.map(|p| p.as_str()),
        "role": access.role.map(|r| r.as_str()),
        "params": params,
    }))
    .into_response()
}
