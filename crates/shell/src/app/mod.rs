//! HTTP shell wiring (Axum router + guard middleware).
//!
//! - `routes.rs`: health check and the guarded page handler
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Router, routing::get};
use tower::ServiceBuilder;

use campease_auth::{Hs256Decoder, RouteGuard, RoutePolicy};

use crate::middleware::{self, ShellState};

pub mod errors;
pub mod routes;

impl ShellState {
    /// Verify tokens with the shared HS256 secret and guard with `policy`.
    pub fn new(jwt_secret: &str, policy: RoutePolicy) -> Self {
        let decoder = Arc::new(Hs256Decoder::new(jwt_secret));
        Self {
            guard: RouteGuard::new(Arc::new(policy), decoder.clone()),
            decoder,
        }
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(state: ShellState) -> Router {
    // Every path except the health check goes through the guard.
    let guarded = Router::new()
        .fallback(routes::page)
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::guard_middleware,
        )))
        .with_state(state);

    Router::new()
        .route("/healthz", get(routes::healthz))
        .merge(guarded)
}
