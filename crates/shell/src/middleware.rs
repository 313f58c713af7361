use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use campease_auth::{
    ClearReason, Decision, Identity, Role, RouteGuard, SessionAction, SessionSnapshot, TokenDecoder,
};

/// Cookie carrying the bearer token for browser navigation.
pub const TOKEN_COOKIE: &str = "campease_token";
/// Header set when a request arrived with an expired session.
pub const NOTICE_HEADER: &str = "x-campease-notice";

#[derive(Clone)]
pub struct ShellState {
    pub guard: RouteGuard,
    pub decoder: Arc<dyn TokenDecoder>,
}

/// What the guard granted for the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageAccess {
    pub role: Option<Role>,
}

/// Where the evaluated token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenSource {
    Header,
    Cookie,
}

pub async fn guard_middleware(
    State(state): State<ShellState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    let now = Utc::now();

    let (snapshot, source) = session_from_headers(&state, req.headers());
    let mut outcome = state.guard.evaluate(&path, &snapshot, now);

    let cleared = match outcome.session {
        SessionAction::Clear(reason) => {
            tracing::info!(path = %path, ?reason, ?source, "discarding session");
            outcome = state.guard.evaluate(&path, &SessionSnapshot::empty(), now);
            Some(reason)
        }
        SessionAction::Keep => None,
    };

    let mut response = match &outcome.decision {
        Decision::Redirect { to, .. } => {
            tracing::info!(from = %path, to = %to, "redirecting");
            redirect(to)
        }
        Decision::Render => {
            req.extensions_mut().insert(PageAccess { role: outcome.role });
            next.run(req).await
        }
    };

    if let Some(reason) = cleared {
        discard_session(response.headers_mut(), reason, source);
    }

    response
}

/// Session as presented by the request.
///
/// The first token that decodes wins, header bearer before cookie, and the
/// identity is taken from its claims. When none decodes, the first token
/// present still yields a session so the guard can discard it.
fn session_from_headers(state: &ShellState, headers: &HeaderMap) -> (SessionSnapshot, Option<TokenSource>) {
    let presented: Vec<(TokenSource, &str)> = [
        (TokenSource::Header, bearer_from_header(headers)),
        (TokenSource::Cookie, token_from_cookie(headers)),
    ]
    .into_iter()
    .filter_map(|(source, token)| token.map(|t| (source, t)))
    .collect();

    for &(source, token) in &presented {
        if let Ok(claims) = state.decoder.decode(token) {
            return (SessionSnapshot::new(Identity::from_claims(&claims), token), Some(source));
        }
    }

    match presented.first() {
        Some(&(source, token)) => {
            let unknown = Identity {
                id: String::new(),
                full_name: String::new(),
                email: String::new(),
                phone: None,
            };
            (SessionSnapshot::new(unknown, token), Some(source))
        }
        None => (SessionSnapshot::empty(), None),
    }
}

fn bearer_from_header(headers: &HeaderMap) -> Option<&str> {
    let token = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?
        .trim();

    (!token.is_empty()).then_some(token)
}

fn token_from_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

fn redirect(to: &str) -> Response {
    match HeaderValue::from_str(to) {
        Ok(location) => (StatusCode::SEE_OTHER, [(header::LOCATION, location)]).into_response(),
        Err(_) => crate::app::errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "invalid_redirect",
            "redirect target is not a valid header value",
        ),
    }
}

/// Only a cookie is ours to expire; a header token is the caller's to drop.
fn discard_session(headers: &mut HeaderMap, reason: ClearReason, source: Option<TokenSource>) {
    if source == Some(TokenSource::Cookie) {
        headers.append(
            header::SET_COOKIE,
            HeaderValue::from_static("campease_token=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax"),
        );
    }
    if reason == ClearReason::Expired {
        headers.insert(NOTICE_HEADER, HeaderValue::from_static("session-expired"));
    }
}
