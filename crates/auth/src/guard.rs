//! Route guard: decides, for one navigation, whether the current path may
//! render for the current session.
//!
//! Evaluation is a single synchronous pass with no side effects. The caller
//! applies the outcome: clearing the session, surfacing the notice, and
//! performing the redirect.
//!
//! Failure classes never surface as errors:
//! - no session: render if public, otherwise redirect to login
//! - expired token: clear the session and warn
//! - malformed token: clear the session silently
//! - path not allowed for the role: redirect to the forbidden page, session kept

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Role, RoutePolicy, SessionSnapshot, TokenDecoder};

/// Where a session stands relative to the path being visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessState {
    Unauthenticated,
    AuthenticatedAuthorized,
    AuthenticatedUnauthorized,
    /// The credential was stale or unreadable; the session must be dropped
    /// and the path re-evaluated as unauthenticated.
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    Render,
    /// `replace` means the blocked page must not stay in history.
    Redirect { to: String, replace: bool },
}

impl Decision {
    fn replace_with(to: &str) -> Self {
        Decision::Redirect {
            to: to.to_string(),
            replace: true,
        }
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Decision::Render => None,
            Decision::Redirect { to, .. } => Some(to),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearReason {
    Expired,
    Malformed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "reason", rename_all = "snake_case")]
pub enum SessionAction {
    Keep,
    Clear(ClearReason),
}

/// User-visible transient message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    SessionExpired,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::SessionExpired => "Your session has expired. Please log in again.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardOutcome {
    pub state: AccessState,
    pub decision: Decision,
    pub session: SessionAction,
    pub notice: Option<Notice>,
    /// Role read from the token when the session is valid.
    pub role: Option<Role>,
}

impl GuardOutcome {
    fn unauthenticated(decision: Decision) -> Self {
        Self {
            state: AccessState::Unauthenticated,
            decision,
            session: SessionAction::Keep,
            notice: None,
            role: None,
        }
    }

    fn cleared(reason: ClearReason) -> Self {
        Self {
            state: AccessState::Expired,
            decision: Decision::Render,
            session: SessionAction::Clear(reason),
            notice: match reason {
                ClearReason::Expired => Some(Notice::SessionExpired),
                ClearReason::Malformed => None,
            },
            role: None,
        }
    }

    fn authenticated(role: Role, state: AccessState, decision: Decision) -> Self {
        Self {
            state,
            decision,
            session: SessionAction::Keep,
            notice: None,
            role: Some(role),
        }
    }

    pub fn is_render(&self) -> bool {
        self.decision == Decision::Render
    }

    pub fn clears_session(&self) -> bool {
        matches!(self.session, SessionAction::Clear(_))
    }
}

/// Route guard over an injected policy and token decoder.
#[derive(Clone)]
pub struct RouteGuard {
    policy: Arc<RoutePolicy>,
    decoder: Arc<dyn TokenDecoder>,
}

impl std::fmt::Debug for RouteGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteGuard")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RouteGuard {
    pub fn new(policy: Arc<RoutePolicy>, decoder: Arc<dyn TokenDecoder>) -> Self {
        Self { policy, decoder }
    }

    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    /// Evaluate one guard cycle for `path`.
    ///
    /// When the outcome clears the session, nothing else has been decided;
    /// the caller re-evaluates with the emptied session to get the redirect.
    pub fn evaluate(&self, path: &str, session: &SessionSnapshot, now: DateTime<Utc>) -> GuardOutcome {
        let policy = &*self.policy;

        let token = match (&session.user, session.token.as_deref()) {
            (Some(_), Some(token)) if !token.is_empty() => token,
            _ => return self.evaluate_anonymous(path),
        };

        let claims = match self.decoder.decode(token) {
            Ok(claims) => claims,
            Err(err) => {
                tracing::warn!(path, error = %err, "discarding session with unreadable token");
                return GuardOutcome::cleared(ClearReason::Malformed);
            }
        };

        if claims.is_expired(now) {
            tracing::warn!(path, exp = claims.exp, "session expired");
            return GuardOutcome::cleared(ClearReason::Expired);
        }

        let role = claims.role;

        if path == policy.root_path() {
            let landing = policy.landing_for(role);
            tracing::debug!(path, %role, landing, "redirecting to landing path");
            return GuardOutcome::authenticated(
                role,
                AccessState::AuthenticatedAuthorized,
                Decision::replace_with(landing),
            );
        }

        if policy.is_allowed(role, path) {
            tracing::debug!(path, %role, "access granted");
            GuardOutcome::authenticated(role, AccessState::AuthenticatedAuthorized, Decision::Render)
        } else {
            tracing::debug!(path, %role, "access denied");
            GuardOutcome::authenticated(
                role,
                AccessState::AuthenticatedUnauthorized,
                Decision::replace_with(policy.forbidden_path()),
            )
        }
    }

    fn evaluate_anonymous(&self, path: &str) -> GuardOutcome {
        if self.policy.is_public(path) {
            GuardOutcome::unauthenticated(Decision::Render)
        } else {
            tracing::debug!(path, "no session; redirecting to login");
            GuardOutcome::unauthenticated(Decision::replace_with(self.policy.login_path()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Hs256Encoder, Identity, TokenClaims, UnverifiedDecoder};
    use chrono::Duration;
    use proptest::prelude::*;

    fn guard() -> RouteGuard {
        RouteGuard::new(Arc::new(RoutePolicy::campease()), Arc::new(UnverifiedDecoder::new()))
    }

    fn session(role: Role, exp: DateTime<Utc>) -> SessionSnapshot {
        let claims = TokenClaims {
            sub: "11".to_string(),
            role,
            exp: exp.timestamp(),
            name: "Robin Hale".to_string(),
            email: "robin@example.com".to_string(),
            phone: None,
            iat: None,
        };
        let token = Hs256Encoder::new("test-secret").encode(&claims).unwrap();
        SessionSnapshot::new(Identity::from_claims(&claims), token)
    }

    fn redirect(to: &str) -> Decision {
        Decision::Redirect {
            to: to.to_string(),
            replace: true,
        }
    }

    #[test]
    fn fractional_expiry_keeps_live_session() {
        let now = Utc::now();
        let payload = serde_json::json!({
            "sub": "11",
            "role": "Parent",
            "exp": now.timestamp() as f64 + 3600.5,
            "name": "Robin Hale",
        });
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &payload,
            &jsonwebtoken::EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        let user = Identity {
            id: "11".to_string(),
            full_name: "Robin Hale".to_string(),
            email: String::new(),
            phone: None,
        };

        let outcome = guard().evaluate("/parent/dashboard", &SessionSnapshot::new(user, token), now);

        assert_eq!(outcome.state, AccessState::AuthenticatedAuthorized);
        assert_eq!(outcome.session, SessionAction::Keep);
        assert!(outcome.is_render());
    }

    #[test]
    fn scenario_a_login_page_renders_without_session() {
        let outcome = guard().evaluate("/Login", &SessionSnapshot::empty(), Utc::now());
        assert_eq!(outcome.state, AccessState::Unauthenticated);
        assert_eq!(outcome.decision, Decision::Render);
    }

    #[test]
    fn scenario_b_protected_page_requires_login() {
        let outcome = guard().evaluate("/dashboard", &SessionSnapshot::empty(), Utc::now());
        assert_eq!(outcome.decision, redirect("/Login"));
        assert_eq!(outcome.session, SessionAction::Keep);
    }

    #[test]
    fn scenario_c_admin_at_root_lands_on_dashboard() {
        let now = Utc::now();
        let outcome = guard().evaluate("/", &session(Role::Admin, now + Duration::hours(1)), now);
        assert_eq!(outcome.decision, redirect("/admin/dashboard"));
        assert_eq!(outcome.role, Some(Role::Admin));
    }

    #[test]
    fn scenario_d_parent_is_forbidden_from_staff_orders() {
        let now = Utc::now();
        let outcome = guard().evaluate("/staff/orders", &session(Role::Parent, now + Duration::hours(1)), now);
        assert_eq!(outcome.state, AccessState::AuthenticatedUnauthorized);
        assert_eq!(outcome.decision, redirect("/403"));
        assert_eq!(outcome.session, SessionAction::Keep);
    }

    #[test]
    fn scenario_e_expired_token_clears_session_with_notice() {
        let now = Utc::now();
        let outcome = guard().evaluate("/parent/dashboard", &session(Role::Parent, now - Duration::minutes(5)), now);
        assert_eq!(outcome.state, AccessState::Expired);
        assert_eq!(outcome.session, SessionAction::Clear(ClearReason::Expired));
        assert_eq!(outcome.notice, Some(Notice::SessionExpired));
        assert_eq!(outcome.role, None);

        // Next cycle, with the session gone.
        let next = guard().evaluate("/parent/dashboard", &SessionSnapshot::empty(), now);
        assert_eq!(next.decision, redirect("/Login"));
    }

    #[test]
    fn expiry_at_exactly_now_counts_as_expired() {
        let now = Utc::now();
        let outcome = guard().evaluate("/camps", &session(Role::Camper, now), now);
        assert!(outcome.clears_session());
    }

    #[test]
    fn malformed_token_is_cleared_without_notice() {
        let identity = Identity {
            id: "1".to_string(),
            full_name: "X".to_string(),
            email: "x@example.com".to_string(),
            phone: None,
        };
        let outcome = guard().evaluate("/camps", &SessionSnapshot::new(identity, "garbage"), Utc::now());
        assert_eq!(outcome.session, SessionAction::Clear(ClearReason::Malformed));
        assert_eq!(outcome.notice, None);
        assert_eq!(outcome.decision, Decision::Render);
    }

    #[test]
    fn token_without_user_is_treated_as_no_session() {
        let now = Utc::now();
        let mut snapshot = session(Role::Admin, now + Duration::hours(1));
        snapshot.user = None;
        let outcome = guard().evaluate("/admin/dashboard", &snapshot, now);
        assert_eq!(outcome.decision, redirect("/Login"));
    }

    #[test]
    fn authenticated_user_may_visit_public_pages() {
        let now = Utc::now();
        let outcome = guard().evaluate("/Register", &session(Role::Staff, now + Duration::hours(1)), now);
        assert_eq!(outcome.decision, Decision::Render);
        assert_eq!(outcome.state, AccessState::AuthenticatedAuthorized);
    }

    #[test]
    fn parameterized_entries_accept_numeric_ids_only() {
        let now = Utc::now();
        let s = session(Role::Staff, now + Duration::hours(1));
        assert!(guard().evaluate("/staff/orders/482", &s, now).is_render());
        assert_eq!(guard().evaluate("/staff/orders/abc", &s, now).decision, redirect("/403"));
    }

    #[test]
    fn evaluation_is_idempotent() {
        let now = Utc::now();
        let g = guard();
        let s = session(Role::Parent, now + Duration::hours(1));
        for path in ["/", "/camps/3", "/admin/users", "/Login"] {
            assert_eq!(g.evaluate(path, &s, now), g.evaluate(path, &s, now));
        }
    }

    fn concrete(pattern: &crate::RoutePattern, id: u32) -> String {
        let mut path = pattern.as_str().to_string();
        for name in pattern.placeholders() {
            path = path.replace(&format!(":{name}"), &id.to_string());
        }
        path
    }

    proptest! {
        #[test]
        fn every_allow_listed_path_renders(role_idx in 0usize..4, id in 0u32..100_000) {
            let role = Role::ALL[role_idx];
            let now = Utc::now();
            let g = guard();
            let s = session(role, now + Duration::hours(1));
            for pattern in g.policy().allow_list(role) {
                let path = concrete(pattern, id);
                let outcome = g.evaluate(&path, &s, now);
                prop_assert_eq!(outcome.decision, Decision::Render, "{} as {}", path, role);
            }
        }

        #[test]
        fn paths_outside_allow_list_are_forbidden(role_idx in 0usize..4, other_idx in 0usize..4, id in 0u32..100_000) {
            let role = Role::ALL[role_idx];
            let other = Role::ALL[other_idx];
            let now = Utc::now();
            let g = guard();
            let s = session(role, now + Duration::hours(1));
            for pattern in g.policy().allow_list(other) {
                let path = concrete(pattern, id);
                if g.policy().is_allowed(role, &path) || path == "/" {
                    continue;
                }
                prop_assert_eq!(g.evaluate(&path, &s, now).decision, redirect("/403"));
            }
        }

        #[test]
        fn stale_tokens_never_authorize(role_idx in 0usize..4, secs_ago in 0i64..1_000_000) {
            let role = Role::ALL[role_idx];
            let now = Utc::now();
            let g = guard();
            let s = session(role, now - Duration::seconds(secs_ago));
            let landing = g.policy().landing_for(role).to_string();
            let outcome = g.evaluate(&landing, &s, now);
            prop_assert!(outcome.clears_session());
            prop_assert_eq!(outcome.role, None);
        }
    }
}
