//! Wires the route guard to the session store, navigation and notices.
//!
//! Call [`GuardRunner::run`] on startup and after every change of path or
//! session. Each run is independent; authorization granted by an earlier run
//! is never assumed.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};

use campease_auth::{Decision, GuardOutcome, RouteGuard, SessionAction};

use crate::navigation::{Navigator, Notifier};
use crate::session::SessionStore;

/// Inputs and decision of the last run, to suppress repeated redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LastRun {
    path: String,
    token: Option<String>,
    decision: Decision,
}

pub struct GuardRunner<N, M> {
    guard: RouteGuard,
    store: SessionStore,
    navigator: N,
    notifier: M,
    last: Mutex<Option<LastRun>>,
}

impl<N: Navigator, M: Notifier> GuardRunner<N, M> {
    pub fn new(guard: RouteGuard, store: SessionStore, navigator: N, notifier: M) -> Self {
        Self {
            guard,
            store,
            navigator,
            notifier,
            last: Mutex::new(None),
        }
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn notifier(&self) -> &M {
        &self.notifier
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn run_now(&self, path: &str) -> GuardOutcome {
        self.run(path, Utc::now())
    }

    /// Evaluate `path` and apply the outcome.
    ///
    /// A stale or unreadable token is logged out and the path re-evaluated
    /// as unauthenticated, so the returned outcome carries both the session
    /// action and the resulting redirect.
    pub fn run(&self, path: &str, now: DateTime<Utc>) -> GuardOutcome {
        if !self.store.snapshot().is_present() {
            self.store.rehydrate();
        }

        let mut snapshot = self.store.snapshot();
        let mut outcome = self.guard.evaluate(path, &snapshot, now);

        if let SessionAction::Clear(reason) = outcome.session {
            tracing::info!(path, ?reason, "clearing session");
            self.store.logout();
            if let Some(notice) = outcome.notice {
                self.notifier.warn(notice.message());
            }

            snapshot = self.store.snapshot();
            let next = self.guard.evaluate(path, &snapshot, now);
            outcome = GuardOutcome {
                session: outcome.session,
                notice: outcome.notice,
                ..next
            };
        }

        let current = LastRun {
            path: path.to_string(),
            token: snapshot.token,
            decision: outcome.decision.clone(),
        };

        let repeated = {
            let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
            let repeated = last.as_ref() == Some(&current);
            *last = Some(current);
            repeated
        };

        if let Decision::Redirect { to, replace } = &outcome.decision {
            if repeated {
                tracing::debug!(path, to = %to, "redirect already issued");
            } else {
                tracing::info!(from = path, to = %to, "redirecting");
                self.navigator.navigate(to, *replace);
            }
        }

        outcome
    }
}
