//! Client session store.
//!
//! Owns the in-memory session (identity + bearer token) and its persisted
//! copy. Only this store mutates the session; the guard runner reads it and
//! asks for a logout when the token goes stale.
//!
//! Tier rules:
//! - `remember = true` persists to the durable tier and clears the ephemeral one
//! - `remember = false` persists to the ephemeral tier and clears the durable one
//! - rehydration reads the ephemeral tier first, then the durable tier, and
//!   adopts only a complete identity/token pair
//! - logout clears both tiers

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use campease_auth::{Identity, SessionSnapshot, TokenDecoder, TokenError};

use crate::http::{ApiClient, ApiError, BearerSource};
use crate::storage::{SessionStorage, StorageError, StorageTier, TOKEN_KEY, USER_KEY};

pub const LOGIN_PATH: &str = "/api/auth/login";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("login request failed: {0}")]
    Api(#[from] ApiError),

    #[error("login returned an unusable token: {0}")]
    Token(#[from] TokenError),

    #[error("session storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("stored identity is unreadable: {0}")]
    CorruptIdentity(String),

    #[error("no active session")]
    NoActiveSession,
}

#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    #[serde(skip)]
    pub remember: bool,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>, remember: bool) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            remember,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("remember", &self.remember)
            .finish()
    }
}

/// Login response; backends disagree on the token field's name.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(alias = "Token", alias = "accessToken", alias = "access_token")]
    token: String,
}

#[derive(Debug, Default)]
struct SessionState {
    snapshot: SessionSnapshot,
    tier: Option<StorageTier>,
}

#[derive(Clone)]
pub struct SessionStore {
    state: Arc<RwLock<SessionState>>,
    storage: Arc<dyn SessionStorage>,
    api: ApiClient,
    decoder: Arc<dyn TokenDecoder>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("signed_in", &self.snapshot().is_present())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>, api: ApiClient, decoder: Arc<dyn TokenDecoder>) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            storage,
            api,
            decoder,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.read(|s| s.snapshot.clone())
    }

    pub fn user(&self) -> Option<Identity> {
        self.read(|s| s.snapshot.user.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.read(|s| s.snapshot.token.clone())
    }

    /// Exchange credentials for a token and start a session.
    pub async fn login(&self, credentials: &Credentials) -> Result<Identity, SessionError> {
        let response: LoginResponse = self.api.post_json(LOGIN_PATH, credentials).await?;

        let claims = self.decoder.decode(&response.token)?;
        let identity = Identity::from_claims(&claims);

        self.adopt(identity.clone(), response.token, credentials.remember)?;
        tracing::info!(user_id = %identity.id, role = %claims.role, remember = credentials.remember, "logged in");
        Ok(identity)
    }

    /// Start a session from an identity/token pair obtained elsewhere.
    pub fn adopt(&self, identity: Identity, token: String, remember: bool) -> Result<(), SessionError> {
        let (tier, other) = if remember {
            (StorageTier::Durable, StorageTier::Ephemeral)
        } else {
            (StorageTier::Ephemeral, StorageTier::Durable)
        };

        self.persist(tier, &identity, &token)?;
        if let Err(err) = self.storage.clear(other) {
            tracing::warn!(tier = %other, error = %err, "failed to clear other session tier");
        }

        self.write(|s| {
            s.snapshot = SessionSnapshot::new(identity, token);
            s.tier = Some(tier);
        });
        Ok(())
    }

    /// Drop the session from memory and both storage tiers.
    ///
    /// Storage failures are logged; the in-memory session is always cleared.
    pub fn logout(&self) {
        self.write(|s| *s = SessionState::default());

        for tier in StorageTier::ALL {
            if let Err(err) = self.storage.clear(tier) {
                tracing::warn!(%tier, error = %err, "failed to clear persisted session");
            }
        }
        tracing::info!("logged out");
    }

    /// Replace the identity of the current session.
    pub fn set_user(&self, identity: Identity) -> Result<(), SessionError> {
        let (token, tier) = self.active()?;
        if let Some(tier) = tier {
            self.persist(tier, &identity, &token)?;
        }
        self.write(|s| s.snapshot.user = Some(identity));
        Ok(())
    }

    /// Replace the token of the current session (e.g. after a refresh).
    pub fn set_token(&self, token: String) -> Result<(), SessionError> {
        let (_, tier) = self.active()?;
        if let Some(tier) = tier {
            self.storage.set(tier, TOKEN_KEY, &token)?;
        }
        self.write(|s| s.snapshot.token = Some(token));
        Ok(())
    }

    /// Load a previously persisted session if none is held in memory.
    ///
    /// Returns whether a session was adopted.
    pub fn rehydrate(&self) -> bool {
        if self.snapshot().is_present() {
            return false;
        }

        for tier in StorageTier::ALL {
            match self.load(tier) {
                Ok(Some((identity, token))) => {
                    tracing::debug!(%tier, user_id = %identity.id, "rehydrated session");
                    self.write(|s| {
                        s.snapshot = SessionSnapshot::new(identity, token);
                        s.tier = Some(tier);
                    });
                    return true;
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(%tier, error = %err, "discarding unreadable persisted session");
                    if let Err(err) = self.storage.clear(tier) {
                        tracing::warn!(%tier, error = %err, "failed to clear unreadable persisted session");
                    }
                }
            }
        }
        false
    }

    fn load(&self, tier: StorageTier) -> Result<Option<(Identity, String)>, SessionError> {
        let user = self.storage.get(tier, USER_KEY)?;
        let token = self.storage.get(tier, TOKEN_KEY)?.filter(|t| !t.is_empty());

        match (user, token) {
            (Some(user), Some(token)) => {
                let identity = serde_json::from_str(&user)
                    .map_err(|e| SessionError::CorruptIdentity(e.to_string()))?;
                Ok(Some((identity, token)))
            }
            (None, None) => Ok(None),
            _ => {
                tracing::debug!(%tier, "discarding partial persisted session");
                self.storage.clear(tier)?;
                Ok(None)
            }
        }
    }

    fn persist(&self, tier: StorageTier, identity: &Identity, token: &str) -> Result<(), SessionError> {
        let user = serde_json::to_string(identity).map_err(|e| SessionError::CorruptIdentity(e.to_string()))?;
        self.storage.set(tier, USER_KEY, &user)?;
        self.storage.set(tier, TOKEN_KEY, token)?;
        Ok(())
    }

    fn active(&self) -> Result<(String, Option<StorageTier>), SessionError> {
        self.read(|s| {
            if s.snapshot.is_present() {
                s.snapshot.token.clone().map(|t| (t, s.tier))
            } else {
                None
            }
        })
        .ok_or(SessionError::NoActiveSession)
    }

    fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write(&self, f: impl FnOnce(&mut SessionState)) {
        f(&mut self.state.write().unwrap_or_else(PoisonError::into_inner))
    }
}

impl BearerSource for SessionStore {
    fn bearer(&self) -> Option<String> {
        self.token()
    }
}
