use crate::Identity;

/// Read-only view of the client session handed to the guard.
///
/// The store that owns the session keeps `user` and `token` set or cleared
/// together; the guard still treats a half-populated snapshot as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user: Option<Identity>,
    pub token: Option<String>,
}

impl SessionSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(user: Identity, token: impl Into<String>) -> Self {
        Self {
            user: Some(user),
            token: Some(token.into()),
        }
    }

    pub fn is_present(&self) -> bool {
        self.user.is_some() && self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}
