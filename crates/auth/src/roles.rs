use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role carried in the bearer token's `role` claim.
///
/// The set is closed: a token naming any other role is treated as malformed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Parent,
    Staff,
    Admin,
    Camper,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Parent, Role::Staff, Role::Admin, Role::Camper];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Parent => "Parent",
            Role::Staff => "Staff",
            Role::Admin => "Admin",
            Role::Camper => "Camper",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Backends disagree on casing (`admin`, `Admin`, `ADMIN`), so parsing
    /// ignores it.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_any_casing() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("STAFF".parse::<Role>().unwrap(), Role::Staff);
        assert_eq!(" Parent ".parse::<Role>().unwrap(), Role::Parent);
    }

    #[test]
    fn rejects_unknown_role() {
        let err = "Counselor".parse::<Role>().unwrap_err();
        assert_eq!(err, UnknownRole("Counselor".to_string()));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
    }
}
