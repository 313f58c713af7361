use serde::{Deserialize, Serialize};

use crate::TokenClaims;

/// Identity of the signed-in user, as shown by the client.
///
/// Stored under the `user` key as JSON, so the field names follow the
/// client's camelCase convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Identity {
    /// Derive the identity fields from decoded token claims.
    pub fn from_claims(claims: &TokenClaims) -> Self {
        Self {
            id: claims.sub.clone(),
            full_name: claims.name.clone(),
            email: claims.email.clone(),
            phone: claims.phone.clone(),
        }
    }
}
