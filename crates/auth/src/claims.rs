use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::Role;

/// Clock skew tolerated for `iat` before a token counts as not-yet-valid.
const IAT_LEEWAY_SECONDS: i64 = 60;

/// Decoded payload of a CampEase bearer token.
///
/// Only the claims the client acts on are modelled; anything else the issuer
/// adds is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the user id. Some issuers emit it as a number.
    #[serde(deserialize_with = "string_or_number")]
    pub sub: String,

    #[serde(deserialize_with = "role_any_case")]
    pub role: Role,

    /// Expiry, unix seconds. A fractional NumericDate is rounded up, so a
    /// token never counts as stale before the instant it names.
    #[serde(deserialize_with = "numeric_date_ceil")]
    pub exp: i64,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "optional_numeric_date_floor")]
    pub iat: Option<i64>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.iat.and_then(|iat| DateTime::from_timestamp(iat, 0))
    }

    /// A token whose expiry is at or before `now` is stale.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued in the future)")]
    NotYetValid,
}

/// Deterministically validate the time window of decoded claims.
///
/// Signature verification is the decoder's concern, not this function's.
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.is_expired(now) {
        return Err(TokenValidationError::Expired);
    }
    if let Some(issued_at) = claims.issued_at() {
        if issued_at > now + Duration::seconds(IAT_LEEWAY_SECONDS) {
            return Err(TokenValidationError::NotYetValid);
        }
    }
    Ok(())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// RFC 7519 NumericDate: integer or fractional seconds.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumericDate {
    Whole(i64),
    Fractional(f64),
}

impl NumericDate {
    fn seconds<E: serde::de::Error>(self, round: fn(f64) -> f64) -> Result<i64, E> {
        match self {
            NumericDate::Whole(n) => Ok(n),
            NumericDate::Fractional(f) if f.is_finite() => Ok(round(f) as i64),
            NumericDate::Fractional(f) => Err(E::custom(format!("invalid NumericDate {f}"))),
        }
    }
}

fn numeric_date_ceil<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    NumericDate::deserialize(deserializer)?.seconds(f64::ceil)
}

fn optional_numeric_date_floor<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumericDate>::deserialize(deserializer)?
        .map(|date| date.seconds(f64::floor))
        .transpose()
}

fn role_any_case<'de, D>(deserializer: D) -> Result<Role, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}
