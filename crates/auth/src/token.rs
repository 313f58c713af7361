//! Bearer token decoding.
//!
//! The client reads claims without the signing key; the shell holds the HS256
//! secret and verifies. Neither decoder checks expiry: the guard does.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::TokenClaims;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is empty")]
    Empty,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token claims rejected: {0}")]
    Claims(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                TokenError::InvalidSignature
            }
            ErrorKind::Json(e) => TokenError::Claims(e.to_string()),
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

/// Decode a raw bearer token into claims.
pub trait TokenDecoder: Send + Sync {
    fn decode(&self, token: &str) -> Result<TokenClaims, TokenError>;
}

impl<T: TokenDecoder + ?Sized> TokenDecoder for std::sync::Arc<T> {
    fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        (**self).decode(token)
    }
}

/// Reads the claims segment without verifying the signature.
///
/// Suitable only where the signing key is not available (the client); the
/// API remains the authority on whether the token is genuine.
#[derive(Debug, Clone, Default)]
pub struct UnverifiedDecoder;

impl UnverifiedDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl TokenDecoder for UnverifiedDecoder {
    fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let token = non_empty(token)?;

        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
        Ok(data.claims)
    }
}

/// Verifies an HS256 signature with a shared secret.
#[derive(Clone)]
pub struct Hs256Decoder {
    key: DecodingKey,
}

impl Hs256Decoder {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
        }
    }
}

impl std::fmt::Debug for Hs256Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hs256Decoder").finish_non_exhaustive()
    }
}

impl TokenDecoder for Hs256Decoder {
    fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let token = non_empty(token)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.key, &validation)?;
        Ok(data.claims)
    }
}

/// Mints HS256 tokens (local development and tests).
#[derive(Clone)]
pub struct Hs256Encoder {
    key: EncodingKey,
}

impl Hs256Encoder {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_ref()),
        }
    }

    pub fn encode(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        Ok(jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.key)?)
    }
}

fn non_empty(token: &str) -> Result<&str, TokenError> {
    let token = token.trim();
    if token.is_empty() {
        Err(TokenError::Empty)
    } else {
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    fn claims() -> TokenClaims {
        TokenClaims {
            sub: "3".to_string(),
            role: Role::Staff,
            exp: 1_900_000_000,
            name: "Lee Park".to_string(),
            email: "lee@example.com".to_string(),
            phone: None,
            iat: Some(1_700_000_000),
        }
    }

    #[test]
    fn unverified_decoder_reads_claims_signed_with_any_key() {
        let token = Hs256Encoder::new("someone-elses-secret").encode(&claims()).unwrap();
        let decoded = UnverifiedDecoder::new().decode(&token).unwrap();
        assert_eq!(decoded, claims());
    }

    #[test]
    fn unverified_decoder_does_not_reject_expired_tokens() {
        let mut stale = claims();
        stale.exp = 1;
        let token = Hs256Encoder::new("k").encode(&stale).unwrap();
        assert_eq!(UnverifiedDecoder::new().decode(&token).unwrap().exp, 1);
    }

    #[test]
    fn hs256_decoder_verifies_signature() {
        let token = Hs256Encoder::new("right").encode(&claims()).unwrap();
        assert!(Hs256Decoder::new("right").decode(&token).is_ok());
        assert_eq!(
            Hs256Decoder::new("wrong").decode(&token),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let err = UnverifiedDecoder::new().decode("not-a-jwt").unwrap_err();
        assert!(matches!(err, TokenError::Malformed(_)), "{err:?}");
        assert_eq!(UnverifiedDecoder::new().decode("  "), Err(TokenError::Empty));
    }

    #[test]
    fn unknown_role_is_a_claims_error() {
        let mut value = serde_json::to_value(claims()).unwrap();
        value["role"] = serde_json::json!("Counselor");
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &value,
            &EncodingKey::from_secret(b"k"),
        )
        .unwrap();

        let err = UnverifiedDecoder::new().decode(&token).unwrap_err();
        assert!(matches!(err, TokenError::Claims(_)), "{err:?}");
    }
}
