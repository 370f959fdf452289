use anyhow::Context;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by a signed credential
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, email: String, ttl_hours: u64) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            email,
            exp: (now + Duration::hours(ttl_hours as i64)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Verified caller identity extracted from a credential
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
        }
    }
}

/// RS256 key pair, loaded once at startup. The signing key is used only when
/// issuing credentials; verification uses the public key.
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl AuthKeys {
    /// Read both PEM files. Any failure here is a startup error, not a
    /// per-request condition.
    pub fn load(signing_key_file: &str, verify_key_file: &str) -> anyhow::Result<Self> {
        let signing_pem = std::fs::read(signing_key_file)
            .with_context(|| format!("reading signing key {}", signing_key_file))?;
        let verify_pem = std::fs::read(verify_key_file)
            .with_context(|| format!("reading verification key {}", verify_key_file))?;
        Self::from_pem(&signing_pem, &verify_pem)
    }

    pub fn from_pem(signing_pem: &[u8], verify_pem: &[u8]) -> anyhow::Result<Self> {
        Ok(Self {
            encoding: EncodingKey::from_rsa_pem(signing_pem).context("parsing signing key PEM")?,
            decoding: DecodingKey::from_rsa_pem(verify_pem)
                .context("parsing verification key PEM")?,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credential: {0}")]
    InvalidCredential(String),
    #[error("credential signing failed: {0}")]
    Signing(String),
}

/// Issue a signed credential for a verified user.
pub fn generate_jwt(
    keys: &AuthKeys,
    user_id: Uuid,
    email: String,
    ttl_hours: u64,
) -> Result<String, AuthError> {
    let claims = Claims::new(user_id, email, ttl_hours);
    let header = Header::new(Algorithm::RS256);
    encode(&header, &claims, &keys.encoding).map_err(|e| AuthError::Signing(e.to_string()))
}

/// Verify a bearer credential and extract the caller identity.
///
/// An absent credential is not an error; public endpoints proceed without an
/// identity. A present but malformed or badly signed credential is rejected.
pub fn verify_credential(
    keys: &AuthKeys,
    raw: Option<&str>,
) -> Result<Option<Identity>, AuthError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let validation = Validation::new(Algorithm::RS256);
    let token_data = decode::<Claims>(raw, &keys.decoding, &validation)
        .map_err(|e| AuthError::InvalidCredential(e.to_string()))?;

    Ok(Some(Identity::from(token_data.claims)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGNING_PEM: &str = include_str!("../../tests/fixtures/signing_key.pem");
    const VERIFY_PEM: &str = include_str!("../../tests/fixtures/verify_key.pem");

    fn test_keys() -> AuthKeys {
        AuthKeys::from_pem(SIGNING_PEM.as_bytes(), VERIFY_PEM.as_bytes()).unwrap()
    }

    #[test]
    fn test_generate_and_verify_roundtrip() {
        let keys = test_keys();
        let user_id = Uuid::new_v4();
        let token = generate_jwt(&keys, user_id, "a@x.com".to_string(), 24).unwrap();

        let identity = verify_credential(&keys, Some(&token)).unwrap().unwrap();
        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.email, "a@x.com");
    }

    #[test]
    fn test_absent_credential_is_not_an_error() {
        let keys = test_keys();
        assert!(verify_credential(&keys, None).unwrap().is_none());
    }

    #[test]
    fn test_malformed_credential_is_rejected() {
        let keys = test_keys();
        assert!(verify_credential(&keys, Some("not-a-jwt")).is_err());
    }

    #[test]
    fn test_tampered_credential_is_rejected() {
        let keys = test_keys();
        let token = generate_jwt(&keys, Uuid::new_v4(), "a@x.com".to_string(), 24).unwrap();

        // Corrupt the signature segment
        let mut tampered = token.clone();
        let flipped = if tampered.ends_with('A') { 'B' } else { 'A' };
        tampered.pop();
        tampered.push(flipped);

        assert!(verify_credential(&keys, Some(&tampered)).is_err());
    }

    #[test]
    fn test_expired_credential_is_rejected() {
        let keys = test_keys();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            exp: (Utc::now() - Duration::hours(2)).timestamp(),
            iat: (Utc::now() - Duration::hours(3)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &keys.encoding,
        )
        .unwrap();

        assert!(verify_credential(&keys, Some(&token)).is_err());
    }
}
