/**
 * Bearer Token Verification
 *
 * The identity provider signs HS256 tokens with a secret shared through
 * the `JWT_SECRET` environment variable. Claims carry the stable external
 * identity id (`sub`) plus the profile fields used for auto-provisioning.
 */

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Claims carried by an identity-provider token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Stable external identity id
    pub sub: String,
    /// Email address
    pub email: String,
    /// Display name (optional)
    #[serde(default)]
    pub name: Option<String>,
    /// Avatar URL (optional)
    #[serde(default)]
    pub picture: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

/// Verify and decode a bearer token
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let key = DecodingKey::from_secret(secret.as_ref());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &key, &validation)?;
    Ok(token_data.claims)
}

/// Issue a token the way the identity provider would
///
/// Used by tests and local tooling; the production provider signs with
/// the same shared secret.
pub fn create_token(
    external_id: &str,
    email: &str,
    name: Option<&str>,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let claims = Claims {
        sub: external_id.to_string(),
        email: email.to_string(),
        name: name.map(|s| s.to_string()),
        picture: None,
        exp: now + 24 * 60 * 60,
        iat: now,
    };

    let key = EncodingKey::from_secret(secret.as_ref());
    encode(&Header::default(), &claims, &key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_create_and_verify_token() {
        let token = create_token("ext-123", "test@example.com", Some("Test"), SECRET).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "ext-123");
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.name.as_deref(), Some("Test"));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = create_token("ext-123", "test@example.com", None, SECRET).unwrap();
        assert!(verify_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(verify_token("not-a-token", SECRET).is_err());
    }
}
