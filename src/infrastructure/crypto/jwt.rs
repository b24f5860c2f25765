//! HS256 bearer tokens.
//!
//! Tokens only identify the user. Roles are never embedded: the auth
//! middleware reloads them on every request, so revoking `super_admin`
//! takes effect on the holder's next call.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Signing parameters, built from the `[security]` config section.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
    pub issuer: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiration_hours", &self.expiration_hours)
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl JwtConfig {
    /// Token lifetime in seconds, as reported to clients in `expires_in`.
    pub fn lifetime_secs(&self) -> i64 {
        self.expiration_hours * 3600
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;
        validation
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Email at issue time; informational only
    pub email: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

pub fn create_token(user_id: &str, email: &str, config: &JwtConfig) -> Result<String, TokenError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp: (now + Duration::hours(config.expiration_hours)).timestamp(),
        iat: now.timestamp(),
        iss: config.issuer.clone(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))
}

pub fn verify_token(token: &str, config: &JwtConfig) -> Result<Claims, TokenError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &config.validation(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid(e.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".into(),
            expiration_hours: 1,
            issuer: "user-directory".into(),
        }
    }

    #[test]
    fn issued_token_verifies_to_same_subject() {
        let config = config();
        let token = create_token("user-123", "ann@example.com", &config).unwrap();

        let claims = verify_token(&token, &config).unwrap();
        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.email, "ann@example.com");
        assert_eq!(claims.exp - claims.iat, config.lifetime_secs());
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let config = JwtConfig {
            expiration_hours: -1,
            ..config()
        };
        let token = create_token("user-123", "ann@example.com", &config).unwrap();
        assert!(matches!(verify_token(&token, &config), Err(TokenError::Expired)));
    }

    #[test]
    fn foreign_issuer_or_secret_is_invalid() {
        let token = create_token("user-123", "ann@example.com", &config()).unwrap();

        let other_issuer = JwtConfig {
            issuer: "someone-else".into(),
            ..config()
        };
        assert!(matches!(
            verify_token(&token, &other_issuer),
            Err(TokenError::Invalid(_))
        ));

        let other_secret = JwtConfig {
            secret: "other".into(),
            ..config()
        };
        assert!(matches!(
            verify_token(&token, &other_secret),
            Err(TokenError::Invalid(_))
        ));
        assert!(matches!(
            verify_token("garbage", &config()),
            Err(TokenError::Invalid(_))
        ));
    }
}
