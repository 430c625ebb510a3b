//! Password hashing and session tokens

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use thiserror::Error;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{Identity, Role, UserClaims},
};

/// Hash a password using Argon2.
///
/// Input that already is an argon2 PHC string is returned as is, so seeding
/// scripts may pass either plain or pre-hashed passwords.
pub fn hash_password(password: &str) -> AppResult<String> {
    if password.starts_with("$argon2") && PasswordHash::new(password).is_ok() {
        return Ok(password.to_string());
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Check a password against a stored hash. A malformed hash never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Why a presented token was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Invalid token signature")]
    InvalidSignature,
    #[error("Token has expired")]
    Expired,
    #[error("Malformed token")]
    Malformed,
}

/// Issues and validates HS256 session tokens
#[derive(Clone)]
pub struct TokenService {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
    lifetime_secs: i64,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        if config.jwt_secret.len() < 32 {
            tracing::warn!("JWT secret is shorter than recommended (32 bytes)");
        }

        Self {
            encoding_key: Arc::new(EncodingKey::from_secret(config.jwt_secret.as_bytes())),
            decoding_key: Arc::new(DecodingKey::from_secret(config.jwt_secret.as_bytes())),
            validation: Arc::new(Validation::new(Algorithm::HS256)),
            lifetime_secs: config.jwt_expiration_hours as i64 * 3600,
        }
    }

    /// Create a signed token for a user
    pub fn issue(&self, user_id: i32, role: Role) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: user_id.to_string(),
            role,
            iat: now,
            exp: now + self.lifetime_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Verify a token and resolve the caller identity
    pub fn validate(&self, token: &str) -> Result<Identity, TokenError> {
        let data = decode::<UserClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            }
        })?;

        let user_id = data.claims.sub.parse().map_err(|_| TokenError::Malformed)?;
        Ok(Identity {
            user_id,
            role: data.claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&AuthConfig {
            jwt_secret: secret.to_string(),
            jwt_expiration_hours: 24,
        })
    }

    fn sign(secret: &str, claims: &serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let first = hash_password("same").unwrap();
        let second = hash_password("same").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_hash_keeps_existing_hash() {
        let hash = hash_password("s3cret").unwrap();
        assert_eq!(hash_password(&hash).unwrap(), hash);
    }

    #[test]
    fn test_malformed_hash_does_not_verify() {
        assert!(!verify_password("s3cret", "not-a-hash"));
        assert!(!verify_password("s3cret", ""));
    }

    #[test]
    fn test_token_round_trip() {
        let tokens = service("unit-test-secret-that-is-long-enough");
        let token = tokens.issue(42, Role::Admin).unwrap();
        let identity = tokens.validate(&token).unwrap();
        assert_eq!(identity, Identity { user_id: 42, role: Role::Admin });
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let token = service("first-secret").issue(1, Role::Owner).unwrap();
        assert_eq!(
            service("second-secret").validate(&token),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let tokens = service("unit-test-secret");
        let user_token = tokens.issue(7, Role::User).unwrap();
        let owner_token = tokens.issue(7, Role::Owner).unwrap();

        let user_parts: Vec<&str> = user_token.split('.').collect();
        let owner_parts: Vec<&str> = owner_token.split('.').collect();
        let forged = format!("{}.{}.{}", user_parts[0], owner_parts[1], user_parts[2]);

        assert_eq!(tokens.validate(&forged), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let now = Utc::now().timestamp();
        let token = sign(
            "unit-test-secret",
            &serde_json::json!({ "sub": "1", "role": "user", "iat": now - 7200, "exp": now - 3600 }),
        );
        assert_eq!(service("unit-test-secret").validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_garbage_and_unknown_role_are_malformed() {
        let tokens = service("unit-test-secret");
        assert_eq!(tokens.validate("not-a-token"), Err(TokenError::Malformed));

        let now = Utc::now().timestamp();
        let token = sign(
            "unit-test-secret",
            &serde_json::json!({ "sub": "1", "role": "librarian", "iat": now, "exp": now + 60 }),
        );
        assert_eq!(tokens.validate(&token), Err(TokenError::Malformed));

        let token = sign(
            "unit-test-secret",
            &serde_json::json!({ "sub": "abc", "role": "user", "iat": now, "exp": now + 60 }),
        );
        assert_eq!(tokens.validate(&token), Err(TokenError::Malformed));
    }
}
