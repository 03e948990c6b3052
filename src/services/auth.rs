//! Session token issuing/verification and password hashing.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::db::enums::Role;
use crate::error::Result;

/// Session tokens expire 24 hours after issuance; the verifier enforces it.
const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct AuthService {
    secret: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Owning user id.
    pub sub: i32,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

impl AuthService {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    pub fn hash_password(&self, password: &str) -> Result<String> {
        Ok(bcrypt::hash(password, bcrypt::DEFAULT_COST)?)
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        Ok(bcrypt::verify(password, hash)?)
    }

    pub fn issue_token(&self, user_id: i32, role: Role) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            role: role.as_str().to_string(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
            iat: now.timestamp(),
        };

        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());
        Ok(encode(&Header::default(), &claims, &encoding_key)?)
    }

    /// Decode and validate a token. Expired and badly-signed tokens both come
    /// back as errors; callers treat them uniformly as invalid.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing() {
        let auth = AuthService::new("secret".to_string());
        let hash = auth.hash_password("my_secure_password").unwrap();

        assert!(auth.verify_password("my_secure_password", &hash).unwrap());
        assert!(!auth.verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_token_round_trip() {
        let auth = AuthService::new("secret".to_string());
        let token = auth.issue_token(42, Role::Artist).unwrap();

        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, "artist");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_tampered_token_rejected() {
        let auth = AuthService::new("secret".to_string());
        let other = AuthService::new("other-secret".to_string());

        let token = other.issue_token(1, Role::Listener).unwrap();
        assert!(auth.verify_token(&token).is_err());
    }
}
