//! Shared JWT authentication utilities.
//!
//! Claims and token validation live here so both ripple-api and ripple-gateway
//! can use them without circular dependencies. Password hashing and token
//! generation stay in ripple-api since they're API-specific.

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

/// JWT claims embedded in access and refresh tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as string)
    pub sub: String,
    /// Username
    pub username: String,
    /// Role ("user" or "admin")
    pub role: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// Token type ("access" or "refresh")
    pub token_type: String,
}

/// Validate and decode a JWT token.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn make_token(exp_offset_secs: i64, secret: &str) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: uuid::Uuid::nil().to_string(),
            username: "alice".into(),
            role: "user".into(),
            iat: now,
            exp: now + exp_offset_secs,
            token_type: "access".into(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_round_trips() {
        let token = make_token(600, "test-secret");
        let claims = validate_token(&token, "test-secret").unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, "user");
        assert_eq!(claims.token_type, "access");
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = make_token(-600, "test-secret");
        assert!(validate_token(&token, "test-secret").is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = make_token(600, "test-secret");
        assert!(validate_token(&token, "other-secret").is_err());
    }
}
