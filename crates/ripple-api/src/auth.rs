//! Credential issuance — password hashing and JWT minting.
//!
//! Verification lives in `ripple_common::auth` so the gateway can share it;
//! everything that *creates* credentials stays here.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use ripple_common::auth::Claims;
use serde::Serialize;
use uuid::Uuid;

/// Token pair returned on login/register.
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub token_type: String,
}

/// Hash a password using Argon2id.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against an Argon2id hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn generate_token(
    user_id: Uuid,
    username: &str,
    role: &str,
    secret: &str,
    ttl_secs: u64,
    token_type: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        role: role.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ttl_secs as i64)).timestamp(),
        token_type: token_type.to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Generate both access and refresh tokens.
pub fn generate_token_pair(
    user_id: Uuid,
    username: &str,
    role: &str,
    secret: &str,
    access_ttl: u64,
    refresh_ttl: u64,
) -> Result<TokenPair, jsonwebtoken::errors::Error> {
    Ok(TokenPair {
        access_token: generate_token(user_id, username, role, secret, access_ttl, "access")?,
        refresh_token: generate_token(user_id, username, role, secret, refresh_ttl, "refresh")?,
        expires_in: access_ttl,
        token_type: "Bearer".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_common::auth::validate_token;

    #[test]
    fn password_hash_round_trips() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).unwrap());
        assert!(!verify_password("wrong guess", &hash).unwrap());
    }

    #[test]
    fn token_pair_carries_identity_and_types() {
        let uid = Uuid::now_v7();
        let pair = generate_token_pair(uid, "alice", "user", "secret", 900, 3600).unwrap();

        let access = validate_token(&pair.access_token, "secret").unwrap();
        assert_eq!(access.sub, uid.to_string());
        assert_eq!(access.role, "user");
        assert_eq!(access.token_type, "access");

        let refresh = validate_token(&pair.refresh_token, "secret").unwrap();
        assert_eq!(refresh.token_type, "refresh");
        assert!(refresh.exp > access.exp);
    }
}
