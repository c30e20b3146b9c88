use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub sub_domain: Option<String>,
    pub token_use: TokenUse,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    fn new(
        sub: Uuid,
        email: String,
        role: String,
        sub_domain: Option<String>,
        token_use: TokenUse,
        lifetime: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub,
            email,
            role,
            sub_domain,
            token_use,
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,
}

fn secret() -> Result<&'static [u8], JwtError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }
    Ok(secret.as_bytes())
}

pub fn issue_access_token(
    sub: Uuid,
    email: &str,
    role: &str,
    sub_domain: Option<&str>,
) -> Result<String, JwtError> {
    let mins = config::config().security.access_token_expiry_mins;
    let claims = Claims::new(
        sub,
        email.to_string(),
        role.to_string(),
        sub_domain.map(str::to_string),
        TokenUse::Access,
        Duration::minutes(mins),
    );
    sign(&claims)
}

pub fn issue_refresh_token(
    sub: Uuid,
    email: &str,
    role: &str,
    sub_domain: Option<&str>,
) -> Result<String, JwtError> {
    let hours = config::config().security.refresh_token_expiry_hours;
    let claims = Claims::new(
        sub,
        email.to_string(),
        role.to_string(),
        sub_domain.map(str::to_string),
        TokenUse::Refresh,
        Duration::hours(hours),
    );
    sign(&claims)
}

fn sign(claims: &Claims) -> Result<String, JwtError> {
    let key = EncodingKey::from_secret(secret()?);
    encode(&Header::default(), claims, &key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn verify_token(token: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret()?);
    decode::<Claims>(token, &key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
}

/// Salted sha256 digest in `salt$hex` form.
pub fn hash_password(plaintext: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{salt}${}", digest(&salt, plaintext))
}

pub fn verify_password(plaintext: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, expected)) => digest(salt, plaintext) == expected,
        None => false,
    }
}

fn digest(salt: &str, plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(plaintext.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_roundtrip() {
        let stored = hash_password("hunter2");
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
    }

    #[test]
    fn distinct_salts_produce_distinct_digests() {
        assert_ne!(hash_password("hunter2"), hash_password("hunter2"));
    }

    #[test]
    fn malformed_digest_never_verifies() {
        assert!(!verify_password("hunter2", "no-dollar-sign"));
    }

    #[test]
    fn token_roundtrip_carries_claims() {
        // Development config carries a non-empty default secret
        let id = Uuid::new_v4();
        let token =
            issue_access_token(id, "school@eduvia.space", "school", Some("gamersclub"))
                .expect("issue");
        let claims = verify_token(&token).expect("verify");
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, "school");
        assert_eq!(claims.token_use, TokenUse::Access);
        assert_eq!(claims.sub_domain.as_deref(), Some("gamersclub"));
    }
}
