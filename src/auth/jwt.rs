// src/auth/jwt.rs
// Bearer-token verification. Issuance belongs to the external auth
// collaborator (spec §1); this core only needs to resolve a token to a
// user id, so `create_token` exists solely to mint fixtures in tests.

use anyhow::{anyhow, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id, as a string per JWT convention
    pub exp: usize,
    pub iat: usize,
}

pub fn create_token(secret: &str, user_id: i64) -> Result<String> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now + chrono::Duration::days(365)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| anyhow!("failed to create token: {}", e))
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    decode::<Claims>(token, &key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| anyhow!("invalid token: {}", e))
}
