use crate::config::jwt::JwtConfig;
use anyhow::{anyhow, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static JWT_CONFIG: OnceLock<JwtConfig> = OnceLock::new();

/// Install the signing config. Called once at startup; a second call errors.
pub fn init_jwt_config(config: JwtConfig) -> Result<()> {
    JWT_CONFIG
        .set(config)
        .map_err(|_| anyhow!("JWT config already initialized"))
}

fn config() -> Result<&'static JwtConfig> {
    JWT_CONFIG
        .get()
        .ok_or_else(|| anyhow!("JWT config not initialized"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id as a decimal string.
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
    #[serde(rename = "token_type", default)]
    pub kind: Option<TokenKind>,
}

impl Claims {
    fn access(user_id: i32, issued_at: usize, ttl_secs: u64) -> Self {
        Self {
            sub: user_id.to_string(),
            exp: issued_at + ttl_secs as usize,
            iat: issued_at,
            kind: Some(TokenKind::Access),
        }
    }

    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

fn now() -> usize {
    chrono::Utc::now().timestamp().max(0) as usize
}

pub fn encode_access_token(user_id: i32) -> Result<String> {
    let config = config()?;
    let claims = Claims::access(user_id, now(), config.access_token_expiry);
    sign(&claims, config)
}

fn sign(claims: &Claims, config: &JwtConfig) -> Result<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| anyhow!("Failed to encode access token: {}", e))
}

pub fn decode_jwt(token: &str) -> Result<Claims> {
    let config = config()?;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| anyhow!("Failed to decode JWT: {}", e))
}

/// User id carried by a valid, unexpired access token.
pub fn verify_access_token(token: &str) -> Result<i32> {
    let claims = decode_jwt(token)?;
    if claims.kind != Some(TokenKind::Access) {
        return Err(anyhow!("not an access token"));
    }
    claims
        .user_id()
        .ok_or_else(|| anyhow!("token subject is not a user id"))
}

/// Access token lifetime in seconds, 0 before init.
pub fn access_token_ttl() -> u64 {
    config().map(|c| c.access_token_expiry).unwrap_or(0)
}
