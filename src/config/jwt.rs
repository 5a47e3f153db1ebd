use super::env::env_or;
use anyhow::Result;

const MIN_SECRET_LEN: usize = 32;
const DEFAULT_ACCESS_EXPIRY_SECS: u64 = 86400;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Access token lifetime in seconds; also the auth cookie's Max-Age.
    pub access_token_expiry: u64,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable must be set"))?;
        check_secret(&secret)?;

        Ok(Self {
            secret,
            access_token_expiry: env_or("JWT_ACCESS_EXPIRATION", DEFAULT_ACCESS_EXPIRY_SECS),
        })
    }
}

fn check_secret(secret: &str) -> Result<()> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(anyhow::anyhow!(
            "JWT_SECRET must be at least {} characters",
            MIN_SECRET_LEN
        ));
    }
    Ok(())
}
