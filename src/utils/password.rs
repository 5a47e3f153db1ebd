use anyhow::{Context, Result};
use std::{env, sync::OnceLock};

fn bcrypt_cost() -> u32 {
    static COST: OnceLock<u32> = OnceLock::new();
    *COST.get_or_init(|| {
        env::var("BCRYPT_COST")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|cost| (4..=31).contains(cost))
            .unwrap_or(bcrypt::DEFAULT_COST)
    })
}

/// Hash a password with bcrypt. Cost comes from `BCRYPT_COST` (4-31).
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt_cost()).context("Failed to hash password")
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).context("Failed to verify password")
}
