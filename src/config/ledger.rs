use std::{env, sync::OnceLock};

const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

/// Tuning for the like ledger's toggle transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Upper bound on how long a toggle waits for the target row lock.
    /// Exceeding it surfaces as a transient error instead of blocking.
    pub lock_timeout_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Self {
        let lock_timeout_ms = match env::var("LIKE_LOCK_TIMEOUT_MS") {
            Ok(raw) => parse_lock_timeout(&raw).unwrap_or_else(|| {
                tracing::warn!(
                    "Invalid LIKE_LOCK_TIMEOUT_MS '{}', using {}ms",
                    raw,
                    DEFAULT_LOCK_TIMEOUT_MS
                );
                DEFAULT_LOCK_TIMEOUT_MS
            }),
            Err(_) => DEFAULT_LOCK_TIMEOUT_MS,
        };

        Self { lock_timeout_ms }
    }

    /// Process-wide config, read once.
    pub fn global() -> Self {
        static CONFIG: OnceLock<LedgerConfig> = OnceLock::new();
        *CONFIG.get_or_init(LedgerConfig::from_env)
    }
}

// 0 would disable the timeout in Postgres, which reintroduces unbounded waits.
fn parse_lock_timeout(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|ms| *ms > 0)
}
