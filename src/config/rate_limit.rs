use super::env::env_flag;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub per_second: u64,
    pub burst_size: u32,
}

impl RateLimitRule {
    const fn new(per_second: u64, burst_size: u32) -> Self {
        Self {
            per_second,
            burst_size,
        }
    }
}

/// Route groups that carry their own governor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitGroup {
    Auth,
    PublicRead,
    Protected,
    /// Like/vote toggles, limited separately from other writes.
    Likes,
}

impl RateLimitGroup {
    const ALL: [RateLimitGroup; 4] = [
        RateLimitGroup::Auth,
        RateLimitGroup::PublicRead,
        RateLimitGroup::Protected,
        RateLimitGroup::Likes,
    ];

    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "auth" => Some(Self::Auth),
            "public" | "public_read" | "public-read" => Some(Self::PublicRead),
            "protected" => Some(Self::Protected),
            "likes" | "like" => Some(Self::Likes),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub auth: RateLimitRule,
    pub public_read: RateLimitRule,
    pub protected: RateLimitRule,
    pub likes: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth: RateLimitRule::new(5, 10),
            public_read: RateLimitRule::new(30, 60),
            protected: RateLimitRule::new(10, 20),
            likes: RateLimitRule::new(5, 30),
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.enabled = env_flag("RATE_LIMIT_ENABLED", cfg.enabled);

        if let Ok(raw) = env::var("RATE_LIMIT_CONFIG") {
            match parse_rate_limit_config(&raw) {
                Ok(overrides) => {
                    for (group, rule) in overrides {
                        *cfg.rule_mut(group) = rule;
                    }
                }
                Err(err) => {
                    tracing::warn!("Invalid RATE_LIMIT_CONFIG '{}': {}", raw, err);
                }
            }
        }

        cfg
    }

    pub fn rule(&self, group: RateLimitGroup) -> RateLimitRule {
        match group {
            RateLimitGroup::Auth => self.auth,
            RateLimitGroup::PublicRead => self.public_read,
            RateLimitGroup::Protected => self.protected,
            RateLimitGroup::Likes => self.likes,
        }
    }

    fn rule_mut(&mut self, group: RateLimitGroup) -> &mut RateLimitRule {
        match group {
            RateLimitGroup::Auth => &mut self.auth,
            RateLimitGroup::PublicRead => &mut self.public_read,
            RateLimitGroup::Protected => &mut self.protected,
            RateLimitGroup::Likes => &mut self.likes,
        }
    }
}

/// Either `per:burst` for every group, or `group=per:burst,...`.
/// Later entries override earlier ones.
fn parse_rate_limit_config(raw: &str) -> Result<Vec<(RateLimitGroup, RateLimitRule)>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("empty value".to_string());
    }

    if !trimmed.contains('=') {
        let rule = parse_rule(trimmed)?;
        return Ok(RateLimitGroup::ALL.iter().map(|g| (*g, rule)).collect());
    }

    let mut overrides = Vec::new();
    for item in trimmed.split(',').map(str::trim).filter(|i| !i.is_empty()) {
        let (name, raw_rule) = item
            .split_once('=')
            .ok_or_else(|| format!("invalid item '{}', expected name=per:burst", item))?;
        let group = RateLimitGroup::parse(name.trim()).ok_or_else(|| {
            format!(
                "unknown group '{}', expected auth/public/protected/likes",
                name.trim()
            )
        })?;
        overrides.push((group, parse_rule(raw_rule.trim())?));
    }

    Ok(overrides)
}

fn parse_rule(raw: &str) -> Result<RateLimitRule, String> {
    let (per_second_raw, burst_raw) = raw
        .split_once(':')
        .ok_or_else(|| format!("invalid rule '{}', expected per:burst", raw))?;

    let per_second: u64 = per_second_raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid per_second '{}'", per_second_raw.trim()))?;
    let burst_size: u32 = burst_raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid burst_size '{}'", burst_raw.trim()))?;

    if per_second == 0 || burst_size == 0 {
        return Err("per_second and burst_size must be > 0".to_string());
    }

    Ok(RateLimitRule::new(per_second, burst_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_rule_applies_to_every_group() {
        let overrides = parse_rate_limit_config("12:24").unwrap();
        assert_eq!(overrides.len(), RateLimitGroup::ALL.len());
        assert!(overrides
            .iter()
            .all(|(_, rule)| *rule == RateLimitRule::new(12, 24)));
    }

    #[test]
    fn grouped_rules_include_likes() {
        let overrides = parse_rate_limit_config("auth=1:2, likes=3:4").unwrap();
        assert_eq!(
            overrides,
            vec![
                (RateLimitGroup::Auth, RateLimitRule::new(1, 2)),
                (RateLimitGroup::Likes, RateLimitRule::new(3, 4)),
            ]
        );
    }

    #[test]
    fn group_aliases() {
        assert_eq!(
            RateLimitGroup::parse("public-read"),
            Some(RateLimitGroup::PublicRead)
        );
        assert_eq!(RateLimitGroup::parse("LIKE"), Some(RateLimitGroup::Likes));
        assert_eq!(RateLimitGroup::parse("votes"), None);
    }

    #[test]
    fn rejects_bad_rules() {
        assert!(parse_rate_limit_config("auth=abc")
            .unwrap_err()
            .contains("invalid rule"));
        assert!(parse_rate_limit_config("likes=0:5").is_err());
        assert!(parse_rate_limit_config("widgets=1:1")
            .unwrap_err()
            .contains("unknown group"));
    }

    #[test]
    fn default_likes_rule_is_stricter_than_reads() {
        let cfg = RateLimitConfig::default();
        assert!(cfg.rule(RateLimitGroup::Likes).per_second < cfg.public_read.per_second);
    }
}
