use crate::config::env::env_flag;
use axum::http::{header, HeaderMap};
use std::{env, sync::OnceLock};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

const EPOCH: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "strict" => Self::Strict,
            "none" => Self::None,
            _ => Self::Lax,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

/// Attributes shared by every auth cookie this server sets.
#[derive(Debug, Clone)]
struct CookiePolicy {
    secure: bool,
    same_site: SameSite,
    domain: Option<String>,
}

impl CookiePolicy {
    fn from_env() -> Self {
        let same_site = env::var("AUTH_COOKIE_SAMESITE")
            .map(|raw| SameSite::parse(&raw))
            .unwrap_or(SameSite::Lax);
        let domain = env::var("AUTH_COOKIE_DOMAIN")
            .ok()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Self::new(env_flag("AUTH_COOKIE_SECURE", false), same_site, domain)
    }

    // Browsers drop SameSite=None cookies that are not Secure.
    fn new(secure: bool, same_site: SameSite, domain: Option<String>) -> Self {
        Self {
            secure: secure || same_site == SameSite::None,
            same_site,
            domain,
        }
    }

    fn attributes(&self) -> String {
        let mut attrs = format!("Path=/; HttpOnly; SameSite={}", self.same_site.as_str());
        if self.secure {
            attrs.push_str("; Secure");
        }
        if let Some(domain) = &self.domain {
            attrs.push_str("; Domain=");
            attrs.push_str(domain);
        }
        attrs
    }

    fn set(&self, name: &str, value: &str, max_age: u64) -> String {
        format!("{name}={value}; Max-Age={max_age}; {}", self.attributes())
    }

    fn clear(&self, name: &str) -> String {
        format!("{name}=; Max-Age=0; Expires={EPOCH}; {}", self.attributes())
    }
}

fn policy() -> &'static CookiePolicy {
    static POLICY: OnceLock<CookiePolicy> = OnceLock::new();
    POLICY.get_or_init(CookiePolicy::from_env)
}

pub fn build_auth_cookie(name: &str, value: &str, max_age_seconds: u64) -> String {
    policy().set(name, value, max_age_seconds)
}

pub fn build_clear_cookie(name: &str) -> String {
    policy().clear(name)
}

/// First value of cookie `name` across all `Cookie` headers.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; access_token=abc.def.ghi"),
        );
        assert_eq!(
            extract_cookie(&headers, ACCESS_TOKEN_COOKIE).as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn missing_cookie_is_none() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert!(extract_cookie(&headers, ACCESS_TOKEN_COOKIE).is_none());
    }

    #[test]
    fn set_cookie_carries_policy() {
        let policy = CookiePolicy::new(false, SameSite::Strict, Some("example.org".into()));
        let cookie = policy.set(ACCESS_TOKEN_COOKIE, "tok", 60);
        assert!(cookie.starts_with("access_token=tok; Max-Age=60;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.ends_with("Domain=example.org"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = CookiePolicy::new(false, SameSite::Lax, None).clear(ACCESS_TOKEN_COOKIE);
        assert!(cookie.starts_with("access_token=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains(EPOCH));
    }

    #[test]
    fn same_site_none_forces_secure() {
        assert!(CookiePolicy::new(false, SameSite::None, None).secure);
    }

    #[test]
    fn same_site_defaults_to_lax() {
        assert_eq!(SameSite::parse("strict"), SameSite::Strict);
        assert_eq!(SameSite::parse("NONE"), SameSite::None);
        assert_eq!(SameSite::parse("whatever"), SameSite::Lax);
    }
}
