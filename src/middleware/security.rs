use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use crate::config::env::env_flag;
use std::{env, sync::OnceLock};

const DEFAULT_CSP_POLICY: &str = "default-src 'self'; base-uri 'self'; frame-ancestors 'none'; object-src 'none'; script-src 'self' 'unsafe-inline'; style-src 'self' 'unsafe-inline'; img-src 'self' data: https:; connect-src 'self'";
const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";

#[derive(Debug, Clone)]
struct SecurityHeadersConfig {
    csp: HeaderValue,
    enable_hsts: bool,
}

impl SecurityHeadersConfig {
    fn from_env() -> Self {
        let csp = csp_header(env::var("CSP_POLICY").ok().as_deref());
        let enable_hsts = env_flag("ENABLE_HSTS", true);

        Self { csp, enable_hsts }
    }
}

fn csp_header(raw: Option<&str>) -> HeaderValue {
    match raw {
        Some(policy) => HeaderValue::from_str(policy).unwrap_or_else(|err| {
            tracing::warn!("Invalid CSP_POLICY value ({}), using default policy", err);
            HeaderValue::from_static(DEFAULT_CSP_POLICY)
        }),
        None => HeaderValue::from_static(DEFAULT_CSP_POLICY),
    }
}

fn security_headers_config() -> &'static SecurityHeadersConfig {
    static CONFIG: OnceLock<SecurityHeadersConfig> = OnceLock::new();
    CONFIG.get_or_init(SecurityHeadersConfig::from_env)
}

pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let config = security_headers_config();
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("content-security-policy", config.csp.clone());
    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    if config.enable_hsts {
        headers.insert(
            "strict-transport-security",
            HeaderValue::from_static(HSTS_VALUE),
        );
    }

    response
}
