//! Application Configuration
//!
//! Read from the Shuttle secret store at startup. Every problem is
//! collected so a misconfigured deployment reports all of them at once.

use std::time::Duration;

use anyhow::bail;
use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

pub const DEV_JWT_SECRET: &str = "dev_secret";
const DEFAULT_JWT_EXPIRES_IN: Duration = Duration::from_secs(24 * 60 * 60);
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;

/// Allowed browser origins
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    Permissive,
    Origins(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub production: bool,
    pub jwt_secret: String,
    pub jwt_expires_in: Duration,
    pub cors: CorsPolicy,
    pub forward_retry_base_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            production: false,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_expires_in: DEFAULT_JWT_EXPIRES_IN,
            cors: CorsPolicy::Permissive,
            forward_retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
        }
    }
}

impl AppConfig {
    /// Build from a key lookup such as `SecretStore::get`
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut errors = Vec::new();

        let production = get("APP_ENV").is_some_and(|env| env.eq_ignore_ascii_case("production"));

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => {
                if production && secret == DEV_JWT_SECRET {
                    errors.push("JWT_SECRET must not be the development default in production".to_string());
                }
                secret
            }
            None => {
                if production {
                    errors.push("JWT_SECRET is required in production".to_string());
                }
                DEV_JWT_SECRET.to_string()
            }
        };

        let jwt_expires_in = match get("JWT_EXPIRES_IN") {
            Some(raw) => parse_duration(&raw).unwrap_or_else(|| {
                errors.push(format!("JWT_EXPIRES_IN has an invalid duration: {raw}"));
                DEFAULT_JWT_EXPIRES_IN
            }),
            None => DEFAULT_JWT_EXPIRES_IN,
        };

        let origins: Vec<String> = get("CORS_ORIGIN")
            .or_else(|| get("CORS_ORIGINS"))
            .map(|raw| {
                raw.split(',')
                    .map(|o| o.trim().trim_end_matches('/').to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        if production {
            if origins.is_empty() {
                errors.push("CORS_ORIGIN is required in production".to_string());
            }
            if origins.iter().any(|o| o == "*") {
                errors.push("CORS_ORIGIN must not contain '*' in production".to_string());
            }
        }
        for origin in origins.iter().filter(|o| *o != "*") {
            if !is_bare_origin(origin) {
                errors.push(format!("CORS_ORIGIN entry is not a bare origin: {origin}"));
            }
        }

        let cors = if origins.iter().any(|o| o == "*") || origins.is_empty() {
            CorsPolicy::Permissive
        } else {
            CorsPolicy::Origins(origins)
        };

        let forward_retry_base_delay_ms = match get("FORWARD_RETRY_BASE_DELAY_MS") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                errors.push(format!("FORWARD_RETRY_BASE_DELAY_MS is not an integer: {raw}"));
                DEFAULT_RETRY_BASE_DELAY_MS
            }),
            None => DEFAULT_RETRY_BASE_DELAY_MS,
        };

        if !errors.is_empty() {
            bail!("Invalid configuration: {}", errors.join("; "));
        }

        Ok(Self {
            production,
            jwt_secret,
            jwt_expires_in,
            cors,
            forward_retry_base_delay_ms,
        })
    }

    pub fn cors_layer(&self) -> CorsLayer {
        match &self.cors {
            CorsPolicy::Permissive => CorsLayer::permissive(),
            CorsPolicy::Origins(origins) => {
                let origins: Vec<HeaderValue> = origins
                    .iter()
                    .filter_map(|o| HeaderValue::from_str(o).ok())
                    .collect();
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
    }
}

/// Parse `1d`, `12h`, `30m`, `45s` or bare seconds
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().last()? {
        (i, c) if c.is_ascii_alphabetic() => (&raw[..i], c.to_ascii_lowercase()),
        _ => (raw, 's'),
    };
    let value: u64 = digits.trim().parse().ok()?;
    let seconds = match unit {
        'd' => value.checked_mul(86_400)?,
        'h' => value.checked_mul(3_600)?,
        'm' => value.checked_mul(60)?,
        's' => value,
        _ => return None,
    };
    (seconds > 0).then(|| Duration::from_secs(seconds))
}

/// `scheme://host[:port]` with nothing after the authority
fn is_bare_origin(origin: &str) -> bool {
    let Some((scheme, authority)) = origin.split_once("://") else {
        return false;
    };
    matches!(scheme, "http" | "https")
        && !authority.is_empty()
        && !authority.contains(['/', '?', '#'])
}
