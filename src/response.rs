use axum::http::{HeaderMap, HeaderValue};
use chrono::{SecondsFormat, TimeZone, Utc};
use serde::Serialize;

use crate::rate_limiter::{now_millis, Admission, RateLimitSettings};
use crate::search::MatchResult;

/// Body of a successful search response.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<MatchResult>,
}

/// Uniform error body: a single human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub catalog_loaded: bool,
    pub tracked_clients: usize,
    pub rate_limit: RateLimitSettings,
}

impl HealthResponse {
    pub fn healthy(
        catalog_loaded: bool,
        tracked_clients: usize,
        rate_limit: RateLimitSettings,
    ) -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            catalog_loaded,
            tracked_clients,
            rate_limit,
        }
    }
}

/// Quota headers attached to every governed response, admitted or denied.
pub fn rate_limit_headers(admission: &Admission) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("X-RateLimit-Limit", admission.limit.into());
    headers.insert("X-RateLimit-Remaining", admission.remaining.into());
    if let Some(reset) = Utc.timestamp_millis_opt(admission.reset_at as i64).single() {
        if let Ok(value) =
            HeaderValue::from_str(&reset.to_rfc3339_opts(SecondsFormat::Millis, true))
        {
            headers.insert("X-RateLimit-Reset", value);
        }
    }
    headers
}

/// Whole seconds until the denied client's window resets, rounded up.
pub fn retry_after_secs(admission: &Admission) -> u64 {
    admission.reset_at.saturating_sub(now_millis()).div_ceil(1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_carry_quota_metadata() {
        let admission = Admission {
            admitted: true,
            limit: 60,
            remaining: 42,
            reset_at: 1_700_000_000_000,
        };

        let headers = rate_limit_headers(&admission);
        assert_eq!(headers["X-RateLimit-Limit"], "60");
        assert_eq!(headers["X-RateLimit-Remaining"], "42");

        let reset = headers["X-RateLimit-Reset"].to_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(reset).is_ok());
    }

    #[test]
    fn retry_after_rounds_up_and_never_underflows() {
        let expired = Admission {
            admitted: false,
            limit: 1,
            remaining: 0,
            reset_at: 0,
        };
        assert_eq!(retry_after_secs(&expired), 0);

        let future = Admission {
            admitted: false,
            limit: 1,
            remaining: 0,
            reset_at: now_millis() + 1500,
        };
        let secs = retry_after_secs(&future);
        assert!(secs == 1 || secs == 2);
    }
}
