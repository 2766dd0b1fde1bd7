//! Rate limit header parsing
//!
//! Every vendor reports rate limit state under different header names and
//! encodings: Anthropic uses `anthropic-ratelimit-*` with ISO 8601 reset
//! timestamps, OpenAI-compatible APIs use `x-ratelimit-*` with Go-style
//! durations (`"10s"`, `"1m"`, `"6m0s"`), Azure reports bare integers.
//! This module normalizes all of them into [`RateLimitInfo`], with `-1`
//! as the "unknown" sentinel. Parsing never fails; malformed or absent
//! headers resolve to unknown.

use crate::credential::Vendor;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

/// Sentinel for fields the vendor did not report (or reported malformed).
pub const UNKNOWN: i64 = -1;

/// Normalized rate limit state for one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitInfo {
    /// Request limit for the current window
    pub requests_limit: i64,
    /// Requests remaining in the current window
    pub requests_remaining: i64,
    /// Milliseconds until the request window resets
    pub requests_reset_ms: i64,
    /// Token limit for the current window
    pub tokens_limit: i64,
    /// Tokens remaining in the current window
    pub tokens_remaining: i64,
    /// Milliseconds until the token window resets
    pub tokens_reset_ms: i64,
}

impl Default for RateLimitInfo {
    fn default() -> Self {
        Self {
            requests_limit: UNKNOWN,
            requests_remaining: UNKNOWN,
            requests_reset_ms: UNKNOWN,
            tokens_limit: UNKNOWN,
            tokens_remaining: UNKNOWN,
            tokens_reset_ms: UNKNOWN,
        }
    }
}

impl RateLimitInfo {
    /// Whether any field was actually parsed from headers.
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.requests_limit != UNKNOWN
            || self.requests_remaining != UNKNOWN
            || self.requests_reset_ms != UNKNOWN
            || self.tokens_limit != UNKNOWN
            || self.tokens_remaining != UNKNOWN
            || self.tokens_reset_ms != UNKNOWN
    }
}

/// Parse rate limit headers for the given vendor.
///
/// Call this immediately after receiving a response, before consuming the
/// body. Returns `None` when no recognized header is present.
#[must_use]
pub fn parse_rate_limit_headers(vendor: Vendor, headers: &HeaderMap) -> Option<RateLimitInfo> {
    let info = match vendor {
        Vendor::Anthropic => parse_anthropic_headers(headers),
        Vendor::OpenAi | Vendor::AzureOpenAi => parse_openai_headers(headers),
        // Gemini and Ollama do not emit rate limit headers on the paths we
        // use, but proxies in front of them sometimes add the x-ratelimit
        // family, so fall through to that format.
        Vendor::Gemini | Vendor::Ollama => parse_openai_headers(headers),
    };

    info.has_data().then_some(info)
}

/// Parse a `Retry-After` style hint into milliseconds.
#[must_use]
pub fn parse_retry_after_ms(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get("retry-after").and_then(|v| v.to_str().ok())?;
    let ms = parse_reset_value_ms(value);
    u64::try_from(ms).ok().filter(|_| ms != UNKNOWN)
}

fn parse_anthropic_headers(headers: &HeaderMap) -> RateLimitInfo {
    RateLimitInfo {
        requests_limit: header_i64(headers, "anthropic-ratelimit-requests-limit"),
        requests_remaining: header_i64(headers, "anthropic-ratelimit-requests-remaining"),
        requests_reset_ms: header_reset_ms(headers, "anthropic-ratelimit-requests-reset"),
        tokens_limit: header_i64(headers, "anthropic-ratelimit-tokens-limit"),
        tokens_remaining: header_i64(headers, "anthropic-ratelimit-tokens-remaining"),
        tokens_reset_ms: header_reset_ms(headers, "anthropic-ratelimit-tokens-reset"),
    }
}

fn parse_openai_headers(headers: &HeaderMap) -> RateLimitInfo {
    RateLimitInfo {
        requests_limit: header_i64(headers, "x-ratelimit-limit-requests"),
        requests_remaining: header_i64(headers, "x-ratelimit-remaining-requests"),
        requests_reset_ms: header_reset_ms(headers, "x-ratelimit-reset-requests"),
        tokens_limit: header_i64(headers, "x-ratelimit-limit-tokens"),
        tokens_remaining: header_i64(headers, "x-ratelimit-remaining-tokens"),
        tokens_reset_ms: header_reset_ms(headers, "x-ratelimit-reset-tokens"),
    }
}

/// Extract an integer header value, `-1` when absent or malformed.
fn header_i64(headers: &HeaderMap, name: &str) -> i64 {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(UNKNOWN)
}

/// Extract a reset header as milliseconds-until-reset, `-1` when unknown.
fn header_reset_ms(headers: &HeaderMap, name: &str) -> i64 {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(parse_reset_value_ms)
        .unwrap_or(UNKNOWN)
}

/// Parse one reset header value into milliseconds.
///
/// Accepts ISO 8601 timestamps ("2026-02-06T15:30:00Z" → ms from now),
/// Go-style durations ("10s", "1m", "6m0s", "200ms", "1h2m3s") and bare
/// integers (interpreted as seconds, the `Retry-After` convention).
fn parse_reset_value_ms(value: &str) -> i64 {
    let value = value.trim();
    if value.is_empty() {
        return UNKNOWN;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        let ms = (dt.with_timezone(&Utc) - Utc::now()).num_milliseconds();
        return ms.max(0);
    }

    if let Ok(secs) = value.parse::<i64>() {
        return secs.max(0).saturating_mul(1000);
    }

    match parse_go_duration(value) {
        Some(secs) => (secs * 1000.0) as i64,
        None => UNKNOWN,
    }
}

/// Parse a Go-style duration string into total seconds.
///
/// Supports patterns: `"6m0s"`, `"1m30.5s"`, `"200ms"`, `"45s"`, `"1h2m3s"`.
fn parse_go_duration(s: &str) -> Option<f64> {
    let mut total_secs = 0.0_f64;
    let mut num_buf = String::new();
    let mut chars = s.chars().peekable();
    let mut parsed_any = false;

    while let Some(&ch) = chars.peek() {
        if ch.is_ascii_digit() || ch == '.' {
            num_buf.push(ch);
            chars.next();
        } else if ch == 'h' {
            chars.next();
            let val: f64 = num_buf.parse().ok()?;
            total_secs += val * 3600.0;
            num_buf.clear();
            parsed_any = true;
        } else if ch == 'm' {
            chars.next();
            // Check for "ms"
            if chars.peek() == Some(&'s') {
                chars.next();
                let val: f64 = num_buf.parse().ok()?;
                total_secs += val / 1000.0;
            } else {
                let val: f64 = num_buf.parse().ok()?;
                total_secs += val * 60.0;
            }
            num_buf.clear();
            parsed_any = true;
        } else if ch == 's' {
            chars.next();
            let val: f64 = num_buf.parse().ok()?;
            total_secs += val;
            num_buf.clear();
            parsed_any = true;
        } else {
            // Unknown character
            return None;
        }
    }

    if parsed_any && num_buf.is_empty() {
        Some(total_secs)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_seconds_suffix() {
        assert_eq!(parse_reset_value_ms("10s"), 10_000);
        assert_eq!(parse_reset_value_ms("45s"), 45_000);
    }

    #[test]
    fn test_minutes_suffix() {
        assert_eq!(parse_reset_value_ms("1m"), 60_000);
        assert_eq!(parse_reset_value_ms("6m0s"), 360_000);
        assert_eq!(parse_reset_value_ms("1m30s"), 90_000);
    }

    #[test]
    fn test_milliseconds_and_hours() {
        assert_eq!(parse_reset_value_ms("200ms"), 200);
        assert_eq!(parse_reset_value_ms("1h2m3s"), 3_723_000);
    }

    #[test]
    fn test_bare_integer_is_seconds() {
        assert_eq!(parse_reset_value_ms("30"), 30_000);
    }

    #[test]
    fn test_iso_timestamp_in_future() {
        let future = (Utc::now() + chrono::Duration::seconds(60)).to_rfc3339();
        let ms = parse_reset_value_ms(&future);
        assert!(ms > 55_000 && ms <= 60_000, "got {ms}");
    }

    #[test]
    fn test_iso_timestamp_in_past_clamps_to_zero() {
        let past = (Utc::now() - chrono::Duration::seconds(60)).to_rfc3339();
        assert_eq!(parse_reset_value_ms(&past), 0);
    }

    #[test]
    fn test_malformed_is_unknown_never_panics() {
        assert_eq!(parse_reset_value_ms("abc"), UNKNOWN);
        assert_eq!(parse_reset_value_ms(""), UNKNOWN);
        assert_eq!(parse_reset_value_ms("12x"), UNKNOWN);
    }

    #[test]
    fn test_absent_header_is_unknown() {
        let headers = HeaderMap::new();
        assert_eq!(header_i64(&headers, "x-ratelimit-limit-requests"), UNKNOWN);
        assert_eq!(
            header_reset_ms(&headers, "x-ratelimit-reset-requests"),
            UNKNOWN
        );
        assert!(parse_rate_limit_headers(Vendor::OpenAi, &headers).is_none());
    }

    #[test]
    fn test_anthropic_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "anthropic-ratelimit-requests-limit",
            HeaderValue::from_static("1000"),
        );
        headers.insert(
            "anthropic-ratelimit-requests-remaining",
            HeaderValue::from_static("987"),
        );
        headers.insert(
            "anthropic-ratelimit-tokens-limit",
            HeaderValue::from_static("100000"),
        );

        let info = parse_rate_limit_headers(Vendor::Anthropic, &headers).unwrap();
        assert_eq!(info.requests_limit, 1000);
        assert_eq!(info.requests_remaining, 987);
        assert_eq!(info.tokens_limit, 100_000);
        assert_eq!(info.tokens_remaining, UNKNOWN);
    }

    #[test]
    fn test_openai_headers_with_duration_reset() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-limit-requests", HeaderValue::from_static("60"));
        headers.insert(
            "x-ratelimit-remaining-requests",
            HeaderValue::from_static("12"),
        );
        headers.insert(
            "x-ratelimit-reset-requests",
            HeaderValue::from_static("2m14s"),
        );

        let info = parse_rate_limit_headers(Vendor::OpenAi, &headers).unwrap();
        assert_eq!(info.requests_limit, 60);
        assert_eq!(info.requests_remaining, 12);
        assert_eq!(info.requests_reset_ms, 134_000);
    }

    #[test]
    fn test_malformed_header_value_is_unknown() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-ratelimit-limit-requests",
            HeaderValue::from_static("not-a-number"),
        );
        headers.insert(
            "x-ratelimit-remaining-requests",
            HeaderValue::from_static("5"),
        );

        let info = parse_rate_limit_headers(Vendor::OpenAi, &headers).unwrap();
        assert_eq!(info.requests_limit, UNKNOWN);
        assert_eq!(info.requests_remaining, 5);
    }

    #[test]
    fn test_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("30"));
        assert_eq!(parse_retry_after_ms(&headers), Some(30_000));

        let empty = HeaderMap::new();
        assert_eq!(parse_retry_after_ms(&empty), None);
    }
}
