//! Error types for janus-llm

use thiserror::Error;

/// LLM error type
#[derive(Debug, Error)]
pub enum Error {
    /// Provider or credential not configured
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// Vendor API error, normalized across providers
    #[error("{vendor} api error (HTTP {status}): {message}")]
    Vendor {
        /// Vendor that produced the error
        vendor: String,
        /// HTTP-like status code
        status: u16,
        /// Whether the caller may retry (429 and 5xx)
        retryable: bool,
        /// Retry-after hint in milliseconds, when the vendor provided one
        retry_after_ms: Option<u64>,
        /// Sanitized error message
        message: String,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Invalid response
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Feature not supported by this adapter
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    /// Build the normalized vendor error for an HTTP status code.
    ///
    /// 429 and all 5xx codes are retryable, everything else is not.
    #[must_use]
    pub fn vendor(
        vendor: impl Into<String>,
        status: u16,
        message: impl Into<String>,
        retry_after_ms: Option<u64>,
    ) -> Self {
        Self::Vendor {
            vendor: vendor.into(),
            status,
            retryable: status == 429 || status >= 500,
            retry_after_ms,
            message: message.into(),
        }
    }

    /// Whether the error is worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Vendor { retryable: true, .. })
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_error_retryable_codes() {
        assert!(Error::vendor("openai", 429, "rate limited", None).is_retryable());
        assert!(Error::vendor("openai", 500, "server error", None).is_retryable());
        assert!(Error::vendor("openai", 503, "overloaded", None).is_retryable());
        assert!(!Error::vendor("openai", 400, "bad request", None).is_retryable());
        assert!(!Error::vendor("openai", 401, "unauthorized", None).is_retryable());
        assert!(!Error::vendor("openai", 404, "not found", None).is_retryable());
    }

    #[test]
    fn test_non_vendor_errors_not_retryable() {
        assert!(!Error::NotConfigured("missing key".into()).is_retryable());
        assert!(!Error::Network("connection refused".into()).is_retryable());
    }
}
