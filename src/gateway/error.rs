//! Error types for remote service access.
//!
//! This module defines structured errors for gateway calls,
//! following the What/Why/Fix pattern used across the project.

use thiserror::Error;

/// Errors that can occur while calling a remote service through the gateway.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Client-credential exchange failed or returned unusable data
    #[error("authentication failed: {reason}\n  Suggestion: {suggestion}")]
    Authentication {
        /// Why authentication failed
        reason: String,
        /// How to fix the issue
        suggestion: String,
    },

    /// The request never produced a response (network, timeout, TLS)
    #[error("request to '{url}' failed: {reason}\n  Suggestion: Check your network connection")]
    Request {
        /// The URL that was requested
        url: String,
        /// Transport-level failure description
        reason: String,
    },

    /// The remote service answered with a non-success status
    #[error("'{url}' returned HTTP {status}: {reason}")]
    Status {
        /// The URL that was requested
        url: String,
        /// HTTP status code
        status: u16,
        /// Human-readable status interpretation
        reason: String,
    },

    /// The response body could not be decoded
    #[error("unexpected response format from '{url}': {reason}")]
    Decode {
        /// The URL that was requested
        url: String,
        /// Decoder error description
        reason: String,
    },

    /// HTTP 429 persisted after every allowed wait-and-retry
    #[error(
        "rate limited by '{url}' after {attempts} attempt(s)\n  Suggestion: Wait a few minutes before running again"
    )]
    RateLimited {
        /// The URL that was requested
        url: String,
        /// Number of attempts made
        attempts: u32,
    },

    /// Gateway configuration is unusable
    #[error("invalid gateway configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration
        reason: String,
    },

    /// The admission permit pool was closed while waiting
    #[error("permit pool closed unexpectedly")]
    PermitPoolClosed,
}

impl GatewayError {
    /// Creates an `Authentication` error.
    #[must_use]
    pub fn authentication(reason: &str) -> Self {
        Self::Authentication {
            reason: reason.to_string(),
            suggestion: "Check the client ID and client secret of your OAuth application"
                .to_string(),
        }
    }

    /// Creates a `Request` error from a transport failure.
    #[must_use]
    pub fn request(url: &str, reason: &str) -> Self {
        Self::Request {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates a `Status` error with a reason derived from the status code.
    #[must_use]
    pub fn status(url: &str, status: u16) -> Self {
        let reason = match status {
            401 | 403 => "access denied".to_string(),
            404 => "not found".to_string(),
            429 => "rate limit exceeded".to_string(),
            s if s >= 500 => "service unavailable, try again later".to_string(),
            s => format!("unexpected status {s}"),
        };
        Self::Status {
            url: url.to_string(),
            status,
            reason,
        }
    }

    /// Creates a `Decode` error.
    #[must_use]
    pub fn decode(url: &str, reason: &str) -> Self {
        Self::Decode {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates an `InvalidConfig` error.
    #[must_use]
    pub fn invalid_config(reason: &str) -> Self {
        Self::InvalidConfig {
            reason: reason.to_string(),
        }
    }

    /// Returns true when the remote service reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_authentication_message() {
        let msg = GatewayError::authentication("unknown client").to_string();
        assert!(msg.contains("unknown client"));
        assert!(msg.contains("client secret"), "suggestion should mention secret");
    }

    #[test]
    fn test_gateway_error_status_reasons() {
        assert!(
            GatewayError::status("https://x.test/a", 404)
                .to_string()
                .contains("not found")
        );
        assert!(
            GatewayError::status("https://x.test/a", 503)
                .to_string()
                .contains("unavailable")
        );
        assert!(
            GatewayError::status("https://x.test/a", 418)
                .to_string()
                .contains("418")
        );
    }

    #[test]
    fn test_gateway_error_is_not_found() {
        assert!(GatewayError::status("u", 404).is_not_found());
        assert!(!GatewayError::status("u", 500).is_not_found());
        assert!(!GatewayError::PermitPoolClosed.is_not_found());
    }

    #[test]
    fn test_gateway_error_clone() {
        let err = GatewayError::request("https://x.test", "timed out");
        assert_eq!(err.to_string(), err.clone().to_string());
    }
}
