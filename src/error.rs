//! Error types for cdx-harvest
//!
//! This module defines the failure taxonomy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for cdx-harvest
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Session Control
    // ============================================================================
    #[error("operation cancelled")]
    Cancelled,

    // ============================================================================
    // Per-Attempt Conditions (retryable)
    // ============================================================================
    #[error("page request timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("rate limited by upstream (HTTP {status})")]
    RateLimited { status: u16 },

    #[error("network error: {message}")]
    Network { message: String },

    // ============================================================================
    // Retry Exhaustion
    // ============================================================================
    #[error("page request timed out on all {attempts} attempts")]
    TimeoutExhausted { attempts: u32 },

    #[error("rate limited on all {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },

    // ============================================================================
    // Fatal Upstream Responses
    // ============================================================================
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("malformed index response: {message}")]
    MalformedResponse { message: String },

    // ============================================================================
    // Setup Errors
    // ============================================================================
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("configuration error: {message}")]
    Config { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a malformed-response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Check if this error is retryable on the next page attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Timeout { .. } | Error::RateLimited { .. } | Error::Network { .. }
        )
    }

    /// Check if this error represents user-initiated cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// Result type alias for cdx-harvest
pub type Result<T> = std::result::Result<T, Error>;
