//! Error types for Poliqa
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Poliqa operations
///
/// This enum encompasses all possible errors that can occur while talking
/// to the answering service, persisting conversations, and loading
/// configuration. The two request-failure kinds are deliberately separate
/// variants: a `Service` error means the answering service responded with a
/// non-2xx status (and possibly a structured error payload), while a
/// `Transport` error means no usable response was received at all. The two
/// must never be conflated in logs or user-facing output.
#[derive(Error, Debug)]
pub enum PoliqaError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The answering service responded with a non-2xx status
    #[error("Service error (HTTP {status}): {message}")]
    Service {
        /// HTTP status code returned by the service
        status: u16,
        /// Error text from the response payload, or a generic fallback
        message: String,
    },

    /// The request never produced a response (connect, DNS, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Conversation storage errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Poliqa operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
