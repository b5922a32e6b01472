//! Error types for the Equinix Metal data sources.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while talking to the Metal API.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum MetalError {
    /// Raised when the client configuration is incomplete or malformed.
    #[error("configuration error: {0}")]
    Config(String),
    /// Raised when the API answers with a non-success status.
    #[error("metal API returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error text reported by the API.
        message: String,
    },
    /// Raised when a response body does not match the expected model.
    #[error("failed to decode {resource} response: {message}")]
    Decode {
        /// Resource being decoded (for example `plans`).
        resource: &'static str,
        /// Decoder error message.
        message: String,
    },
    /// Wrapper for transport level failures.
    #[error("transport error: {message}")]
    Transport {
        /// Message returned by the HTTP client.
        message: String,
    },
}

impl From<reqwest::Error> for MetalError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport {
            message: value.to_string(),
        }
    }
}

impl From<ConfigError> for MetalError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}
