//! Configuration loading via `ortho-config`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Default Equinix Metal API endpoint.
pub const DEFAULT_METAL_API_URL: &str = "https://api.equinix.com/metal/v1/";

/// Equinix Metal client configuration derived from environment variables,
/// configuration files, and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "METAL")]
pub struct MetalConfig {
    /// API token sent as `X-Auth-Token`. This value is required.
    pub auth_token: String,
    /// Base URL of the Metal API. Defaults to the public endpoint.
    #[ortho_config(default = DEFAULT_METAL_API_URL.to_owned())]
    pub api_url: String,
    /// Per-request timeout in seconds.
    #[ortho_config(default = 30)]
    pub request_timeout_secs: u64,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
    section: &'static str,
}

impl FieldMetadata {
    const fn new(
        description: &'static str,
        env_var: &'static str,
        toml_key: &'static str,
        section: &'static str,
    ) -> Self {
        Self {
            description,
            env_var,
            toml_key,
            section,
        }
    }
}

impl MetalConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to [{}] in equinix.toml",
                metadata.description, metadata.env_var, metadata.toml_key, metadata.section
            )));
        }
        Ok(())
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("equinix-datalist")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Performs semantic validation on required fields. Error messages include
    /// guidance on how to provide missing values via environment variables or
    /// configuration files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty and
    /// [`ConfigError::Invalid`] when the timeout is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.auth_token,
            &FieldMetadata::new(
                "Equinix Metal API token",
                "METAL_AUTH_TOKEN",
                "auth_token",
                "metal",
            ),
        )?;
        Self::require_field(
            &self.api_url,
            &FieldMetadata::new("Metal API URL", "METAL_API_URL", "api_url", "metal"),
        )?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(String::from(
                "request_timeout_secs must be greater than zero (METAL_REQUEST_TIMEOUT_SECS)",
            )));
        }
        Ok(())
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a configuration value is out of range.
    #[error("invalid configuration value: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}
