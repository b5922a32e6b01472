//! Unit tests for Metal configuration validation.

use std::time::Duration;

use equinix_datalist::config::{ConfigError, DEFAULT_METAL_API_URL};
use equinix_datalist::{MetalClient, MetalConfig, MetalError};
use rstest::*;

#[fixture]
fn valid_config() -> MetalConfig {
    MetalConfig {
        auth_token: String::from("metal-token-example"),
        api_url: String::from(DEFAULT_METAL_API_URL),
        request_timeout_secs: 30,
    }
}

#[rstest]
fn config_validation_accepts_complete_config(valid_config: MetalConfig) {
    assert_eq!(valid_config.validate(), Ok(()));
    assert_eq!(valid_config.request_timeout(), Duration::from_secs(30));
}

#[rstest]
fn config_validation_rejects_missing_token_with_actionable_error(valid_config: MetalConfig) {
    let cfg = MetalConfig {
        auth_token: String::from("   "),
        ..valid_config
    };

    let error = cfg.validate().expect_err("token is required");
    let ConfigError::MissingField(ref message) = error else {
        panic!("expected MissingField error");
    };
    assert!(
        message.contains("METAL_AUTH_TOKEN"),
        "error should mention env var: {message}"
    );
    assert!(
        message.contains("equinix.toml"),
        "error should mention config file: {message}"
    );
    assert!(
        message.contains("auth_token"),
        "error should mention TOML key: {message}"
    );
}

#[rstest]
fn config_validation_rejects_empty_api_url(valid_config: MetalConfig) {
    let cfg = MetalConfig {
        api_url: String::new(),
        ..valid_config
    };

    let message = cfg.validate().expect_err("url is required").to_string();
    assert!(message.contains("METAL_API_URL"), "message: {message}");
    assert!(message.contains("api_url"), "message: {message}");
}

#[rstest]
fn config_validation_rejects_zero_timeout(valid_config: MetalConfig) {
    let cfg = MetalConfig {
        request_timeout_secs: 0,
        ..valid_config
    };

    let error = cfg.validate().expect_err("timeout must be positive");
    assert!(
        matches!(error, ConfigError::Invalid(ref message) if message.contains("METAL_REQUEST_TIMEOUT_SECS")),
        "unexpected error: {error}"
    );
}

#[rstest]
fn client_surfaces_config_errors(valid_config: MetalConfig) {
    let cfg = MetalConfig {
        auth_token: String::new(),
        ..valid_config
    };

    let err = MetalClient::new(&cfg).expect_err("client should refuse empty token");
    let MetalError::Config(ref message) = err else {
        panic!("expected Config error, got {err:?}");
    };
    assert!(message.contains("METAL_AUTH_TOKEN"), "message: {message}");
    assert!(err.to_string().starts_with("configuration error:"));
}
