//! HTTP client for the Equinix Metal API.

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::MetalError;
use super::types::{Plan, PlanList};
use crate::config::MetalConfig;
use crate::datalist::SourceFuture;

const AUTH_HEADER: &str = "x-auth-token";
const PLAN_INCLUDES: &str = "available_in,available_in_metros";

/// Read access to the plan catalogue.
pub trait PlanCatalog {
    /// Lists every plan with facility and metro codes populated.
    fn list_plans(&self) -> SourceFuture<'_, Vec<Plan>, MetalError>;
}

/// Authenticated client for the Metal REST API.
#[derive(Clone, Debug)]
pub struct MetalClient {
    http: Client,
    base_url: Url,
}

impl MetalClient {
    /// Builds a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MetalError::Config`] when the configuration is invalid or the
    /// base URL does not parse, and [`MetalError::Transport`] when the HTTP
    /// client cannot be constructed.
    pub fn new(config: &MetalConfig) -> Result<Self, MetalError> {
        config.validate()?;
        let base_url = Self::parse_base_url(&config.api_url)?;

        let mut headers = HeaderMap::new();
        let mut token = HeaderValue::from_str(config.auth_token.trim())
            .map_err(|err| MetalError::Config(format!("invalid auth token: {err}")))?;
        token.set_sensitive(true);
        headers.insert(AUTH_HEADER, token);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .user_agent(concat!("equinix-datalist/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, base_url })
    }

    /// Normalises the base URL so relative joins keep its path.
    fn parse_base_url(raw: &str) -> Result<Url, MetalError> {
        let trimmed = raw.trim();
        let with_slash = if trimmed.ends_with('/') {
            trimmed.to_owned()
        } else {
            format!("{trimmed}/")
        };
        Url::parse(&with_slash)
            .map_err(|err| MetalError::Config(format!("invalid api_url '{trimmed}': {err}")))
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        resource: &'static str,
    ) -> Result<T, MetalError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|err| MetalError::Config(format!("invalid request path '{path}': {err}")))?;
        debug!(%url, resource, "requesting");
        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Self::api_error(status, &body));
        }
        serde_json::from_str(&body).map_err(|err| MetalError::Decode {
            resource,
            message: err.to_string(),
        })
    }

    fn api_error(status: StatusCode, body: &str) -> MetalError {
        #[derive(serde::Deserialize)]
        struct ErrorBody {
            #[serde(default)]
            errors: Vec<String>,
            #[serde(default)]
            error: Option<String>,
        }

        let reported = serde_json::from_str::<ErrorBody>(body)
            .map(|parsed| {
                let mut messages = parsed.errors;
                messages.extend(parsed.error);
                messages.join("; ")
            })
            .unwrap_or_default();
        // Bodies without `errors` or `error` are reported as sent.
        let message = if reported.is_empty() {
            body.trim().to_owned()
        } else {
            reported
        };
        MetalError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

impl PlanCatalog for MetalClient {
    fn list_plans(&self) -> SourceFuture<'_, Vec<Plan>, MetalError> {
        Box::pin(async move {
            let list: PlanList = self
                .get_json("plans", &[("include", PLAN_INCLUDES)], "plans")
                .await?;
            debug!(count = list.plans.len(), "listed plans");
            Ok(list.plans)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn config(api_url: &str) -> MetalConfig {
        MetalConfig {
            auth_token: String::from("token"),
            api_url: api_url.to_owned(),
            request_timeout_secs: 5,
        }
    }

    #[rstest]
    #[case("https://api.equinix.com/metal/v1", "https://api.equinix.com/metal/v1/plans")]
    #[case("https://api.equinix.com/metal/v1/", "https://api.equinix.com/metal/v1/plans")]
    fn base_url_keeps_its_path(#[case] api_url: &str, #[case] expected: &str) {
        let client = MetalClient::new(&config(api_url)).expect("client should build");
        let joined = client.base_url().join("plans").expect("join");
        assert_eq!(joined.as_str(), expected);
    }

    #[rstest]
    fn invalid_url_is_a_config_error() {
        let err = MetalClient::new(&config("not a url")).expect_err("url is invalid");
        assert!(matches!(err, MetalError::Config(_)), "unexpected: {err}");
    }

    #[rstest]
    fn missing_token_is_rejected_before_any_request() {
        let cfg = MetalConfig {
            auth_token: String::from("  "),
            ..config(crate::config::DEFAULT_METAL_API_URL)
        };
        let err = MetalClient::new(&cfg).expect_err("token is required");
        assert!(err.to_string().contains("METAL_AUTH_TOKEN"), "message: {err}");
    }

    #[rstest]
    #[case(r#"{"errors":["Invalid token"]}"#, "Invalid token")]
    #[case(r#"{"error":"Not found"}"#, "Not found")]
    #[case("gateway timeout\n", "gateway timeout")]
    #[case("{}", "{}")]
    #[case(r#"{"message":"boom"}"#, r#"{"message":"boom"}"#)]
    #[case(r#"{"errors":[]}"#, r#"{"errors":[]}"#)]
    fn api_errors_carry_the_server_message(#[case] body: &str, #[case] expected: &str) {
        let err = MetalClient::api_error(StatusCode::UNAUTHORIZED, body);
        assert_eq!(
            err,
            MetalError::Api {
                status: 401,
                message: expected.to_owned()
            }
        );
    }
}
