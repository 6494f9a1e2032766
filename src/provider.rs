//! # Provider
//!
//! Host implementation of the engine's provider traits: outbound HTTP over
//! `reqwest`, key/value settings from the environment, and the operator
//! identity.

use std::env;

use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use fleet_state::config::HEALTH_URL_KEY;
use fleet_state::provider::{Config, HttpRequest, Identity};
use fleet_state::{Principal, Provider};
use http::{Request, Response};

const DEFAULT_HEALTH_URL: &str = "http://localhost:8000/";
const OPERATOR_KEY: &str = "FLEET_OPERATOR";

#[derive(Debug, Clone)]
pub struct HostProvider {
    client: reqwest::Client,
    health_url: String,
    operator: Option<String>,
}

impl HostProvider {
    /// Provider configured from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Provider configured from any key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder().build().context("building HTTP client")?;
        let health_url = var(HEALTH_URL_KEY).unwrap_or_else(|| {
            tracing::trace!("{HEALTH_URL_KEY} not set, using default: {DEFAULT_HEALTH_URL}");
            DEFAULT_HEALTH_URL.to_string()
        });
        let operator = var(OPERATOR_KEY)
            .map(|operator| operator.trim().to_string())
            .filter(|operator| !operator.is_empty());

        Ok(Self { client, health_url, operator })
    }
}

impl Provider for HostProvider {}

impl HttpRequest for HostProvider {
    async fn fetch(&self, request: Request<Vec<u8>>) -> Result<Response<Bytes>> {
        let request = reqwest::Request::try_from(request).context("converting request")?;
        let response = self.client.execute(request).await.context("sending request")?;

        let mut builder = Response::builder().status(response.status());
        for (name, value) in response.headers() {
            builder = builder.header(name, value);
        }
        let body = response.bytes().await.context("reading response body")?;

        builder.body(body).context("building response")
    }
}

impl Config for HostProvider {
    async fn get(&self, key: &str) -> Result<String> {
        match key {
            HEALTH_URL_KEY => Ok(self.health_url.clone()),
            OPERATOR_KEY => self.operator.clone().ok_or_else(|| anyhow!("`{OPERATOR_KEY}` is not set")),
            _ => env::var(key).with_context(|| format!("`{key}` is not set")),
        }
    }
}

impl Identity for HostProvider {
    async fn principal(&self) -> Result<Option<Principal>> {
        Ok(self.operator.as_ref().map(|operator| Principal {
            id: operator.clone(),
            display_name: operator.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn provider(vars: &[(&str, &str)]) -> HostProvider {
        let vars: HashMap<String, String> =
            vars.iter().map(|(key, value)| ((*key).to_string(), (*value).to_string())).collect();
        HostProvider::from_vars(|key| vars.get(key).cloned()).expect("should build")
    }

    #[tokio::test]
    async fn health_url_defaults_to_local_service() {
        let provider = provider(&[]);
        let url = Config::get(&provider, HEALTH_URL_KEY).await.expect("should resolve");
        assert_eq!(url, "http://localhost:8000/");
    }

    #[tokio::test]
    async fn operator_is_the_principal() {
        let provider = provider(&[("FLEET_OPERATOR", " ops@fleet.test ")]);
        let principal = provider.principal().await.expect("should resolve");

        assert_eq!(
            principal,
            Some(Principal {
                id: "ops@fleet.test".to_string(),
                display_name: "ops@fleet.test".to_string()
            })
        );
    }

    #[tokio::test]
    async fn blank_operator_is_signed_out() {
        let provider = provider(&[("FLEET_OPERATOR", "  ")]);
        assert_eq!(provider.principal().await.expect("should resolve"), None);
        Config::get(&provider, OPERATOR_KEY).await.expect_err("operator should be unset");
    }
}
