//! Network name to gateway URL resolution.

use std::collections::HashMap;

use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::{debug, warn};

use super::gateway::GatewayClient;
use crate::error::{Error, GatewayError};
use crate::types::NETWORK_DISCOVERY_URL;

/// Resolves a network name such as `testnet` to a gateway base URL.
pub trait NetworkResolver: Send + Sync {
    fn resolve<'a>(&'a self, network: &'a str) -> BoxFuture<'a, Result<String, Error>>;
}

#[derive(Deserialize)]
struct DiscoveryResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    message: Option<String>,
}

/// Asks the public discovery service for the gateway URL.
///
/// Sends `GET <base><network>` and expects
/// `{"status":"success","url":"..."}`.
#[derive(Clone, Debug)]
pub struct DiscoveryResolver {
    gateway: GatewayClient,
    base_url: String,
}

impl DiscoveryResolver {
    /// Resolver against the default discovery service.
    pub fn new(gateway: GatewayClient) -> Self {
        Self::with_base_url(gateway, NETWORK_DISCOVERY_URL)
    }

    /// Resolver against a custom discovery endpoint.
    pub fn with_base_url(gateway: GatewayClient, base_url: impl Into<String>) -> Self {
        Self {
            gateway,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn discover(&self, network: &str) -> Result<String, Error> {
        validate_network_name(network)?;

        let url = format!("{}{}", self.base_url, network);
        let body = self.gateway.get(&url).await?;
        let response: DiscoveryResponse = serde_json::from_value(body).map_err(|e| {
            GatewayError::invalid_response(format!("malformed discovery response: {e}"))
        })?;

        if response.status != "success" || response.url.is_empty() {
            let message = response
                .message
                .unwrap_or_else(|| "network discovery failed".to_string());
            warn!(network, status = %response.status, %message, "network discovery failed");
            return Err(GatewayError::invalid_response(message).into());
        }

        debug!(network, url = %response.url, "resolved gateway");
        Ok(response.url)
    }
}

impl NetworkResolver for DiscoveryResolver {
    fn resolve<'a>(&'a self, network: &'a str) -> BoxFuture<'a, Result<String, Error>> {
        Box::pin(self.discover(network))
    }
}

/// Fixed name to URL table, for offline use and tests.
///
/// ```
/// use circular_kit::{NetworkResolver, StaticResolver};
///
/// # async fn demo() {
/// let resolver = StaticResolver::new().with_network("local", "http://localhost:8080/");
/// assert_eq!(resolver.resolve("local").await.unwrap(), "http://localhost:8080/");
/// assert!(resolver.resolve("mainnet").await.is_err());
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct StaticResolver {
    networks: HashMap<String, String>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a network entry.
    pub fn with_network(mut self, network: impl Into<String>, url: impl Into<String>) -> Self {
        self.networks.insert(network.into(), url.into());
        self
    }
}

impl NetworkResolver for StaticResolver {
    fn resolve<'a>(&'a self, network: &'a str) -> BoxFuture<'a, Result<String, Error>> {
        let result = self
            .networks
            .get(network)
            .cloned()
            .ok_or_else(|| Error::Config(format!("unknown network '{network}'")));
        Box::pin(async move { result })
    }
}

fn validate_network_name(network: &str) -> Result<(), Error> {
    if network.is_empty() {
        return Err(Error::Config("network name cannot be empty".to_string()));
    }
    if let Some(c) = network
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(Error::Config(format!(
            "network name '{network}' contains invalid character '{c}'"
        )));
    }
    Ok(())
}
