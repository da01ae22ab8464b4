//! Network identification and gateway targets.

use std::fmt;

/// Library version sent in every gateway request and stamped on certificates.
pub const LIB_VERSION: &str = "1.0.13";

/// Blockchain identifier of the default public chain.
pub const DEFAULT_CHAIN: &str =
    "0x8a20baa40c45dc5055aeb26197c203e576ef389d9acb171bd62da11dc5ad72b2";

/// Base URL of the default public Network Access Gateway.
pub const DEFAULT_NAG: &str = "https://nag.circularlabs.io/NAG.php?cep=";

/// Base URL of the network discovery service. The network name is appended.
pub const NETWORK_DISCOVERY_URL: &str = "https://circularlabs.io/network/getNAG?network=";

/// A well-known Circular network.
///
/// Any other name can still be passed to
/// [`Account::set_network`](crate::Account::set_network) as a plain string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Network {
    /// Production network.
    #[default]
    Mainnet,
    /// Public test network.
    Testnet,
    /// Development network.
    Devnet,
}

impl Network {
    /// Returns the network identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Devnet => "devnet",
        }
    }

    /// Returns true if this is mainnet.
    pub fn is_mainnet(&self) -> bool {
        matches!(self, Network::Mainnet)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Network {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Where gateway requests go: a base URL and a node identifier.
///
/// Endpoint URLs are built by plain concatenation,
/// `<url><method>_<node>`, so the base URL normally ends in `=` or `/`.
///
/// ```
/// use circular_kit::GatewayTarget;
///
/// let target = GatewayTarget::new("https://nag.example/NAG.php?cep=", "testnet");
/// assert_eq!(
///     target.endpoint("Circular_GetWalletNonce_"),
///     "https://nag.example/NAG.php?cep=Circular_GetWalletNonce_testnet"
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayTarget {
    /// Gateway base URL.
    pub url: String,
    /// Node identifier appended to every method name. May be empty.
    pub node: String,
}

impl GatewayTarget {
    /// Create a target from a base URL and node identifier.
    pub fn new(url: impl Into<String>, node: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            node: node.into(),
        }
    }

    /// Full URL for a gateway method such as `Circular_AddTransaction_`.
    pub fn endpoint(&self, method: &str) -> String {
        format!("{}{}{}", self.url, method, self.node)
    }
}

impl Default for GatewayTarget {
    fn default() -> Self {
        Self::new(DEFAULT_NAG, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_display() {
        assert_eq!(Network::Mainnet.to_string(), "mainnet");
        assert_eq!(Network::Testnet.to_string(), "testnet");
        assert_eq!(Network::Devnet.to_string(), "devnet");
    }

    #[test]
    fn test_default_is_mainnet() {
        assert_eq!(Network::default(), Network::Mainnet);
        assert!(Network::default().is_mainnet());
        assert!(!Network::Devnet.is_mainnet());
    }

    #[test]
    fn test_endpoint_without_node() {
        let target = GatewayTarget::default();
        assert_eq!(
            target.endpoint("Circular_AddTransaction_"),
            "https://nag.circularlabs.io/NAG.php?cep=Circular_AddTransaction_"
        );
    }

    #[test]
    fn test_endpoint_with_node() {
        let target = GatewayTarget::new("http://localhost:8080/", "devnet");
        assert_eq!(
            target.endpoint("Circular_GetTransactionbyID_"),
            "http://localhost:8080/Circular_GetTransactionbyID_devnet"
        );
    }
}
