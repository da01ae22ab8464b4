//! Client module for talking to a Circular Network Access Gateway.
//!
//! - [`Account`] - Account lifecycle, nonce sync, certificate submission
//! - [`AccountBuilder`] - Fluent builder over an explicit [`AccountConfig`]
//! - [`GatewayClient`] - Stateless gateway endpoints with typed errors
//! - [`poll_until_terminal`] - Bounded outcome polling
//!
//! # Seams
//!
//! | Trait | Default | Purpose |
//! |-------|---------|---------|
//! | [`Transport`] | [`HttpTransport`] | Sends one HTTP request |
//! | [`NetworkResolver`] | [`DiscoveryResolver`] | Maps a network name to a gateway URL |

mod account;
mod gateway;
mod poller;
mod resolver;
mod transport;

pub use account::{Account, AccountBuilder, AccountConfig, Submission};
pub use gateway::GatewayClient;
pub use poller::{PollConfig, poll_until_terminal};
pub use resolver::{DiscoveryResolver, NetworkResolver, StaticResolver};
pub use transport::{
    DEFAULT_REQUEST_TIMEOUT, HttpTransport, Method, Transport, TransportResponse,
};
