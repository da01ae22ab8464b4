//! An async Rust client for notarizing data certificates on the Circular
//! Protocol.
//!
//! **circular-kit** covers the account transaction pipeline: deterministic
//! transaction IDs, secp256k1 signing, nonce management, certificate
//! submission and bounded outcome polling.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use circular_kit::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), circular_kit::Error> {
//!     let account = Account::builder().build()?;
//!     account.set_network("testnet").await?;
//!
//!     account.open("0x1234567890abcdef1234567890abcdef12345678")?;
//!     account.update_account().await?;
//!
//!     let submission = account.submit_certificate("hello", "0x...").await?;
//!     let outcome = account.wait_for_outcome(&submission.tx_id.to_hex()).await?;
//!     println!("{}: {}", submission.tx_id, outcome.status);
//!
//!     account.close();
//!     Ok(())
//! }
//! ```
//!
//! # Core Types
//!
//! - [`Address`] - Validated 20-byte account address
//! - [`TxId`] - 32-byte SHA-256 transaction ID
//! - [`SecretKey`], [`PublicKey`], [`Signature`] - secp256k1 keys and DER signatures
//! - [`Certificate`] - Hex payload with chaining references
//! - [`Timestamp`] - UTC time in the gateway's `YYYY:MM:DD-HH:MM:SS` form
//!
//! # Errors
//!
//! Every fallible operation returns [`Error`]. Gateway failures keep their
//! cause: transport problems, API rejections (with the raw response) and
//! malformed payloads are distinct [`GatewayError`] variants. Nothing is
//! retried automatically.
//!
//! # Logging
//!
//! The crate emits `tracing` events and never installs a subscriber.
//! Private keys are never logged.

pub mod client;
pub mod encoding;
pub mod error;
pub mod types;

pub use error::{
    Error, GatewayError, ParseAddressError, ParseHashError, ParseTimestampError, SignerError,
    TransportError,
};
pub use types::*;

pub use client::{
    Account, AccountBuilder, AccountConfig, DiscoveryResolver, GatewayClient, HttpTransport,
    Method, NetworkResolver, PollConfig, StaticResolver, Submission, Transport, TransportResponse,
    poll_until_terminal,
};
