//! Error types for circular-kit.
//!
//! # Error Hierarchy
//!
//! - [`Error`](enum@Error) - Main error type, returned by account operations
//!   - [`GatewayError`] - Transport, HTTP and protocol-level gateway failures
//!   - [`ParseAddressError`] - Invalid account address format
//!   - [`SignerError`] - Bad or degenerate private keys, signing failures
//!   - [`ParseHashError`] - Invalid transaction ID format
//!   - [`ParseTimestampError`] - Invalid `YYYY:MM:DD-HH:MM:SS` timestamp
//!
//! # Error Handling Examples
//!
//! ```rust,no_run
//! use circular_kit::*;
//!
//! # async fn example(account: &Account) -> Result<(), Error> {
//! match account.submit_certificate("hello", "0x...").await {
//!     Ok(submission) => println!("submitted {}", submission.tx_id),
//!     Err(Error::Gateway(GatewayError::Api { status_code, message, .. })) => {
//!         println!("rejected with {status_code}: {message}");
//!     }
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use thiserror::Error;

/// Boxed error produced by a [`Transport`](crate::Transport) implementation.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Error parsing an account address.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseAddressError {
    #[error("Address is empty")]
    Empty,

    #[error("Address '{address}' has invalid length: expected {expected} hex characters, got {actual}")]
    InvalidLength {
        address: String,
        expected: usize,
        actual: usize,
    },

    #[error("Address '{0}' contains invalid character '{1}'")]
    InvalidChar(String, char),
}

/// Error parsing a transaction ID.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseHashError {
    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("Invalid hash length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// Error parsing a gateway timestamp.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid timestamp '{0}': expected YYYY:MM:DD-HH:MM:SS")]
pub struct ParseTimestampError(pub String);

/// Error during key handling and signing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignerError {
    #[error("Invalid private key encoding: {0}")]
    InvalidKeyFormat(String),

    #[error("Invalid key length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Private key is a degenerate pattern and was rejected")]
    DegenerateKey,

    #[error("Private key is not a valid secp256k1 scalar")]
    InvalidKey,

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid signature encoding: {0}")]
    InvalidSignature(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

// ============================================================================
// Gateway Errors
// ============================================================================

/// Errors talking to a Network Access Gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    // ─── Transport ───
    #[error("Network error accessing {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: TransportError,
    },

    // ─── HTTP status or protocol result code ───
    #[error("API error: status {status_code}, message: {message}")]
    Api {
        status_code: i64,
        message: String,
        /// The decoded response body, when the gateway sent one.
        response: Option<serde_json::Value>,
    },

    // ─── Malformed payloads ───
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Create an API error without a response body.
    pub fn api(status_code: i64, message: impl Into<String>) -> Self {
        GatewayError::Api {
            status_code,
            message: message.into(),
            response: None,
        }
    }

    /// Create an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        GatewayError::InvalidResponse(message.into())
    }

    /// Check if a caller-side retry could reasonably succeed.
    ///
    /// The gateway client never retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Network { .. } => true,
            GatewayError::Api { status_code, .. } => {
                *status_code == 408 || *status_code == 429 || (500..600).contains(status_code)
            }
            GatewayError::InvalidResponse(_) => false,
        }
    }

    /// The raw gateway response carried by this error, if any.
    pub fn response(&self) -> Option<&serde_json::Value> {
        match self {
            GatewayError::Api { response, .. } => response.as_ref(),
            _ => None,
        }
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// Main error type for circular-kit operations.
#[derive(Debug, Error)]
pub enum Error {
    // ─── Account lifecycle ───
    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] ParseAddressError),

    #[error("Account is not open. Call Account::open() first.")]
    AccountNotOpen,

    // ─── Signing ───
    #[error("Signing error: {0}")]
    Signing(#[from] SignerError),

    // ─── Gateway ───
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    // ─── Polling ───
    #[error("Timed out after {timeout:?} waiting for the outcome of transaction {tx_id}")]
    Timeout { tx_id: String, timeout: Duration },

    // ─── Configuration ───
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// The raw gateway response attached to this error, if any.
    ///
    /// Submissions that reach the gateway but are rejected with a non-200
    /// result code carry the full response for diagnostics.
    pub fn response(&self) -> Option<&serde_json::Value> {
        match self {
            Error::Gateway(e) => e.response(),
            _ => None,
        }
    }

    /// Returns true if this error is a polling timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}
