//! Core types for the Circular Protocol.
//!
//! Validated identifiers, keys and the records that make up a certificate
//! transaction.

mod address;
mod certificate;
mod hash;
mod key;
mod network;
mod outcome;
mod timestamp;
mod transaction;

pub use address::Address;
pub use certificate::Certificate;
pub use hash::TxId;
pub use key::{PublicKey, SECRET_KEY_LENGTH, SecretKey, Signature};
pub use network::{
    DEFAULT_CHAIN, DEFAULT_NAG, GatewayTarget, LIB_VERSION, NETWORK_DISCOVERY_URL, Network,
};
pub use outcome::{Outcome, TRANSACTION_NOT_FOUND, TxStatus};
pub use timestamp::Timestamp;
pub use transaction::{
    AddTransactionRequest, CERTIFICATE_ACTION, CERTIFICATE_TX_TYPE, SignedTransaction,
    Transaction, certificate_payload, compute_transaction_id,
};
