//! Certificate transactions: identity derivation, signing and the wire form.
//!
//! A transaction ID is the SHA-256 digest of the concatenation
//!
//! ```text
//! blockchain ‖ from ‖ to ‖ payload_hex ‖ decimal(nonce) ‖ timestamp
//! ```
//!
//! where `blockchain`, `from` and `to` are normalized hex without a prefix
//! and `payload_hex` is the hex-encoded JSON action object
//! `{"Action":"CP_CERTIFICATE","Data":"<hex of certificate text>"}`.
//! The raw digest bytes are what get signed.

use serde::{Deserialize, Serialize};

use super::{Address, Certificate, PublicKey, SecretKey, Signature, Timestamp, TxId};
use crate::encoding::{strip_prefix, to_hex};
use crate::error::SignerError;

/// Action tag carried inside a certificate payload.
pub const CERTIFICATE_ACTION: &str = "CP_CERTIFICATE";

/// Transaction type tag sent to the gateway for certificates.
pub const CERTIFICATE_TX_TYPE: &str = "C_TYPE_CERTIFICATE";

#[derive(Serialize)]
struct ActionPayload<'a> {
    #[serde(rename = "Action")]
    action: &'a str,
    #[serde(rename = "Data")]
    data: String,
}

/// Build the hex payload for a certificate transaction.
///
/// ```
/// use circular_kit::certificate_payload;
///
/// let payload = certificate_payload("Hi");
/// assert_eq!(
///     circular_kit::encoding::from_hex(&payload),
///     r#"{"Action":"CP_CERTIFICATE","Data":"4869"}"#
/// );
/// ```
pub fn certificate_payload(certificate_text: &str) -> String {
    let payload = ActionPayload {
        action: CERTIFICATE_ACTION,
        data: to_hex(certificate_text),
    };
    // Infallible: two string fields.
    to_hex(&serde_json::to_string(&payload).unwrap_or_default())
}

/// Derive a transaction ID. Pure: identical inputs always give the same ID.
pub fn compute_transaction_id(
    blockchain: &str,
    from: &Address,
    to: &Address,
    payload_hex: &str,
    nonce: u64,
    timestamp: &Timestamp,
) -> TxId {
    let preimage = format!(
        "{}{}{}{}{}{}",
        strip_prefix(blockchain),
        from.as_hex(),
        to.as_hex(),
        payload_hex,
        nonce,
        timestamp
    );
    TxId::hash(preimage.as_bytes())
}

/// An unsigned certificate transaction.
///
/// Immutable once built. Resubmitting means building a new transaction with
/// a fresh nonce and timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    id: TxId,
    from: Address,
    to: Address,
    timestamp: Timestamp,
    payload: String,
    nonce: u64,
    blockchain: String,
    version: String,
}

impl Transaction {
    /// Build a self-addressed transaction notarizing `certificate`.
    pub fn certificate(
        blockchain: &str,
        address: &Address,
        certificate: &Certificate,
        nonce: u64,
        timestamp: Timestamp,
    ) -> Self {
        let payload = certificate_payload(&certificate.serialize());
        let id = compute_transaction_id(blockchain, address, address, &payload, nonce, &timestamp);
        Self {
            id,
            from: address.clone(),
            to: address.clone(),
            timestamp,
            payload,
            nonce,
            blockchain: strip_prefix(blockchain),
            version: certificate.version().to_string(),
        }
    }

    pub fn id(&self) -> &TxId {
        &self.id
    }

    pub fn from(&self) -> &Address {
        &self.from
    }

    pub fn to(&self) -> &Address {
        &self.to
    }

    pub fn timestamp(&self) -> &Timestamp {
        &self.timestamp
    }

    /// Hex-encoded action payload.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Normalized blockchain identifier (no prefix).
    pub fn blockchain(&self) -> &str {
        &self.blockchain
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Sign the ID digest with a secret key.
    pub fn sign(self, key: &SecretKey) -> Result<SignedTransaction, SignerError> {
        let signature = key.sign_prehash(self.id.as_bytes())?;
        Ok(SignedTransaction {
            transaction: self,
            signature,
        })
    }
}

/// A signed transaction ready to be submitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    /// The unsigned transaction.
    pub transaction: Transaction,
    /// Signature over the transaction ID digest.
    pub signature: Signature,
}

impl SignedTransaction {
    pub fn id(&self) -> &TxId {
        self.transaction.id()
    }

    /// Check the signature against `public_key`.
    pub fn verify(&self, public_key: &PublicKey) -> bool {
        public_key.verify(self.transaction.id.as_bytes(), &self.signature)
    }

    /// The `Circular_AddTransaction_` request body.
    pub fn to_request(&self) -> AddTransactionRequest {
        let tx = &self.transaction;
        AddTransactionRequest {
            id: tx.id.to_hex(),
            from: tx.from.as_hex().to_string(),
            to: tx.to.as_hex().to_string(),
            timestamp: tx.timestamp.to_string(),
            payload: tx.payload.clone(),
            nonce: tx.nonce.to_string(),
            signature: self.signature.to_hex(),
            blockchain: tx.blockchain.clone(),
            tx_type: CERTIFICATE_TX_TYPE.to_string(),
            version: tx.version.clone(),
        }
    }
}

/// Wire body of a transaction submission. Every field is a string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddTransactionRequest {
    #[serde(rename = "ID")]
    pub id: String,
    pub from: String,
    pub to: String,
    pub timestamp: String,
    pub payload: String,
    pub nonce: String,
    pub signature: String,
    pub blockchain: String,
    #[serde(rename = "Type")]
    pub tx_type: String,
    pub version: String,
}
