//! secp256k1 key and signature types.
//!
//! Signing is ECDSA over secp256k1 with RFC 6979 deterministic nonces, so
//! the same key and digest always produce the same signature. Signatures
//! travel as hex-encoded DER.

use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature as K256Signature, SigningKey, VerifyingKey};

use crate::encoding::without_prefix;
use crate::error::SignerError;

/// Length of a secret key in bytes.
pub const SECRET_KEY_LENGTH: usize = 32;

/// A secp256k1 private key.
///
/// Parsed from 64 hex characters with an optional `0x` prefix. Keys made of a
/// single repeated hex digit (all `0`, all `f`, all `1`, ...) are rejected up
/// front; this is a sanity check against placeholder keys, not a substitute
/// for the curve-order validation that follows it.
///
/// ```
/// use circular_kit::SecretKey;
///
/// let key: SecretKey = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318"
///     .parse()
///     .unwrap();
/// assert!("f".repeat(64).parse::<SecretKey>().is_err());
/// # let _ = key;
/// ```
#[derive(Clone)]
pub struct SecretKey(SigningKey);

impl SecretKey {
    /// Create a secret key from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignerError> {
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(SignerError::InvalidLength {
                expected: SECRET_KEY_LENGTH,
                actual: bytes.len(),
            });
        }
        SigningKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| SignerError::InvalidKey)
    }

    /// Derive the matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(*self.0.verifying_key())
    }

    /// Sign a 32-byte message digest.
    pub fn sign_prehash(&self, digest: &[u8; 32]) -> Result<Signature, SignerError> {
        let signature: K256Signature = self
            .0
            .sign_prehash(digest)
            .map_err(|e| SignerError::SigningFailed(e.to_string()))?;
        Ok(Signature(signature))
    }
}

fn is_degenerate(hex_body: &str) -> bool {
    let mut chars = hex_body.chars().map(|c| c.to_ascii_lowercase());
    match chars.next() {
        Some(first) => chars.all(|c| c == first),
        None => true,
    }
}

impl FromStr for SecretKey {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = without_prefix(s.trim());
        if body.len() != SECRET_KEY_LENGTH * 2 {
            return Err(SignerError::InvalidLength {
                expected: SECRET_KEY_LENGTH,
                actual: body.len() / 2,
            });
        }
        let bytes =
            hex::decode(body).map_err(|e| SignerError::InvalidKeyFormat(e.to_string()))?;
        if is_degenerate(body) {
            return Err(SignerError::DegenerateKey);
        }
        Self::from_bytes(&bytes)
    }
}

impl Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey([REDACTED])")
    }
}

/// A secp256k1 public key, displayed as compressed SEC1 hex.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Compressed SEC1 encoding (33 bytes).
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_sec1_bytes().into_vec()
    }

    /// Check `signature` over a 32-byte digest.
    pub fn verify(&self, digest: &[u8; 32], signature: &Signature) -> bool {
        self.0.verify_prehash(digest, &signature.0).is_ok()
    }
}

impl FromStr for PublicKey {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(without_prefix(s))
            .map_err(|e| SignerError::InvalidPublicKey(e.to_string()))?;
        VerifyingKey::from_sec1_bytes(&bytes)
            .map(Self)
            .map_err(|e| SignerError::InvalidPublicKey(e.to_string()))
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

impl Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

/// An ECDSA signature, displayed as hex-encoded DER.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(K256Signature);

impl Signature {
    /// DER encoding of the signature.
    pub fn to_der(&self) -> Vec<u8> {
        self.0.to_der().as_bytes().to_vec()
    }

    /// Hex encoding of the DER signature, as sent to the gateway.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_der())
    }
}

impl FromStr for Signature {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(without_prefix(s))
            .map_err(|e| SignerError::InvalidSignature(e.to_string()))?;
        K256Signature::from_der(&bytes)
            .map(Self)
            .map_err(|e| SignerError::InvalidSignature(e.to_string()))
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self)
    }
}
