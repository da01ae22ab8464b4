//! Data certificates.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::encoding::{from_hex, is_hex, to_hex};
use crate::types::network::LIB_VERSION;

/// An application payload to be notarized, plus its chaining references.
///
/// The payload is held hex-encoded. Serialization is canonical: the four
/// fields are always written as `data`, `previousTxID`, `previousBlock`,
/// `version`, and an absent reference is written as an empty string.
///
/// ```
/// use circular_kit::Certificate;
///
/// let mut cert = Certificate::new();
/// cert.set_data("Hello");
/// assert_eq!(cert.data_hex(), "48656c6c6f");
/// assert_eq!(
///     cert.serialize(),
///     r#"{"data":"48656c6c6f","previousTxID":"","previousBlock":"","version":"1.0.13"}"#
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    #[serde(deserialize_with = "deserialize_data")]
    data: String,
    #[serde(rename = "previousTxID", with = "empty_as_none", default)]
    previous_tx_id: Option<String>,
    #[serde(rename = "previousBlock", with = "empty_as_none", default)]
    previous_block: Option<String>,
    version: String,
}

impl Certificate {
    /// An empty certificate stamped with the library version.
    pub fn new() -> Self {
        Self::with_version(LIB_VERSION)
    }

    /// An empty certificate stamped with a specific protocol version.
    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            data: String::new(),
            previous_tx_id: None,
            previous_block: None,
            version: version.into(),
        }
    }

    /// Store `text` as the payload, hex-encoded.
    pub fn set_data(&mut self, text: &str) {
        self.data = to_hex(text);
    }

    /// The payload decoded back to text.
    pub fn data(&self) -> String {
        from_hex(&self.data)
    }

    /// The payload as stored, in lower-case hex.
    pub fn data_hex(&self) -> &str {
        &self.data
    }

    /// Set the chained transaction ID. An empty string clears it.
    pub fn set_previous_tx_id(&mut self, tx_id: Option<String>) {
        self.previous_tx_id = tx_id.filter(|id| !id.is_empty());
    }

    pub fn previous_tx_id(&self) -> Option<&str> {
        self.previous_tx_id.as_deref()
    }

    pub fn set_previous_block(&mut self, block: Option<String>) {
        self.previous_block = block.filter(|block| !block.is_empty());
    }

    pub fn previous_block(&self) -> Option<&str> {
        self.previous_block.as_deref()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Canonical JSON encoding.
    pub fn serialize(&self) -> String {
        // Infallible: every field is a string.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Byte length of [`serialize`](Self::serialize).
    pub fn size_in_bytes(&self) -> usize {
        self.serialize().len()
    }

    /// Parse a certificate previously produced by [`serialize`](Self::serialize).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for Certificate {
    fn default() -> Self {
        Self::new()
    }
}

fn deserialize_data<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let data = String::deserialize(d)?;
    if data.is_empty() {
        return Ok(data);
    }
    if !is_hex(&data) || data.len() % 2 != 0 {
        return Err(serde::de::Error::custom(
            "certificate data must be even-length hex",
        ));
    }
    Ok(data.to_ascii_lowercase())
}

mod empty_as_none {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let value: Option<String> = Option::deserialize(d)?;
        Ok(value.filter(|s| !s.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_certificate_is_empty() {
        let cert = Certificate::new();
        assert_eq!(cert.data_hex(), "");
        assert_eq!(cert.data(), "");
        assert_eq!(cert.previous_tx_id(), None);
        assert_eq!(cert.previous_block(), None);
        assert_eq!(cert.version(), LIB_VERSION);
    }

    #[test]
    fn test_set_and_get_data() {
        let mut cert = Certificate::new();
        cert.set_data("notarize me ✓");
        assert_eq!(cert.data(), "notarize me ✓");
        assert!(cert.data_hex().len() % 2 == 0);
        assert!(is_hex(cert.data_hex()));
    }

    #[test]
    fn test_serialize_field_order() {
        let mut cert = Certificate::with_version("2.0.0");
        cert.set_data("Hi");
        cert.set_previous_tx_id(Some("aa".to_string()));
        cert.set_previous_block(Some("42".to_string()));
        assert_eq!(
            cert.serialize(),
            r#"{"data":"4869","previousTxID":"aa","previousBlock":"42","version":"2.0.0"}"#
        );
    }

    #[test]
    fn test_identical_certificates_serialize_identically() {
        let build = || {
            let mut cert = Certificate::new();
            cert.set_data("same");
            cert.set_previous_tx_id(Some("abc".to_string()));
            cert
        };
        assert_eq!(build().serialize(), build().serialize());
    }

    #[test]
    fn test_size_in_bytes() {
        let mut cert = Certificate::new();
        cert.set_data("Hello");
        let expected =
            r#"{"data":"48656c6c6f","previousTxID":"","previousBlock":"","version":"1.0.13"}"#;
        assert_eq!(cert.size_in_bytes(), expected.len());
    }

    #[test]
    fn test_from_json_inverts_serialize() {
        let mut cert = Certificate::new();
        cert.set_data("payload");
        cert.set_previous_block(Some("7".to_string()));

        let parsed = Certificate::from_json(&cert.serialize()).unwrap();
        assert_eq!(parsed, cert);
        assert_eq!(parsed.previous_tx_id(), None);
        assert_eq!(parsed.previous_block(), Some("7"));
    }

    #[test]
    fn test_empty_references_round_trip() {
        let mut cert = Certificate::new();
        cert.set_data("payload");
        cert.set_previous_tx_id(Some(String::new()));
        cert.set_previous_block(Some(String::new()));

        assert_eq!(cert.previous_tx_id(), None);
        assert_eq!(cert.previous_block(), None);
        assert_eq!(Certificate::from_json(&cert.serialize()).unwrap(), cert);
    }

    #[test]
    fn test_from_json_rejects_bad_data() {
        let odd = r#"{"data":"486","previousTxID":"","previousBlock":"","version":"1.0.13"}"#;
        assert!(Certificate::from_json(odd).is_err());

        let non_hex = r#"{"data":"zz","previousTxID":"","previousBlock":"","version":"1.0.13"}"#;
        assert!(Certificate::from_json(non_hex).is_err());
    }

    #[test]
    fn test_from_json_missing_references() {
        let json = r#"{"data":"4869","version":"1.0.13"}"#;
        let cert = Certificate::from_json(json).unwrap();
        assert_eq!(cert.data(), "Hi");
        assert_eq!(cert.previous_tx_id(), None);
    }
}
