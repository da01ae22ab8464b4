//! Account address type with validation.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::encoding::without_prefix;
use crate::error::ParseAddressError;

/// A Circular account address: a 20-byte value written as 40 hex
/// characters, with an optional `0x` prefix.
///
/// The address is stored normalized (lower-case, no prefix). [`Display`]
/// renders it with a `0x` prefix; [`Address::as_hex`] gives the bare form
/// used on the wire and in transaction IDs.
///
/// # Examples
///
/// ```
/// use circular_kit::Address;
///
/// let address: Address = "0x1234567890ABCDEF1234567890abcdef12345678".parse().unwrap();
/// assert_eq!(address.as_hex(), "1234567890abcdef1234567890abcdef12345678");
/// assert_eq!(address.to_string(), "0x1234567890abcdef1234567890abcdef12345678");
///
/// assert!("0x1234".parse::<Address>().is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Number of hex characters in an address body.
    pub const HEX_LEN: usize = 40;

    /// Parse and validate an address.
    pub fn new(s: impl AsRef<str>) -> Result<Self, ParseAddressError> {
        let s = s.as_ref();
        Self::validate(s)?;
        Ok(Self(without_prefix(s).to_ascii_lowercase()))
    }

    fn validate(s: &str) -> Result<(), ParseAddressError> {
        if s.is_empty() {
            return Err(ParseAddressError::Empty);
        }

        let body = without_prefix(s);
        if let Some(c) = body.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(ParseAddressError::InvalidChar(s.to_string(), c));
        }

        if body.len() != Self::HEX_LEN {
            return Err(ParseAddressError::InvalidLength {
                address: s.to_string(),
                expected: Self::HEX_LEN,
                actual: body.len(),
            });
        }

        Ok(())
    }

    /// The normalized hex body, without `0x`.
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.0)
    }
}

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Address {
    type Error = ParseAddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for Address {
    type Error = ParseAddressError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s: String = serde::Deserialize::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "1234567890abcdef1234567890abcdef12345678";

    #[test]
    fn test_valid_addresses() {
        let with_prefix: Address = format!("0x{BODY}").parse().unwrap();
        let without: Address = BODY.parse().unwrap();
        let upper_prefix: Address = format!("0X{}", BODY.to_uppercase()).parse().unwrap();

        assert_eq!(with_prefix, without);
        assert_eq!(with_prefix, upper_prefix);
        assert_eq!(with_prefix.as_hex(), BODY);
    }

    #[test]
    fn test_odd_length_rejected() {
        let address = format!("0x{}", &BODY[..39]);
        assert_eq!(
            address.parse::<Address>(),
            Err(ParseAddressError::InvalidLength {
                address: address.clone(),
                expected: 40,
                actual: 39,
            })
        );
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(format!("0x{BODY}00").parse::<Address>().is_err());
        assert!("0x".parse::<Address>().is_err());
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!("".parse::<Address>(), Err(ParseAddressError::Empty));
    }

    #[test]
    fn test_invalid_char_rejected() {
        let address = format!("0x{}g", &BODY[..39]);
        assert!(matches!(
            address.parse::<Address>(),
            Err(ParseAddressError::InvalidChar(_, 'g'))
        ));
    }

    #[test]
    fn test_display_has_prefix() {
        let address: Address = BODY.parse().unwrap();
        assert_eq!(address.to_string(), format!("0x{BODY}"));
    }

    #[test]
    fn test_serde_uses_bare_hex() {
        let address: Address = format!("0x{BODY}").parse().unwrap();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{BODY}\""));

        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);

        assert!(serde_json::from_str::<Address>("\"0x12\"").is_err());
    }
}
