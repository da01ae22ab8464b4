//! Canonical hex encoding used to build hashable gateway payloads.
//!
//! Every function here is total: malformed input produces an empty string
//! rather than an error, because the gateway protocol itself uses the empty
//! string to mean "no data".

/// Encode UTF-8 text as lower-case hex.
///
/// ```
/// assert_eq!(circular_kit::encoding::to_hex("Hello"), "48656c6c6f");
/// ```
pub fn to_hex(text: &str) -> String {
    hex::encode(text.as_bytes())
}

/// Decode hex back into text.
///
/// Accepts an optional `0x`/`0X` prefix and either case. Odd-length or
/// non-hex input yields an empty string. Embedded NUL bytes are dropped and
/// invalid UTF-8 sequences are replaced.
pub fn from_hex(hex_str: &str) -> String {
    let body = without_prefix(hex_str);
    match hex::decode(body) {
        Ok(bytes) => {
            let bytes: Vec<u8> = bytes.into_iter().filter(|b| *b != 0).collect();
            String::from_utf8_lossy(&bytes).into_owned()
        }
        Err(_) => String::new(),
    }
}

/// Normalize a hex string: drop a leading `0x`/`0X`, lower-case it, and
/// left-pad with `0` to an even length.
///
/// ```
/// use circular_kit::encoding::strip_prefix;
///
/// assert_eq!(strip_prefix("0XfF"), "ff");
/// assert_eq!(strip_prefix("0xabc"), "0abc");
/// assert_eq!(strip_prefix(""), "");
/// ```
pub fn strip_prefix(hex_str: &str) -> String {
    let body = without_prefix(hex_str).to_ascii_lowercase();
    if body.len() % 2 == 1 {
        format!("0{body}")
    } else {
        body
    }
}

/// Returns true if `s` is non-empty and consists only of hex digits.
pub fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Slice off a `0x`/`0X` prefix without any other normalization.
pub(crate) fn without_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}
